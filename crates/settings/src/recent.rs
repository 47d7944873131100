use std::collections::VecDeque;
use std::path::Path;
use std::sync::mpsc::Receiver;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tabula_core::{EventHub, Location};
use tracing::{debug, warn};

use crate::store::{SettingsError, SettingsStore};

/// 預設保留的最近文件數。 / Default number of remembered locations.
pub const DEFAULT_MAXIMUM: usize = 20;
/// 可設定的上限。 / Upper bound accepted for the maximum.
pub const MAXIMUM_LIMIT: usize = 50;

const KEY_MAXIMUM: &str = "Application/MaximumRecentDocuments";
const KEY_RESTORE: &str = "Application/RestoreRecentDocuments";
const KEY_ENTRIES: &str = "RecentDocuments";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecentEvent {
    ListChanged,
}

#[derive(Serialize)]
struct RecentRecord<'a> {
    document: &'a Location,
}

/// 管理最近開啟文件的清單，最新者在前。 / Bounded list of recently used locations, most recent first.
#[derive(Debug)]
pub struct RecentLocations {
    maximum: usize,
    restore: bool,
    entries: VecDeque<Location>,
    events: EventHub<RecentEvent>,
}

impl RecentLocations {
    pub fn new() -> Self {
        Self::with_maximum(DEFAULT_MAXIMUM)
    }

    /// 建立指定上限的清單（限制於 0..=50）。 / Creates a list whose maximum is clamped to `0..=50`.
    pub fn with_maximum(maximum: usize) -> Self {
        let maximum = maximum.min(MAXIMUM_LIMIT);
        Self {
            maximum,
            restore: true,
            entries: VecDeque::with_capacity(maximum),
            events: EventHub::new(),
        }
    }

    pub fn subscribe(&mut self) -> Receiver<RecentEvent> {
        self.events.subscribe()
    }

    pub fn maximum(&self) -> usize {
        self.maximum
    }

    /// 調整上限並修剪超出的紀錄。 / Adjusts the maximum and trims excess entries.
    pub fn set_maximum(&mut self, maximum: usize) {
        let maximum = maximum.min(MAXIMUM_LIMIT);
        if maximum == self.maximum {
            return;
        }
        self.maximum = maximum;
        if self.shrink(maximum) {
            self.events.emit(RecentEvent::ListChanged);
        }
    }

    pub fn restore(&self) -> bool {
        self.restore
    }

    pub fn set_restore(&mut self, restore: bool) {
        self.restore = restore;
    }

    /// 加入或提升位置至清單頂端。 / Inserts or promotes a location to the front.
    ///
    /// Always emits exactly one [`RecentEvent::ListChanged`].
    pub fn add_location(&mut self, location: Location) {
        if let Some(index) = self.entries.iter().position(|entry| entry == &location) {
            if index > 0 {
                if let Some(entry) = self.entries.remove(index) {
                    self.entries.push_front(entry);
                }
            }
        } else {
            debug!(%location, "recent list: add");
            self.entries.push_front(location);
        }
        self.shrink(self.maximum);
        self.events.emit(RecentEvent::ListChanged);
    }

    /// 移除指定位置；若存在則回傳 `true`。 / Removes a location and returns `true` if it was listed.
    pub fn remove(&mut self, location: &Location) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry != location);
        let removed = before != self.entries.len();
        if removed {
            self.events.emit(RecentEvent::ListChanged);
        }
        removed
    }

    /// 清空清單；原本為空時不發出通知。 / Empties the list, staying silent when it already was.
    pub fn clear(&mut self) {
        if self.shrink(0) {
            self.events.emit(RecentEvent::ListChanged);
        }
    }

    pub fn get(&self, index: usize) -> Option<&Location> {
        self.entries.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Location> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 選單項目文字，例如 `report.txt [~/docs/report.txt]`。 / Menu text such as `report.txt [~/docs/report.txt]`.
    pub fn entry_text(&self, index: usize, home: Option<&Path>) -> Option<String> {
        self.get(index).map(|location| {
            let name = location.file_name();
            let path = location.abbreviated(home);
            if name.is_empty() {
                format!("[{path}]")
            } else {
                format!("{name} [{path}]")
            }
        })
    }

    /// 從設定還原清單。 / Restores the list from the settings store.
    ///
    /// Entries are stored most recent first, so they are re-added from the back.
    /// Records without a usable `document` field are skipped.
    pub fn load(store: &SettingsStore) -> Self {
        let raw = store.read_int(KEY_MAXIMUM, DEFAULT_MAXIMUM as i64);
        let maximum = usize::try_from(raw)
            .ok()
            .filter(|value| *value <= MAXIMUM_LIMIT)
            .unwrap_or_else(|| {
                warn!(value = raw, "recent list: invalid maximum, using default");
                DEFAULT_MAXIMUM
            });

        let mut recent = Self::with_maximum(maximum);
        recent.restore = store.read_bool(KEY_RESTORE, true);

        let records: Vec<Value> = store.read(KEY_ENTRIES, Vec::new());
        for record in records.iter().rev() {
            match record
                .get("document")
                .and_then(|value| Location::deserialize(value).ok())
            {
                Some(location) => recent.add_location(location),
                None => debug!(?record, "recent list: skipping unusable record"),
            }
        }
        recent
    }

    /// 寫入設定；`restore` 關閉時先清空清單。 / Writes the list, clearing it first when restoring is off.
    pub fn save(&mut self, store: &mut SettingsStore) -> Result<(), SettingsError> {
        store.write(KEY_MAXIMUM, self.maximum)?;
        store.write(KEY_RESTORE, self.restore)?;
        if !self.restore {
            self.clear();
        }
        let records: Vec<RecentRecord<'_>> = self
            .entries
            .iter()
            .map(|document| RecentRecord { document })
            .collect();
        store.write(KEY_ENTRIES, records)
    }

    fn shrink(&mut self, size: usize) -> bool {
        if self.entries.len() <= size {
            return false;
        }
        self.entries.truncate(size);
        debug!(size, "recent list: trimmed");
        true
    }
}

impl Default for RecentLocations {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loc(path: &str) -> Location {
        Location::new(path).unwrap()
    }

    fn names(recent: &RecentLocations) -> Vec<String> {
        recent.iter().map(Location::file_name).collect()
    }

    #[test]
    fn add_promotes_and_limits_maximum() {
        let mut recent = RecentLocations::with_maximum(3);
        recent.add_location(loc("/tmp/a.txt"));
        recent.add_location(loc("/tmp/b.txt"));
        recent.add_location(loc("/tmp/c.txt"));
        // Re-adding an existing location promotes it to the front.
        // 重新加入既有位置時，應提升至清單前端。
        recent.add_location(loc("/tmp/b.txt"));
        assert_eq!(names(&recent), vec!["b.txt", "c.txt", "a.txt"]);

        recent.add_location(loc("/tmp/d.txt"));
        assert_eq!(names(&recent), vec!["d.txt", "b.txt", "c.txt"]);
    }

    #[test]
    fn every_add_notifies_once() {
        let mut recent = RecentLocations::with_maximum(2);
        let events = recent.subscribe();

        recent.add_location(loc("/tmp/a.txt"));
        recent.add_location(loc("/tmp/a.txt"));
        recent.add_location(loc("/tmp/b.txt"));
        recent.add_location(loc("/tmp/c.txt"));

        assert_eq!(events.try_iter().count(), 4);
    }

    #[test]
    fn maximum_is_clamped_and_trims() {
        let mut recent = RecentLocations::with_maximum(99);
        assert_eq!(recent.maximum(), MAXIMUM_LIMIT);

        for name in ["a", "b", "c", "d"] {
            recent.add_location(loc(&format!("/tmp/{name}")));
        }
        let events = recent.subscribe();
        recent.set_maximum(2);
        assert_eq!(names(&recent), vec!["d", "c"]);
        assert_eq!(events.try_iter().count(), 1);

        recent.set_maximum(10);
        assert_eq!(events.try_iter().count(), 0);
    }

    #[test]
    fn lowered_maximum_bounds_later_adds() {
        let mut recent = RecentLocations::with_maximum(5);
        for name in ["a", "b", "c"] {
            recent.add_location(loc(&format!("/tmp/{name}")));
        }
        recent.set_maximum(2);

        for name in ["d", "e", "a", "f", "d"] {
            recent.add_location(loc(&format!("/tmp/{name}")));
            assert!(recent.len() <= 2, "{} entries after adding {name}", recent.len());
        }
        assert_eq!(names(&recent), vec!["d", "f"]);
    }

    #[test]
    fn zero_maximum_keeps_nothing() {
        let mut recent = RecentLocations::with_maximum(0);
        recent.add_location(loc("/tmp/a"));
        assert!(recent.is_empty());
    }

    #[test]
    fn clear_is_silent_on_empty_list() {
        let mut recent = RecentLocations::new();
        let events = recent.subscribe();
        recent.clear();
        assert_eq!(events.try_iter().count(), 0);

        recent.add_location(loc("/tmp/a"));
        recent.clear();
        assert!(recent.is_empty());
        assert_eq!(events.try_iter().count(), 2);
    }

    #[test]
    fn remove_reports_presence() {
        let mut recent = RecentLocations::new();
        recent.add_location(loc("/tmp/x"));
        assert!(recent.remove(&loc("/tmp/x")));
        assert!(!recent.remove(&loc("/tmp/x")));
    }

    #[cfg(unix)]
    #[test]
    fn entry_text_shows_name_and_abbreviated_path() {
        let mut recent = RecentLocations::new();
        recent.add_location(loc("/home/user/docs/report.txt"));
        recent.add_location(loc("/"));

        let home = Path::new("/home/user");
        assert_eq!(recent.entry_text(0, Some(home)).as_deref(), Some("[/]"));
        assert_eq!(
            recent.entry_text(1, Some(home)).as_deref(),
            Some("report.txt [~/docs/report.txt]")
        );
        assert_eq!(recent.entry_text(2, Some(home)), None);
    }

    #[test]
    fn load_replaces_out_of_range_maximum() {
        let mut store = SettingsStore::in_memory();
        store.write(KEY_MAXIMUM, 75).unwrap();
        assert_eq!(RecentLocations::load(&store).maximum(), DEFAULT_MAXIMUM);

        store.write(KEY_MAXIMUM, -1).unwrap();
        assert_eq!(RecentLocations::load(&store).maximum(), DEFAULT_MAXIMUM);

        store.write(KEY_MAXIMUM, 5).unwrap();
        assert_eq!(RecentLocations::load(&store).maximum(), 5);
    }

    #[test]
    fn load_skips_unusable_records() {
        let mut store = SettingsStore::in_memory();
        store
            .write(
                KEY_ENTRIES,
                serde_json::json!([
                    { "document": "/tmp/new" },
                    { "document": "" },
                    { "other": 1 },
                    { "document": "/tmp/old" }
                ]),
            )
            .unwrap();

        let recent = RecentLocations::load(&store);
        assert_eq!(names(&recent), vec!["new", "old"]);
    }

    #[test]
    fn save_without_restore_persists_empty_list() {
        let mut store = SettingsStore::in_memory();
        let mut recent = RecentLocations::new();
        recent.add_location(loc("/tmp/a"));
        recent.set_restore(false);
        recent.save(&mut store).unwrap();

        assert!(recent.is_empty());
        let records: Vec<Value> = store.read(KEY_ENTRIES, vec![Value::Null]);
        assert!(records.is_empty());
        assert!(!store.read_bool(KEY_RESTORE, true));
    }
}
