use serde::{Deserialize, Serialize};

use crate::store::{SettingsError, SettingsStore};

const KEY_SHOW_PATH: &str = "Application/ShowPath";
const KEY_TAB_VISIBLE: &str = "DocumentManager/DocumentTabVisible";
const KEY_TAB_POSITION: &str = "DocumentManager/DocumentTabPosition";
const KEY_TAB_AUTO_HIDE: &str = "DocumentManager/DocumentTabAutoHide";

/// 文件分頁列位置。 / Where the document tab bar sits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TabPosition {
    #[default]
    North,
    South,
}

/// 與文件顯示相關的偏好。 / Preferences that shape how documents are presented.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewPreferences {
    pub show_path: bool,
    pub tab_visible: bool,
    pub tab_position: TabPosition,
    pub tab_auto_hide: bool,
}

impl Default for ViewPreferences {
    fn default() -> Self {
        Self {
            show_path: false,
            tab_visible: true,
            tab_position: TabPosition::North,
            tab_auto_hide: false,
        }
    }
}

impl ViewPreferences {
    /// 從設定載入；無法辨識的值改用預設。 / Loads from the store; unrecognised values fall back to defaults.
    pub fn load(store: &SettingsStore) -> Self {
        let defaults = Self::default();
        Self {
            show_path: store.read_bool(KEY_SHOW_PATH, defaults.show_path),
            tab_visible: store.read_bool(KEY_TAB_VISIBLE, defaults.tab_visible),
            tab_position: store.read(KEY_TAB_POSITION, defaults.tab_position),
            tab_auto_hide: store.read_bool(KEY_TAB_AUTO_HIDE, defaults.tab_auto_hide),
        }
    }

    pub fn save(&self, store: &mut SettingsStore) -> Result<(), SettingsError> {
        store.write(KEY_SHOW_PATH, self.show_path)?;
        store.write(KEY_TAB_VISIBLE, self.tab_visible)?;
        store.write(KEY_TAB_POSITION, self.tab_position)?;
        store.write(KEY_TAB_AUTO_HIDE, self.tab_auto_hide)
    }

    /// 分頁列是否顯示：單一文件且自動隱藏時不顯示。 / Tab bar visibility; hidden for a lone document when auto-hide is on.
    pub fn tab_bar_shown(&self, document_count: usize) -> bool {
        self.tab_visible && !(document_count <= 1 && self.tab_auto_hide)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_keys_use_defaults() {
        let store = SettingsStore::in_memory();
        assert_eq!(ViewPreferences::load(&store), ViewPreferences::default());
    }

    #[test]
    fn unknown_tab_position_becomes_north() {
        let mut store = SettingsStore::in_memory();
        store.write(KEY_TAB_POSITION, "west").unwrap();
        assert_eq!(
            ViewPreferences::load(&store).tab_position,
            TabPosition::North
        );

        store.write(KEY_TAB_POSITION, "south").unwrap();
        assert_eq!(
            ViewPreferences::load(&store).tab_position,
            TabPosition::South
        );
    }

    #[test]
    fn save_then_load() {
        let mut store = SettingsStore::in_memory();
        let prefs = ViewPreferences {
            show_path: true,
            tab_visible: false,
            tab_position: TabPosition::South,
            tab_auto_hide: true,
        };
        prefs.save(&mut store).unwrap();
        assert_eq!(ViewPreferences::load(&store), prefs);
        assert_eq!(store.read_string(KEY_TAB_POSITION, ""), "south");
    }

    #[test]
    fn tab_bar_auto_hides_for_single_document() {
        let mut prefs = ViewPreferences::default();
        assert!(prefs.tab_bar_shown(1));

        prefs.tab_auto_hide = true;
        assert!(!prefs.tab_bar_shown(0));
        assert!(!prefs.tab_bar_shown(1));
        assert!(prefs.tab_bar_shown(2));

        prefs.tab_visible = false;
        assert!(!prefs.tab_bar_shown(3));
    }
}
