use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;
use std::sync::mpsc::Receiver;
use std::time::Instant;

use tabula_core::{
    read_document, write_document, CloseDecision, Document, DocumentFormat, DocumentId,
    DocumentRegistry, Location, RegistryError, RegistryEvent,
};
use tabula_settings::{
    Confirmations, RecentEvent, RecentLocations, SettingsStore, ViewPreferences,
    CONFIRM_CLOSE_ALL_DOCUMENTS, CONFIRM_CLOSE_OTHER_DOCUMENTS, CONFIRM_QUIT_APPLICATION,
};
use tracing::{debug, info, warn};

use crate::error::ShellError;
use crate::prompt::{Prompter, SaveChoice};
use crate::state::{CommandState, StatusMessage};

/// 應用程式外殼：協調文件、最近清單與設定。 / Application shell tying documents, the recent list and settings together.
///
/// Every operation that can fail also posts its error as a status message.
pub struct Shell<P> {
    prompter: P,
    registry: DocumentRegistry,
    recent: RecentLocations,
    store: SettingsStore,
    preferences: ViewPreferences,
    registry_events: Receiver<RegistryEvent>,
    recent_events: Receiver<RecentEvent>,
    commands: CommandState,
    status: Option<StatusMessage>,
}

impl<P: Prompter> Shell<P> {
    /// 以既有設定建立外殼。 / Builds a shell from a loaded settings store.
    pub fn new(store: SettingsStore, home: Option<PathBuf>, prompter: P) -> Self {
        let mut registry = DocumentRegistry::new(home);
        let mut recent = RecentLocations::load(&store);
        let preferences = ViewPreferences::load(&store);
        let registry_events = registry.subscribe();
        let recent_events = recent.subscribe();

        let mut shell = Self {
            prompter,
            registry,
            recent,
            store,
            preferences,
            registry_events,
            recent_events,
            commands: CommandState::default(),
            status: None,
        };
        shell.commands = shell.compute_commands();
        shell
    }

    pub fn registry(&self) -> &DocumentRegistry {
        &self.registry
    }

    pub fn recent(&self) -> &RecentLocations {
        &self.recent
    }

    pub fn store(&self) -> &SettingsStore {
        &self.store
    }

    pub fn preferences(&self) -> &ViewPreferences {
        &self.preferences
    }

    pub fn prompter(&self) -> &P {
        &self.prompter
    }

    pub fn prompter_mut(&mut self) -> &mut P {
        &mut self.prompter
    }

    pub fn active_id(&self) -> Option<DocumentId> {
        self.registry.active_id()
    }

    /// 目前啟用的指令；每個操作結束時更新。 / Enabled commands, refreshed at the end of every operation.
    pub fn command_state(&self) -> CommandState {
        self.commands
    }

    /// 文件目前的標題。 / Caption of a document under the current path setting.
    pub fn caption(&self, id: DocumentId) -> String {
        self.registry
            .caption_for(id, self.preferences.show_path)
            .unwrap_or_default()
    }

    pub fn new_document(&mut self) -> DocumentId {
        let id = self.registry.new_untitled();
        info!(%id, "new document");
        self.post_status("New document created");
        self.pump_events();
        id
    }

    /// 開啟位置；已開啟時改為啟用。 / Opens a location, or activates it when already open.
    ///
    /// A failed read leaves the registry untouched.
    pub fn open(&mut self, location: Location) -> Result<DocumentId, ShellError> {
        let result = self.open_location(location);
        self.report(result)
    }

    pub fn open_recent(&mut self, index: usize) -> Result<DocumentId, ShellError> {
        let result = match self.recent.get(index).cloned() {
            Some(location) => self.open_location(location),
            None => Err(ShellError::UnknownRecent(index)),
        };
        self.report(result)
    }

    /// 儲存文件；未命名文件會詢問位置。 / Saves a document, asking for a location when it is untitled.
    pub fn save(&mut self, id: DocumentId) -> Result<(), ShellError> {
        let result = self.save_document(id);
        self.report(result)
    }

    pub fn save_as(&mut self, id: DocumentId, location: Location) -> Result<(), ShellError> {
        let result = self.save_document_as(id, location);
        self.report(result)
    }

    /// 另存副本；文件本身的位置與修改狀態不變。 / Writes a copy elsewhere; the document keeps its location and modified flag.
    pub fn save_copy_as(&mut self, id: DocumentId, location: Location) -> Result<(), ShellError> {
        let result = self.write_copy(id, location);
        self.report(result)
    }

    /// 儲存所有已修改的文件，回傳儲存數量。 / Saves every modified document and returns how many were written.
    pub fn save_all(&mut self) -> Result<usize, ShellError> {
        let result = self.save_modified();
        self.report(result)
    }

    /// 在磁碟上重新命名；回傳是否真的改名。 / Renames the file on disk; returns whether anything changed.
    pub fn rename(&mut self, id: DocumentId, new_file_name: &str) -> Result<bool, ShellError> {
        let result = self.rename_document(id, new_file_name);
        self.report(result)
    }

    pub fn close(&mut self, id: DocumentId) -> Result<(), ShellError> {
        let result = self.close_document(id);
        self.report(result)
    }

    pub fn close_others(&mut self) -> Result<usize, ShellError> {
        let result = self.close_other_documents();
        self.report(result)
    }

    pub fn close_all(&mut self) -> Result<usize, ShellError> {
        let result = self.close_all_documents();
        self.report(result)
    }

    /// 結束前關閉所有文件並保存設定；取消時回傳 `false`。 / Closes everything and persists settings; `false` when the user backs out.
    pub fn quit(&mut self) -> bool {
        if !self.registry.is_empty() {
            if !self.confirm(
                "Quit Application",
                "This will close all open documents and quit the application.\n\nAre you sure you want to continue?",
                CONFIRM_QUIT_APPLICATION,
            ) {
                debug!("quit declined");
                return false;
            }
            let result = self.close_batch(None);
            if self.report(result).is_err() {
                return false;
            }
        }

        if let Err(err) = self.persist() {
            warn!(error = %err, "failed to persist settings");
        }
        self.pump_events();
        info!("quitting");
        true
    }

    /// 寫回最近清單、偏好與設定檔。 / Writes the recent list, preferences and settings file.
    pub fn persist(&mut self) -> Result<(), ShellError> {
        self.preferences.save(&mut self.store)?;
        self.recent.save(&mut self.store)?;
        self.store.save()?;
        Ok(())
    }

    /// 詢問確認；已設定「不再詢問」時直接通過。 / Asks for confirmation unless it was suppressed earlier.
    pub fn confirm(&mut self, title: &str, text: &str, key: &str) -> bool {
        if !Confirmations::should_ask(&self.store, key) {
            debug!(key, "confirmation suppressed");
            return true;
        }
        let answer = self.prompter.confirm_continue(title, text);
        if answer.proceed && answer.remember {
            if let Err(err) = Confirmations::suppress(&mut self.store, key) {
                warn!(key, error = %err, "failed to remember confirmation");
            }
        }
        answer.proceed
    }

    pub fn activate(&mut self, id: DocumentId) -> Result<(), ShellError> {
        let result = self.registry.activate(id).map_err(ShellError::from);
        self.report(result)
    }

    pub fn edit(&mut self, id: DocumentId, contents: impl Into<String>) -> Result<(), ShellError> {
        let result = self
            .registry
            .set_contents(id, contents)
            .map_err(ShellError::from);
        self.report(result)
    }

    pub fn set_language(
        &mut self,
        id: DocumentId,
        language: Option<String>,
    ) -> Result<(), ShellError> {
        let result = self
            .registry
            .set_language(id, language)
            .map_err(ShellError::from);
        self.report(result)
    }

    pub fn clear_recent(&mut self) {
        self.recent.clear();
        self.post_status("Recent documents cleared");
        self.pump_events();
    }

    pub fn set_maximum_recent(&mut self, maximum: usize) {
        self.recent.set_maximum(maximum);
        self.pump_events();
    }

    pub fn path_visible(&self) -> bool {
        self.preferences.show_path
    }

    pub fn set_path_visible(&mut self, visible: bool) {
        self.preferences.show_path = visible;
    }

    /// 處理待處理事件並更新指令狀態。 / Drains pending events and recomputes the command state.
    ///
    /// Every shell operation ends with a pump, so the queues stay empty between calls.
    /// Returns how many events were drained.
    pub fn pump_events(&mut self) -> usize {
        let mut drained = 0;
        for event in self.registry_events.try_iter() {
            debug!(?event, "registry event");
            drained += 1;
        }
        for event in self.recent_events.try_iter() {
            debug!(?event, "recent list event");
            drained += 1;
        }
        self.commands = self.compute_commands();
        drained
    }

    /// 視窗標題：作用中文件的標題，已修改時加上 `*`。 / Window title: the active caption, suffixed with `*` when modified.
    pub fn window_title(&self) -> String {
        let Some(document) = self.registry.active() else {
            return String::new();
        };
        let caption = document.caption(self.preferences.show_path, self.registry.home());
        if document.is_modified() {
            format!("{caption}*")
        } else {
            caption
        }
    }

    /// 尚未過期的狀態訊息。 / The status message, unless it has expired by `now`.
    pub fn status(&self, now: Instant) -> Option<&str> {
        self.status
            .as_ref()
            .filter(|message| !message.is_expired(now))
            .map(StatusMessage::text)
    }

    fn post_status(&mut self, text: impl Into<String>) {
        self.status = Some(StatusMessage::new(text, Instant::now()));
    }

    fn report<T>(&mut self, result: Result<T, ShellError>) -> Result<T, ShellError> {
        self.pump_events();
        if let Err(err) = &result {
            if err.is_cancelled() {
                debug!("operation cancelled");
            } else {
                warn!(error = %err, "operation failed");
            }
            self.post_status(err.to_string());
        }
        result
    }

    fn compute_commands(&self) -> CommandState {
        let active = self.registry.active();
        let count = self.registry.len();
        CommandState {
            has_document: active.is_some(),
            has_location: active.is_some_and(|doc| doc.location().is_some()),
            has_file_name: active.is_some_and(|doc| !doc.file_name().is_empty()),
            save_all: self.registry.iter().any(Document::is_modified),
            close_others: count >= 2,
            close_all: count >= 1,
            tab_bar_shown: self.preferences.tab_bar_shown(count),
            recent_available: !self.recent.is_empty(),
        }
    }

    fn open_location(&mut self, location: Location) -> Result<DocumentId, ShellError> {
        if let Some(id) = self.registry.find(&location).map(Document::id) {
            self.registry.activate(id)?;
            self.recent.add_location(location);
            self.post_status("Document already open");
            return Ok(id);
        }

        let loaded = read_document(location.as_path())?;
        let opened = self.registry.open(location.clone());
        self.registry.load_contents(opened.id, loaded)?;
        info!(id = %opened.id, %location, "document opened");
        self.recent.add_location(location);
        self.post_status("Document loaded");
        Ok(opened.id)
    }

    fn save_document(&mut self, id: DocumentId) -> Result<(), ShellError> {
        let document = self
            .registry
            .get(id)
            .ok_or(RegistryError::UnknownDocument(id))?;
        let Some(location) = document.location().cloned() else {
            let caption = self.caption(id);
            let location = self
                .prompter
                .ask_save_location(&caption)
                .ok_or(ShellError::Cancelled)?;
            return self.save_document_as(id, location);
        };

        write_document(
            location.as_path(),
            document.contents(),
            document.language(),
            document.format(),
        )?;
        self.registry.mark_saved(id)?;
        info!(%id, %location, "document saved");
        self.recent.add_location(location);
        self.post_status("Document saved");
        Ok(())
    }

    fn save_document_as(&mut self, id: DocumentId, location: Location) -> Result<(), ShellError> {
        let document = self
            .registry
            .get(id)
            .ok_or(RegistryError::UnknownDocument(id))?;
        if let Some(holder) = self.registry.find(&location) {
            if holder.id() != id {
                return Err(RegistryError::LocationInUse(location).into());
            }
        }

        let format = DocumentFormat::for_path(location.as_path());
        write_document(
            location.as_path(),
            document.contents(),
            document.language(),
            format,
        )?;
        self.registry.set_location(id, location.clone())?;
        self.registry.mark_saved(id)?;
        info!(%id, %location, format = format.name(), "document saved under new location");
        self.recent.add_location(location);
        self.post_status("Document saved");
        Ok(())
    }

    fn write_copy(&mut self, id: DocumentId, location: Location) -> Result<(), ShellError> {
        let document = self
            .registry
            .get(id)
            .ok_or(RegistryError::UnknownDocument(id))?;
        write_document(
            location.as_path(),
            document.contents(),
            document.language(),
            DocumentFormat::for_path(location.as_path()),
        )?;
        info!(%id, %location, "copy saved");
        self.post_status("Copy saved");
        Ok(())
    }

    fn save_modified(&mut self) -> Result<usize, ShellError> {
        let pending: Vec<DocumentId> = self
            .registry
            .iter()
            .filter(|doc| doc.is_modified())
            .map(Document::id)
            .collect();
        for id in &pending {
            self.save_document(*id)?;
        }
        self.post_status(format!("{} document(s) saved", pending.len()));
        Ok(pending.len())
    }

    fn rename_document(&mut self, id: DocumentId, new_file_name: &str) -> Result<bool, ShellError> {
        let location = self
            .registry
            .get(id)
            .ok_or(RegistryError::UnknownDocument(id))?
            .location()
            .cloned()
            .ok_or(ShellError::NoLocation(id))?;
        let new_file_name = new_file_name.trim();
        if new_file_name.is_empty() || new_file_name == location.file_name() {
            return Ok(false);
        }

        let target_path = location.as_path().with_file_name(new_file_name);
        if target_path.exists() {
            return Err(ShellError::AlreadyExists(target_path));
        }
        let target = Location::new(target_path.clone()).ok_or(ShellError::NoLocation(id))?;
        if self.registry.find(&target).is_some() {
            return Err(RegistryError::LocationInUse(target).into());
        }

        fs::rename(location.as_path(), &target_path).map_err(|source| ShellError::Rename {
            from: location.as_path().to_path_buf(),
            to: target_path.clone(),
            source,
        })?;
        self.registry.set_location(id, target.clone())?;
        info!(%id, from = %location, to = %target, "document renamed");
        self.recent.add_location(target);
        self.post_status("Document renamed");
        Ok(true)
    }

    fn close_document(&mut self, id: DocumentId) -> Result<(), ShellError> {
        let modified = self
            .registry
            .get(id)
            .ok_or(RegistryError::UnknownDocument(id))?
            .is_modified();
        if modified {
            let caption = self.caption(id);
            match self.prompter.resolve_unsaved(&caption) {
                SaveChoice::Save => self.save_document(id)?,
                SaveChoice::Discard => debug!(%id, "discarding unsaved changes"),
                SaveChoice::Cancel => return Err(ShellError::Cancelled),
            }
        }

        self.registry.close(id);
        info!(%id, "document closed");
        self.post_status("Document closed");
        Ok(())
    }

    fn close_other_documents(&mut self) -> Result<usize, ShellError> {
        if self.registry.len() < 2 {
            return Ok(0);
        }
        let keep = self
            .registry
            .active_id()
            .ok_or(ShellError::NoActiveDocument)?;
        if !self.confirm(
            "Close Other Documents",
            "This will close all other open documents.\n\nAre you sure you want to continue?",
            CONFIRM_CLOSE_OTHER_DOCUMENTS,
        ) {
            return Err(ShellError::Cancelled);
        }
        let closed = self.close_batch(Some(keep))?;
        self.post_status(format!("{closed} document(s) closed"));
        Ok(closed)
    }

    fn close_all_documents(&mut self) -> Result<usize, ShellError> {
        if self.registry.is_empty() {
            return Ok(0);
        }
        if !self.confirm(
            "Close All Documents",
            "This will close all open documents.\n\nAre you sure you want to continue?",
            CONFIRM_CLOSE_ALL_DOCUMENTS,
        ) {
            return Err(ShellError::Cancelled);
        }
        let closed = self.close_batch(None)?;
        self.post_status(format!("{closed} document(s) closed"));
        Ok(closed)
    }

    // Every unsaved document is resolved before any is closed; a cancel closes nothing.
    fn close_batch(&mut self, keep: Option<DocumentId>) -> Result<usize, ShellError> {
        let unsaved: Vec<DocumentId> = self
            .registry
            .iter()
            .filter(|doc| Some(doc.id()) != keep && doc.is_modified())
            .map(Document::id)
            .collect();

        let mut choices = Vec::with_capacity(unsaved.len());
        for id in unsaved {
            let caption = self.caption(id);
            match self.prompter.resolve_unsaved(&caption) {
                SaveChoice::Cancel => return Err(ShellError::Cancelled),
                choice => choices.push((id, choice)),
            }
        }

        let mut discarded = HashSet::new();
        for (id, choice) in choices {
            if choice == SaveChoice::Save {
                self.save_document(id)?;
            } else {
                discarded.insert(id);
            }
        }

        let decide = |doc: &Document| {
            if doc.is_modified() && !discarded.contains(&doc.id()) {
                CloseDecision::Abort
            } else {
                CloseDecision::Close
            }
        };
        let report = match keep {
            Some(keep) => self.registry.close_others(keep, decide),
            None => self.registry.close_all(decide),
        };
        if report.aborted {
            return Err(ShellError::Cancelled);
        }
        info!(closed = report.closed.len(), "documents closed");
        Ok(report.closed.len())
    }
}
