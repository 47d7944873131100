use std::path::{Path, PathBuf};
use std::sync::mpsc::Receiver;

use thiserror::Error;
use tracing::debug;

use crate::codec::LoadedContent;
use crate::document::{Document, DocumentId};
use crate::events::EventHub;
use crate::location::Location;

/// 登錄表狀態改變時發出的事件。 / Events emitted whenever the registry changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryEvent {
    Opened(DocumentId),
    Closed(DocumentId),
    Activated(Option<DocumentId>),
    ModifiedChanged { id: DocumentId, modified: bool },
    LocationChanged(DocumentId),
    CountChanged(usize),
}

/// 登錄表操作錯誤。 / Errors returned by registry operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("document {0} is not open")]
    UnknownDocument(DocumentId),
    #[error("{0} is already open in another document")]
    LocationInUse(Location),
}

/// `open` 的結果。 / Outcome of [`DocumentRegistry::open`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Opened {
    pub id: DocumentId,
    /// `false` when an already-open document was activated instead.
    pub created: bool,
}

/// 批次關閉時對單一文件的決定。 / Per-document verdict during a batch close.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseDecision {
    Close,
    Abort,
}

/// 批次關閉的結果。 / Result of a batch close.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CloseReport {
    pub closed: Vec<DocumentId>,
    pub aborted: bool,
}

/// 追蹤目前開啟的所有文件。 / Tracks every document open in one application instance.
///
/// No two documents share a location; any number of untitled documents may coexist.
#[derive(Debug)]
pub struct DocumentRegistry {
    documents: Vec<Document>,
    active: Option<DocumentId>,
    next_id: u64,
    home: Option<PathBuf>,
    events: EventHub<RegistryEvent>,
}

impl DocumentRegistry {
    /// 建立空的登錄表；`home` 用於標題中的 `~` 縮寫。 / Creates an empty registry; `home` drives `~` abbreviation in captions.
    pub fn new(home: Option<PathBuf>) -> Self {
        Self {
            documents: Vec::new(),
            active: None,
            next_id: 1,
            home,
            events: EventHub::new(),
        }
    }

    pub fn home(&self) -> Option<&Path> {
        self.home.as_deref()
    }

    /// 訂閱登錄表事件。 / Subscribes to registry events.
    pub fn subscribe(&mut self) -> Receiver<RegistryEvent> {
        self.events.subscribe()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// 依開啟順序列舉文件。 / Iterates documents in the order they were opened.
    pub fn iter(&self) -> impl Iterator<Item = &Document> {
        self.documents.iter()
    }

    pub fn ids(&self) -> Vec<DocumentId> {
        self.documents.iter().map(Document::id).collect()
    }

    pub fn get(&self, id: DocumentId) -> Option<&Document> {
        self.documents.iter().find(|doc| doc.id() == id)
    }

    pub fn contains(&self, id: DocumentId) -> bool {
        self.get(id).is_some()
    }

    /// 依位置尋找已開啟的文件。 / Looks up the open document holding `location`.
    pub fn find(&self, location: &Location) -> Option<&Document> {
        self.documents
            .iter()
            .find(|doc| doc.location() == Some(location))
    }

    pub fn active_id(&self) -> Option<DocumentId> {
        self.active
    }

    pub fn active(&self) -> Option<&Document> {
        self.active.and_then(|id| self.get(id))
    }

    pub fn activate(&mut self, id: DocumentId) -> Result<(), RegistryError> {
        if !self.contains(id) {
            return Err(RegistryError::UnknownDocument(id));
        }
        self.set_active(Some(id));
        Ok(())
    }

    /// 建立新的未命名文件並設為作用中。 / Registers a blank untitled document and activates it.
    pub fn new_untitled(&mut self) -> DocumentId {
        self.insert(None)
    }

    /// 開啟位置；若已開啟則改為啟用既有文件。 / Opens `location`, or activates the document that already holds it.
    pub fn open(&mut self, location: Location) -> Opened {
        if let Some(id) = self.find(&location).map(Document::id) {
            debug!(%id, %location, "location already open; activating");
            self.set_active(Some(id));
            return Opened { id, created: false };
        }
        let id = self.insert(Some(location));
        Opened { id, created: true }
    }

    /// 以讀取的內容取代文件內容，並視為未修改。 / Replaces content with freshly read data and treats it as unmodified.
    pub fn load_contents(
        &mut self,
        id: DocumentId,
        loaded: LoadedContent,
    ) -> Result<(), RegistryError> {
        self.document_mut(id)?.load(loaded);
        self.set_modified(id, false)
    }

    /// 更新內容並標記為已修改。 / Replaces the content and marks the document modified.
    pub fn set_contents(
        &mut self,
        id: DocumentId,
        contents: impl Into<String>,
    ) -> Result<(), RegistryError> {
        self.document_mut(id)?.set_contents(contents.into());
        self.set_modified(id, true)
    }

    pub fn set_language(
        &mut self,
        id: DocumentId,
        language: Option<String>,
    ) -> Result<(), RegistryError> {
        let document = self.document_mut(id)?;
        if document.language() == language.as_deref() {
            return Ok(());
        }
        document.set_language(language);
        self.set_modified(id, true)
    }

    pub fn set_modified(&mut self, id: DocumentId, modified: bool) -> Result<(), RegistryError> {
        if self.document_mut(id)?.set_modified(modified) {
            self.events
                .emit(RegistryEvent::ModifiedChanged { id, modified });
        }
        Ok(())
    }

    pub fn mark_saved(&mut self, id: DocumentId) -> Result<(), RegistryError> {
        self.set_modified(id, false)
    }

    /// 變更文件位置（另存新檔或重新命名），並重新計算序號。 / Moves a document to a new location and recomputes its sequence number.
    pub fn set_location(&mut self, id: DocumentId, location: Location) -> Result<(), RegistryError> {
        if !self.contains(id) {
            return Err(RegistryError::UnknownDocument(id));
        }
        match self.find(&location).map(Document::id) {
            Some(holder) if holder == id => return Ok(()),
            Some(_) => return Err(RegistryError::LocationInUse(location)),
            None => {}
        }

        let sequence = self.next_sequence_number(&location.file_name(), Some(id));
        let document = self.document_mut(id)?;
        document.set_location(location);
        document.set_sequence_number(sequence);
        debug!(%id, sequence, "document location changed");
        self.events.emit(RegistryEvent::LocationChanged(id));
        Ok(())
    }

    /// 關閉文件；不存在時不做任何事。 / Removes a document; unknown ids are a no-op.
    ///
    /// Unsaved changes are the caller's concern; the registry never prompts.
    pub fn close(&mut self, id: DocumentId) -> Option<Document> {
        let index = self.documents.iter().position(|doc| doc.id() == id)?;
        let document = self.documents.remove(index);
        debug!(%id, remaining = self.documents.len(), "document closed");

        self.events.emit(RegistryEvent::Closed(id));
        self.events
            .emit(RegistryEvent::CountChanged(self.documents.len()));
        if self.active == Some(id) {
            let next = self.documents.last().map(Document::id);
            self.set_active(next);
        }
        Some(document)
    }

    /// 關閉除 `keep` 以外的所有文件。 / Closes every document except `keep`.
    pub fn close_others<F>(&mut self, keep: DocumentId, decide: F) -> CloseReport
    where
        F: FnMut(&Document) -> CloseDecision,
    {
        if !self.contains(keep) {
            return CloseReport::default();
        }
        let snapshot: Vec<DocumentId> = self
            .ids()
            .into_iter()
            .filter(|id| *id != keep)
            .collect();
        let report = self.close_snapshot(snapshot, decide);
        if !report.aborted {
            self.set_active(Some(keep));
        }
        report
    }

    /// 關閉所有文件。 / Closes every open document.
    pub fn close_all<F>(&mut self, decide: F) -> CloseReport
    where
        F: FnMut(&Document) -> CloseDecision,
    {
        let snapshot = self.ids();
        self.close_snapshot(snapshot, decide)
    }

    /// 取得文件標題。 / Caption of the given document.
    pub fn caption_for(&self, id: DocumentId, path_visible: bool) -> Option<String> {
        self.get(id)
            .map(|doc| doc.caption(path_visible, self.home.as_deref()))
    }

    // Every verdict is collected before anything is removed, so an abort leaves the set untouched.
    fn close_snapshot<F>(&mut self, snapshot: Vec<DocumentId>, mut decide: F) -> CloseReport
    where
        F: FnMut(&Document) -> CloseDecision,
    {
        for id in &snapshot {
            if let Some(document) = self.get(*id) {
                if decide(document) == CloseDecision::Abort {
                    debug!(%id, "batch close aborted");
                    return CloseReport {
                        closed: Vec::new(),
                        aborted: true,
                    };
                }
            }
        }

        let closed = snapshot
            .into_iter()
            .filter_map(|id| self.close(id).map(|doc| doc.id()))
            .collect();
        CloseReport {
            closed,
            aborted: false,
        }
    }

    fn insert(&mut self, location: Option<Location>) -> DocumentId {
        let id = DocumentId(self.next_id);
        self.next_id += 1;

        let mut document = Document::new(id, location);
        let sequence = self.next_sequence_number(&document.file_name(), None);
        document.set_sequence_number(sequence);
        debug!(%id, sequence, "document registered");

        self.documents.push(document);
        self.events.emit(RegistryEvent::Opened(id));
        self.events
            .emit(RegistryEvent::CountChanged(self.documents.len()));
        self.set_active(Some(id));
        id
    }

    // One past the highest number already used by a document with the same file name.
    fn next_sequence_number(&self, file_name: &str, exclude: Option<DocumentId>) -> u32 {
        self.documents
            .iter()
            .filter(|doc| Some(doc.id()) != exclude && doc.file_name() == file_name)
            .map(Document::sequence_number)
            .max()
            .unwrap_or(0)
            + 1
    }

    fn set_active(&mut self, id: Option<DocumentId>) {
        if self.active != id {
            self.active = id;
            self.events.emit(RegistryEvent::Activated(id));
        }
    }

    fn document_mut(&mut self, id: DocumentId) -> Result<&mut Document, RegistryError> {
        self.documents
            .iter_mut()
            .find(|doc| doc.id() == id)
            .ok_or(RegistryError::UnknownDocument(id))
    }
}

impl Default for DocumentRegistry {
    fn default() -> Self {
        Self::new(None)
    }
}
