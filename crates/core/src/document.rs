use std::fmt;
use std::path::Path;

use crate::codec::{DocumentFormat, LoadedContent};
use crate::location::Location;

/// 未命名文件的顯示名稱。 / Display name used for documents without a location.
pub const UNTITLED: &str = "Untitled";

/// 登錄表內唯一的文件識別碼。 / Registry-unique document identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentId(pub(crate) u64);

impl DocumentId {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// 一份開啟中的文件：位置、修改狀態與內容。 / One open document: its location, modified state and content.
///
/// Mutation goes through [`crate::DocumentRegistry`] so that change events stay in step.
#[derive(Debug, Clone)]
pub struct Document {
    id: DocumentId,
    location: Option<Location>,
    modified: bool,
    sequence_number: u32,
    contents: String,
    language: Option<String>,
    format: DocumentFormat,
}

impl Document {
    pub(crate) fn new(id: DocumentId, location: Option<Location>) -> Self {
        let format = DocumentFormat::for_location(location.as_ref());
        Self {
            id,
            location,
            modified: false,
            sequence_number: 0,
            contents: String::new(),
            language: None,
            format,
        }
    }

    pub fn id(&self) -> DocumentId {
        self.id
    }

    /// 文件所屬位置；未命名文件為 `None`。 / The backing location, `None` while untitled.
    pub fn location(&self) -> Option<&Location> {
        self.location.as_ref()
    }

    pub fn is_untitled(&self) -> bool {
        self.location.is_none()
    }

    /// 判斷是否有未儲存變更。 / Whether the content differs from the last saved state.
    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// 同名文件間的區分序號（從 1 起算）。 / Disambiguator among documents sharing a file name, starting at 1.
    pub fn sequence_number(&self) -> u32 {
        self.sequence_number
    }

    pub fn contents(&self) -> &str {
        &self.contents
    }

    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }

    pub fn format(&self) -> DocumentFormat {
        self.format
    }

    /// 位置的檔名部分；未命名時為空字串。 / File-name part of the location; empty while untitled.
    pub fn file_name(&self) -> String {
        self.location
            .as_ref()
            .map(Location::file_name)
            .unwrap_or_default()
    }

    /// 產生視窗/分頁標題。 / Derives the window or tab caption.
    ///
    /// With `path_visible` the (home-abbreviated) path is shown, otherwise only the
    /// file name. The sequence number is appended when it exceeds 1 and the path
    /// does not already tell documents apart.
    pub fn caption(&self, path_visible: bool, home: Option<&Path>) -> String {
        let mut caption = UNTITLED.to_string();

        if let Some(location) = &self.location {
            if path_visible {
                caption = location.abbreviated(home);
            } else {
                let name = location.file_name();
                if !name.is_empty() {
                    caption = name;
                }
            }
        }

        if (!path_visible || self.location.is_none()) && self.sequence_number > 1 {
            caption = format!("{caption} ({})", self.sequence_number);
        }

        caption
    }

    pub(crate) fn set_location(&mut self, location: Location) {
        self.format = DocumentFormat::for_path(location.as_path());
        self.location = Some(location);
    }

    pub(crate) fn set_sequence_number(&mut self, number: u32) {
        self.sequence_number = number;
    }

    /// 回傳狀態是否改變。 / Returns whether the flag actually changed.
    pub(crate) fn set_modified(&mut self, modified: bool) -> bool {
        let changed = self.modified != modified;
        self.modified = modified;
        changed
    }

    pub(crate) fn set_contents(&mut self, contents: String) {
        self.contents = contents;
    }

    pub(crate) fn set_language(&mut self, language: Option<String>) {
        self.language = language;
    }

    pub(crate) fn load(&mut self, loaded: LoadedContent) {
        self.contents = loaded.contents;
        self.language = loaded.language;
        self.format = loaded.format;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document(path: Option<&str>, sequence: u32) -> Document {
        let mut doc = Document::new(DocumentId(1), path.and_then(Location::new));
        doc.set_sequence_number(sequence);
        doc
    }

    #[test]
    fn untitled_caption_and_numbering() {
        assert_eq!(document(None, 1).caption(false, None), "Untitled");
        assert_eq!(document(None, 2).caption(false, None), "Untitled (2)");
        // The path toggle cannot help an untitled document.
        assert_eq!(document(None, 3).caption(true, None), "Untitled (3)");
    }

    #[cfg(unix)]
    #[test]
    fn located_caption_prefers_path_when_visible() {
        let home = Path::new("/home/user");
        let doc = document(Some("/home/user/reports/report.txt"), 2);

        assert_eq!(doc.caption(false, Some(home)), "report.txt (2)");
        assert_eq!(doc.caption(true, Some(home)), "~/reports/report.txt");
        assert_eq!(doc.caption(true, None), "/home/user/reports/report.txt");
    }

    #[cfg(unix)]
    #[test]
    fn location_without_file_name_falls_back_to_untitled() {
        let doc = document(Some("/"), 1);
        assert_eq!(doc.caption(false, None), "Untitled");
        assert_eq!(doc.caption(true, None), "/");
    }

    #[test]
    fn location_change_rederives_format() {
        let mut doc = document(Some("notes.txt"), 1);
        assert_eq!(doc.format(), DocumentFormat::PlainText);
        doc.set_location(Location::new("notes.json").unwrap());
        assert_eq!(doc.format(), DocumentFormat::Json);
    }
}
