use tabula_core::Location;

/// 確認對話框的回答。 / Answer to a continue/cancel confirmation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PromptAnswer {
    pub proceed: bool,
    /// "Don't ask again" was ticked.
    pub remember: bool,
}

impl PromptAnswer {
    pub fn proceed() -> Self {
        Self {
            proceed: true,
            remember: false,
        }
    }

    pub fn cancel() -> Self {
        Self::default()
    }
}

/// 關閉未儲存文件時的選擇。 / What to do with unsaved changes on close.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveChoice {
    Save,
    Discard,
    Cancel,
}

/// 使用者互動介面。 / The user-facing side of the shell.
///
/// Implemented by the front end; every shell decision that needs a human goes through here.
pub trait Prompter {
    fn confirm_continue(&mut self, title: &str, text: &str) -> PromptAnswer;

    fn resolve_unsaved(&mut self, caption: &str) -> SaveChoice;

    /// `None` when the user declines to pick a location.
    fn ask_save_location(&mut self, caption: &str) -> Option<Location>;
}
