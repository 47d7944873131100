//! Application-level operations over the document registry: open, save, close and quit.
//! 應用層操作：開啟、儲存、關閉與結束。

mod error;
mod prompt;
mod shell;
mod state;

pub use error::ShellError;
pub use prompt::{PromptAnswer, Prompter, SaveChoice};
pub use shell::Shell;
pub use state::{CommandState, StatusMessage, STATUS_TIMEOUT};
