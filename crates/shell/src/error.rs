use std::io;
use std::path::PathBuf;

use tabula_core::{CodecError, DocumentId, RegistryError};
use tabula_settings::SettingsError;
use thiserror::Error;

/// 應用層操作錯誤。 / Errors surfaced by shell operations.
#[derive(Debug, Error)]
pub enum ShellError {
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error("operation cancelled")]
    Cancelled,
    #[error("no document is active")]
    NoActiveDocument,
    #[error("document {0} has no location")]
    NoLocation(DocumentId),
    #[error("{} already exists", .0.display())]
    AlreadyExists(PathBuf),
    #[error("failed to rename {} to {}: {source}", from.display(), to.display())]
    Rename {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("no recent document at position {0}")]
    UnknownRecent(usize),
}

impl ShellError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ShellError::Cancelled)
    }
}
