//! Document model, content codec and session registry for Tabula.
//! Tabula 的文件模型、內容編解碼與工作階段登錄表。

mod util;

pub mod codec;
pub mod document;
pub mod events;
pub mod location;
pub mod registry;

pub use codec::{read_document, write_document, CodecError, DocumentFormat, LoadedContent};
pub use document::{Document, DocumentId, UNTITLED};
pub use events::EventHub;
pub use location::Location;
pub use registry::{
    CloseDecision, CloseReport, DocumentRegistry, Opened, RegistryError, RegistryEvent,
};
pub use util::write_atomic;
