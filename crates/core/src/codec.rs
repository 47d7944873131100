use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::location::Location;
use crate::util::write_atomic;

/// 文件在磁碟上的儲存格式。 / On-disk format of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DocumentFormat {
    /// 整份 UTF-8 文字。 / Whole-file UTF-8 text.
    #[default]
    PlainText,
    /// `{ "language": .., "text": .. }` 物件。 / A `{ "language": .., "text": .. }` object.
    Json,
}

impl DocumentFormat {
    /// 依副檔名判定格式；`.json`（不分大小寫）為 JSON。 / Picks the format from the extension; `.json` (any case) is JSON.
    pub fn for_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => DocumentFormat::Json,
            _ => DocumentFormat::PlainText,
        }
    }

    pub fn for_location(location: Option<&Location>) -> Self {
        location
            .map(|location| Self::for_path(location.as_path()))
            .unwrap_or_default()
    }

    pub fn name(self) -> &'static str {
        match self {
            DocumentFormat::PlainText => "text",
            DocumentFormat::Json => "json",
        }
    }
}

/// 讀寫文件內容時的錯誤。 / Errors raised while reading or writing document content.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("malformed document {}: {reason}", path.display())]
    Malformed { path: PathBuf, reason: String },
}

/// 從磁碟讀回的內容。 / Content read back from disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedContent {
    pub contents: String,
    pub language: Option<String>,
    pub format: DocumentFormat,
}

#[derive(Serialize)]
struct HighlightedSource<'a> {
    language: &'a str,
    text: &'a str,
}

/// 依副檔名讀取整份文件。 / Reads a whole document, decoding it according to its extension.
pub fn read_document(path: &Path) -> Result<LoadedContent, CodecError> {
    let format = DocumentFormat::for_path(path);
    let bytes = fs::read(path).map_err(|source| CodecError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let text = String::from_utf8(bytes).map_err(|_| CodecError::Malformed {
        path: path.to_path_buf(),
        reason: "content is not valid UTF-8".to_string(),
    })?;

    match format {
        DocumentFormat::PlainText => Ok(LoadedContent {
            contents: text,
            language: None,
            format,
        }),
        DocumentFormat::Json => decode_json(path, &text),
    }
}

/// 以指定格式原子寫入文件。 / Writes a document atomically in the given format.
pub fn write_document(
    path: &Path,
    contents: &str,
    language: Option<&str>,
    format: DocumentFormat,
) -> Result<(), CodecError> {
    let payload = encode(contents, language, format).map_err(|err| CodecError::Malformed {
        path: path.to_path_buf(),
        reason: err.to_string(),
    })?;
    write_atomic(path, &payload).map_err(|source| CodecError::Write {
        path: path.to_path_buf(),
        source,
    })
}

fn encode(
    contents: &str,
    language: Option<&str>,
    format: DocumentFormat,
) -> Result<Vec<u8>, serde_json::Error> {
    match format {
        DocumentFormat::PlainText => Ok(contents.as_bytes().to_vec()),
        DocumentFormat::Json => serde_json::to_vec_pretty(&HighlightedSource {
            language: language.unwrap_or_default(),
            text: contents,
        }),
    }
}

fn decode_json(path: &Path, text: &str) -> Result<LoadedContent, CodecError> {
    let malformed = |reason: String| CodecError::Malformed {
        path: path.to_path_buf(),
        reason,
    };
    let value: Value = serde_json::from_str(text).map_err(|err| malformed(err.to_string()))?;
    let Value::Object(root) = value else {
        return Err(malformed("expected a JSON object".to_string()));
    };

    // Non-string fields are ignored rather than rejected.
    let language = root
        .get("language")
        .and_then(Value::as_str)
        .map(str::to_owned);
    let contents = root
        .get("text")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_owned();

    Ok(LoadedContent {
        contents,
        language,
        format: DocumentFormat::Json,
    })
}
