//! Line commands accepted on standard input.
//! 標準輸入可接受的指令。

use thiserror::Error;

/// One parsed input line.
/// 解析後的單行指令。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    New,
    Open(String),
    Edit(String),
    Language(Option<String>),
    Save,
    SaveAs(String),
    SaveCopy(String),
    SaveAll,
    Rename(String),
    /// 1-based position in `list` output.
    Activate(usize),
    Close,
    CloseOthers,
    CloseAll,
    List,
    Recent,
    /// 1-based position in `recent` output.
    OpenRecent(usize),
    ClearRecent,
    MaxRecent(usize),
    ShowPath(bool),
    Title,
    /// 列出目前可用的指令。 / Prints which gated commands are available.
    State,
    Quit,
}

impl Command {
    /// 輸入時使用的指令名稱。 / The word that starts this command on an input line.
    pub fn name(&self) -> &'static str {
        match self {
            Command::New => "new",
            Command::Open(_) => "open",
            Command::Edit(_) => "edit",
            Command::Language(_) => "language",
            Command::Save => "save",
            Command::SaveAs(_) => "save-as",
            Command::SaveCopy(_) => "save-copy",
            Command::SaveAll => "save-all",
            Command::Rename(_) => "rename",
            Command::Activate(_) => "activate",
            Command::Close => "close",
            Command::CloseOthers => "close-others",
            Command::CloseAll => "close-all",
            Command::List => "list",
            Command::Recent => "recent",
            Command::OpenRecent(_) => "open-recent",
            Command::ClearRecent => "clear-recent",
            Command::MaxRecent(_) => "max-recent",
            Command::ShowPath(_) => "show-path",
            Command::Title => "title",
            Command::State => "state",
            Command::Quit => "quit",
        }
    }
}

/// Errors emitted while parsing an input line.
/// 解析輸入行時可能回傳的錯誤。
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("unknown command '{0}'")]
    UnknownCommand(String),
    #[error("'{command}' requires {expected}")]
    MissingArgument {
        command: &'static str,
        expected: &'static str,
    },
    #[error("invalid value '{value}' for '{command}'")]
    InvalidValue { command: &'static str, value: String },
}

/// Parses a line; blank lines and `#` comments yield `None`.
/// 解析一行輸入；空行與 `#` 註解回傳 `None`。
pub fn parse_line(line: &str) -> Result<Option<Command>, ParseError> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    let command = match word {
        "new" => Command::New,
        "open" => Command::Open(required("open", "a path", rest)?),
        "edit" => Command::Edit(unescape(rest)),
        "language" => Command::Language((!rest.is_empty()).then(|| rest.to_string())),
        "save" => Command::Save,
        "save-as" => Command::SaveAs(required("save-as", "a path", rest)?),
        "save-copy" => Command::SaveCopy(required("save-copy", "a path", rest)?),
        "save-all" => Command::SaveAll,
        "rename" => Command::Rename(required("rename", "a file name", rest)?),
        "activate" => Command::Activate(position("activate", rest)?),
        "close" => Command::Close,
        "close-others" => Command::CloseOthers,
        "close-all" => Command::CloseAll,
        "list" => Command::List,
        "recent" => Command::Recent,
        "open-recent" => Command::OpenRecent(position("open-recent", rest)?),
        "clear-recent" => Command::ClearRecent,
        "max-recent" => Command::MaxRecent(number("max-recent", rest)?),
        "show-path" => Command::ShowPath(switch("show-path", rest)?),
        "title" => Command::Title,
        "state" => Command::State,
        "quit" | "exit" => Command::Quit,
        other => return Err(ParseError::UnknownCommand(other.to_string())),
    };
    Ok(Some(command))
}

fn required(
    command: &'static str,
    expected: &'static str,
    rest: &str,
) -> Result<String, ParseError> {
    if rest.is_empty() {
        Err(ParseError::MissingArgument { command, expected })
    } else {
        Ok(rest.to_string())
    }
}

fn number(command: &'static str, rest: &str) -> Result<usize, ParseError> {
    let raw = required(command, "a number", rest)?;
    raw.parse()
        .map_err(|_| ParseError::InvalidValue { command, value: raw })
}

fn position(command: &'static str, rest: &str) -> Result<usize, ParseError> {
    match number(command, rest)? {
        0 => Err(ParseError::InvalidValue {
            command,
            value: "0".to_string(),
        }),
        value => Ok(value),
    }
}

fn switch(command: &'static str, rest: &str) -> Result<bool, ParseError> {
    match required(command, "on or off", rest)?.as_str() {
        "on" | "true" | "yes" => Ok(true),
        "off" | "false" | "no" => Ok(false),
        other => Err(ParseError::InvalidValue {
            command,
            value: other.to_string(),
        }),
    }
}

// `\n` and `\t` let a single line carry multi-line text.
fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}
