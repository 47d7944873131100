use std::fmt;
use std::path::{Component, Path, PathBuf, MAIN_SEPARATOR};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::de::{Error as DeError, Unexpected, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

const B64_PREFIX: &str = "b64:";
const FILE_SCHEME: &str = "file://";

/// 文件的儲存位置，保證不為空。 / Identifies a document's backing store; never empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Location(PathBuf);

impl Location {
    /// 以路徑建立位置；空路徑回傳 `None`。 / Wraps a path, returning `None` for an empty one.
    pub fn new(path: impl Into<PathBuf>) -> Option<Self> {
        let path = path.into();
        if path.as_os_str().is_empty() {
            None
        } else {
            Some(Self(path))
        }
    }

    /// 解析使用者輸入（路徑或 `file://` 網址），相對路徑以 `cwd` 為基準。
    /// Resolves user input (a plain path or a `file://` URL); relative input is joined onto `cwd`
    /// and `.`/`..` components are folded so every spelling of a file yields one location.
    pub fn from_user_input(input: &str, cwd: &Path) -> Option<Self> {
        let trimmed = input.trim();
        let raw = trimmed.strip_prefix(FILE_SCHEME).unwrap_or(trimmed);
        if raw.is_empty() {
            return None;
        }
        let path = Path::new(raw);
        if path.is_absolute() {
            Self::new(normalize(path))
        } else {
            Self::new(normalize(&cwd.join(path)))
        }
    }

    pub fn as_path(&self) -> &Path {
        &self.0
    }

    /// 路徑最後一段的檔名；沒有檔名時回傳空字串。 / Final path component, or an empty string when there is none.
    pub fn file_name(&self) -> String {
        self.0
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// 將家目錄前綴縮寫為 `~`。 / Renders the path with the home directory collapsed to `~`.
    ///
    /// Only whole components match, so `/home/al` does not abbreviate `/home/alice`.
    pub fn abbreviated(&self, home: Option<&Path>) -> String {
        if let Some(home) = home.filter(|home| !home.as_os_str().is_empty()) {
            if let Ok(rest) = self.0.strip_prefix(home) {
                if rest.as_os_str().is_empty() {
                    return "~".to_string();
                }
                return format!("~{MAIN_SEPARATOR}{}", rest.display());
            }
        }
        self.0.display().to_string()
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

impl AsRef<Path> for Location {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl Serialize for Location {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self.0.to_str() {
            Some(text) => serializer.serialize_str(text),
            None => {
                let payload = BASE64.encode(raw::to_bytes(self.0.as_os_str()));
                serializer.serialize_str(&format!("{B64_PREFIX}{payload}"))
            }
        }
    }
}

impl<'de> Deserialize<'de> for Location {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct LocationVisitor;

        impl<'de> Visitor<'de> for LocationVisitor {
            type Value = Location;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a non-empty UTF-8 or base64 encoded path string")
            }

            fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
            where
                E: DeError,
            {
                Location::from_wire(v).ok_or_else(|| E::invalid_value(Unexpected::Str(v), &self))
            }
        }

        deserializer.deserialize_str(LocationVisitor)
    }
}

impl Location {
    // Inverse of `Serialize`; `None` for an empty path or an undecodable payload.
    fn from_wire(text: &str) -> Option<Self> {
        let path = match text.strip_prefix(B64_PREFIX) {
            Some(payload) => raw::from_bytes(BASE64.decode(payload).ok()?)?,
            None => PathBuf::from(text),
        };
        Self::new(path)
    }
}

// Removes `.` and resolves `..` against preceding components without touching the disk.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => out.push(Component::ParentDir),
            },
            other => out.push(other),
        }
    }
    out
}

/// 路徑的平台位元組表示。 / Platform byte form of a path, used for the `b64:` payload.
mod raw {
    use std::ffi::{OsStr, OsString};
    use std::path::PathBuf;

    #[cfg(unix)]
    pub(super) fn to_bytes(os: &OsStr) -> Vec<u8> {
        use std::os::unix::ffi::OsStrExt;
        os.as_bytes().to_vec()
    }

    #[cfg(unix)]
    pub(super) fn from_bytes(bytes: Vec<u8>) -> Option<PathBuf> {
        use std::os::unix::ffi::OsStringExt;
        Some(OsString::from_vec(bytes).into())
    }

    // Little-endian UTF-16 code units.
    #[cfg(windows)]
    pub(super) fn to_bytes(os: &OsStr) -> Vec<u8> {
        use std::os::windows::ffi::OsStrExt;
        os.encode_wide().flat_map(u16::to_le_bytes).collect()
    }

    #[cfg(windows)]
    pub(super) fn from_bytes(bytes: Vec<u8>) -> Option<PathBuf> {
        use std::os::windows::ffi::OsStringExt;
        if bytes.len() % 2 != 0 {
            return None;
        }
        let wide: Vec<u16> = bytes
            .chunks_exact(2)
            .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
            .collect();
        Some(OsString::from_wide(&wide).into())
    }
}
