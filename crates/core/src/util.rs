use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// 先寫入同目錄的暫存檔再改名，達成原子寫入；必要時建立上層目錄。
/// Writes `data` to a hidden sibling and renames it over `path`, creating parent directories as needed.
pub fn write_atomic(path: &Path, data: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let staging = staging_path(path);
    if let Err(err) = fs::write(&staging, data).and_then(|()| fs::rename(&staging, path)) {
        let _ = fs::remove_file(&staging);
        return Err(err);
    }
    Ok(())
}

// `notes.txt` stages as `.notes.txt.tabula-tmp`, so siblings differing only by extension never collide.
fn staging_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(".");
    name.push(path.file_name().unwrap_or_default());
    name.push(".tabula-tmp");
    path.with_file_name(name)
}
