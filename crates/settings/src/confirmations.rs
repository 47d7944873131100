use tracing::debug;

use crate::store::{SettingsError, SettingsStore};

const PREFIX: &str = "Confirmations/";

/// 結束程式前的確認。 / Asked before quitting with documents open.
pub const CONFIRM_QUIT_APPLICATION: &str = "ConfirmQuitApplication";
/// 關閉其他文件前的確認。 / Asked before closing all but the active document.
pub const CONFIRM_CLOSE_OTHER_DOCUMENTS: &str = "ConfirmCloseOtherDocuments";
/// 關閉所有文件前的確認。 / Asked before closing every document.
pub const CONFIRM_CLOSE_ALL_DOCUMENTS: &str = "ConfirmCloseAllDocuments";

/// 「不再詢問」旗標，保存在 `Confirmations/<key>`。 / "Don't ask again" flags kept under `Confirmations/<key>`.
pub struct Confirmations;

impl Confirmations {
    /// An empty key is never suppressible.
    pub fn should_ask(store: &SettingsStore, key: &str) -> bool {
        key.is_empty() || store.read_bool(&settings_key(key), true)
    }

    pub fn suppress(store: &mut SettingsStore, key: &str) -> Result<(), SettingsError> {
        if key.is_empty() {
            return Ok(());
        }
        debug!(key, "confirmation suppressed");
        store.write(&settings_key(key), false)
    }

    /// 恢復詢問；回傳原本是否有紀錄。 / Asks again from now on; returns whether a flag was stored.
    pub fn reset(store: &mut SettingsStore, key: &str) -> bool {
        store.remove(&settings_key(key))
    }
}

fn settings_key(key: &str) -> String {
    format!("{PREFIX}{key}")
}
