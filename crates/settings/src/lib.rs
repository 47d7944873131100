pub mod confirmations;
pub mod preferences;
pub mod recent;
pub mod store;

pub use confirmations::{
    Confirmations, CONFIRM_CLOSE_ALL_DOCUMENTS, CONFIRM_CLOSE_OTHER_DOCUMENTS,
    CONFIRM_QUIT_APPLICATION,
};
pub use preferences::{TabPosition, ViewPreferences};
pub use recent::{RecentEvent, RecentLocations, DEFAULT_MAXIMUM, MAXIMUM_LIMIT};
pub use store::{SettingsError, SettingsStore};
