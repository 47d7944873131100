use std::time::{Duration, Instant};

/// 狀態列訊息顯示時間。 / How long a status message stays visible.
pub const STATUS_TIMEOUT: Duration = Duration::from_secs(3);

/// 依目前狀態啟用的指令。 / Which commands are currently available.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommandState {
    pub has_document: bool,
    pub has_location: bool,
    pub has_file_name: bool,
    pub save_all: bool,
    pub close_others: bool,
    pub close_all: bool,
    pub tab_bar_shown: bool,
    pub recent_available: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    text: String,
    posted: Instant,
}

impl StatusMessage {
    pub fn new(text: impl Into<String>, posted: Instant) -> Self {
        Self {
            text: text.into(),
            posted,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.posted) >= STATUS_TIMEOUT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_expires_after_timeout() {
        let posted = Instant::now();
        let message = StatusMessage::new("Saved", posted);
        assert!(!message.is_expired(posted));
        assert!(!message.is_expired(posted + Duration::from_millis(2999)));
        assert!(message.is_expired(posted + STATUS_TIMEOUT));
    }
}
