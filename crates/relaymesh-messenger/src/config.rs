//! Messenger configuration

use std::time::Duration;

/// Default message payload cap in bytes
pub const DEFAULT_MAX_MESSAGE_LEN: usize = 1000;

/// Default envelope retention period
pub const DEFAULT_RETENTION: Duration = Duration::from_secs(30 * 24 * 3600);

/// Tunable limits for the messenger
#[derive(Debug, Clone)]
pub struct MessengerConfig {
    /// Largest accepted plaintext, in bytes
    pub max_message_len: usize,
    /// Envelopes older than this are removed by `purge_expired`
    pub retention: Duration,
}

impl Default for MessengerConfig {
    fn default() -> Self {
        MessengerConfig {
            max_message_len: DEFAULT_MAX_MESSAGE_LEN,
            retention: DEFAULT_RETENTION,
        }
    }
}
