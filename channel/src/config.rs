use std::path::PathBuf;

use calcwizard_common::retention::{RetentionPolicy, MAX_AGE_SECONDS, MAX_MESSAGES};

use crate::auth::AuthScope;

pub const DEFAULT_CHANNEL_NAME: &str = "CalcWizard";
pub const DEFAULT_STORAGE_PATH: &str = "messages.json";
pub const DEFAULT_TYPE_OF_SERVICE: &str = "aiweb24:chat";

/// Sender of the welcome message seeded into an empty history.
pub const SYSTEM_SENDER: &str = "System";

/// Everything the channel service needs, resolved once at startup.
#[derive(Debug, Clone)]
pub struct ChannelConfig {
    /// Shown by `/health` and used as the sender of automated replies.
    pub channel_name: String,
    pub shared_secret: String,
    pub auth_scope: AuthScope,
    pub max_messages: usize,
    pub max_age_seconds: f64,
    pub storage_path: PathBuf,
}

impl ChannelConfig {
    pub fn new(channel_name: impl Into<String>, shared_secret: impl Into<String>) -> Self {
        Self {
            channel_name: channel_name.into(),
            shared_secret: shared_secret.into(),
            auth_scope: AuthScope::default(),
            max_messages: MAX_MESSAGES,
            max_age_seconds: MAX_AGE_SECONDS,
            storage_path: PathBuf::from(DEFAULT_STORAGE_PATH),
        }
    }

    pub fn retention(&self) -> RetentionPolicy {
        RetentionPolicy::new(self.max_messages, self.max_age_seconds)
    }

    pub fn welcome_text(&self) -> String {
        format!(
            "Welcome to {}! Send me a math expression...",
            self.channel_name
        )
    }
}
