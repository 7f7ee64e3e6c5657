//! Per-request orchestration: gate → validate → classify → evaluate → store.

use calcwizard_common::arith::{self, Evaluation};
use calcwizard_common::message::normalize_timestamp;
use calcwizard_common::{classify, Message, Timestamp};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::auth::{AccessGate, Operation};
use crate::config::{ChannelConfig, SYSTEM_SENDER};
use crate::error::ChannelError;
use crate::store::MessageStore;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthResponse {
    pub name: String,
}

/// A validated `POST /` body, before classification.
#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    pub content: String,
    pub sender: String,
    pub timestamp: Value,
    pub extra: Option<Value>,
}

impl Submission {
    /// Validate a raw request body. Fields are checked in a fixed order so the
    /// error names the first one that is missing.
    pub fn parse(body: &[u8]) -> Result<Self, ChannelError> {
        let mut fields = match serde_json::from_slice::<Value>(body) {
            Ok(Value::Object(fields)) if !fields.is_empty() => fields,
            _ => return Err(ChannelError::Validation("No message")),
        };

        let content = take_string(&mut fields, "content")
            .filter(|c| !c.is_empty())
            .ok_or(ChannelError::Validation("No content"))?;
        let sender = take_string(&mut fields, "sender")
            .ok_or(ChannelError::Validation("No sender"))?;
        let timestamp = fields
            .remove("timestamp")
            .filter(|t| t.is_string() || t.is_number())
            .ok_or(ChannelError::Validation("No timestamp"))?;
        let extra = fields.remove("extra").filter(|e| !e.is_null());

        Ok(Self {
            content,
            sender,
            timestamp,
            extra,
        })
    }
}

fn take_string(fields: &mut Map<String, Value>, key: &str) -> Option<String> {
    match fields.remove(key) {
        Some(Value::String(s)) => Some(s),
        _ => None,
    }
}

/// Wall-clock time as epoch seconds.
pub fn now_secs() -> Timestamp {
    chrono::Utc::now().timestamp_micros() as f64 / 1_000_000.0
}

pub struct ChannelService {
    config: ChannelConfig,
    gate: AccessGate,
    store: MessageStore,
}

impl ChannelService {
    pub fn new(config: ChannelConfig, store: MessageStore) -> Self {
        let gate = AccessGate::new(&config.shared_secret, config.auth_scope);
        Self {
            config,
            gate,
            store,
        }
    }

    /// Open the configured storage document and build the service around it.
    pub fn open(config: ChannelConfig) -> Self {
        let welcome = Message::new(config.welcome_text(), SYSTEM_SENDER, now_secs());
        let store = MessageStore::open(&config.storage_path, config.retention(), welcome);
        Self::new(config, store)
    }

    pub fn health(&self, credential: Option<&str>) -> Result<HealthResponse, ChannelError> {
        self.gate.check(Operation::Health, credential)?;
        Ok(HealthResponse {
            name: self.config.channel_name.clone(),
        })
    }

    pub async fn history(
        &self,
        credential: Option<&str>,
        now: Timestamp,
    ) -> Result<Vec<Message>, ChannelError> {
        self.gate.check(Operation::Read, credential)?;
        Ok(self.store.read(now).await)
    }

    /// Handle a `POST /` body: store the (possibly filtered) user message and,
    /// when it contains arithmetic, the automated reply right after it.
    pub async fn submit(
        &self,
        credential: Option<&str>,
        body: &[u8],
        now: Timestamp,
    ) -> Result<(), ChannelError> {
        self.gate.check(Operation::Write, credential)?;
        let submission = Submission::parse(body)?;

        let timestamp = normalize_timestamp(&submission.timestamp).unwrap_or_else(|| {
            warn!(raw = %submission.timestamp, "unparseable timestamp, using epoch");
            0.0
        });

        let content = if classify::is_on_topic(&submission.content) {
            submission.content.clone()
        } else {
            debug!(sender = %submission.sender, "filtered off-topic message");
            classify::filtered_placeholder(&self.config.channel_name)
        };

        let mut batch = vec![Message::new(content, submission.sender.as_str(), timestamp)
            .with_extra(submission.extra)];
        if let Some(reply) = self.reply_to(&submission.content, now) {
            batch.push(reply);
        }

        let stored = self.store.append_and_trim(batch, now).await;
        info!(sender = %submission.sender, stored, "message accepted");
        Ok(())
    }

    fn reply_to(&self, text: &str, now: Timestamp) -> Option<Message> {
        let evaluation = arith::try_evaluate(text)?;
        if let Evaluation::Failed { expression, error } = &evaluation {
            debug!(%expression, %error, "expression could not be evaluated");
        }
        Some(Message::new(
            evaluation.reply_text(),
            self.config.channel_name.as_str(),
            now,
        ))
    }
}
