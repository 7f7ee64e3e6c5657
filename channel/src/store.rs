//! In-memory message history with best-effort JSON persistence.
//!
//! The mutex, not the file, is the concurrency primitive: every read and every
//! read-modify-write cycle runs under it, and the document on disk is rewritten
//! wholesale after each mutation.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use anyhow::Context;
use calcwizard_common::{Message, RetentionPolicy, Timestamp};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

pub struct MessageStore {
    messages: Mutex<Vec<Message>>,
    policy: RetentionPolicy,
    persistence_path: Option<PathBuf>,
}

impl MessageStore {
    /// Load history from `path`. A missing, malformed or empty document is
    /// replaced by a history holding only `welcome`.
    pub fn open(path: impl Into<PathBuf>, policy: RetentionPolicy, welcome: Message) -> Self {
        let path = path.into();
        let mut messages = load_messages(&path);

        if messages.is_empty() {
            info!("Seeding empty history at {}", path.display());
            messages.push(welcome);
            if let Err(e) = save_messages(&path, &messages) {
                error!("Failed to persist seeded history: {:#}", e);
            }
        } else {
            info!("Loaded {} messages from {}", messages.len(), path.display());
        }

        Self {
            messages: Mutex::new(messages),
            policy,
            persistence_path: Some(path),
        }
    }

    /// A store that never touches the filesystem.
    pub fn in_memory(policy: RetentionPolicy) -> Self {
        Self {
            messages: Mutex::new(Vec::new()),
            policy,
            persistence_path: None,
        }
    }

    /// Retention-enforced snapshot of the history.
    ///
    /// Trimming here only updates memory; the next write persists it.
    pub async fn read(&self, now: Timestamp) -> Vec<Message> {
        let mut messages = self.messages.lock().await;
        let evicted = self.policy.enforce_in_place(&mut messages, now);
        if evicted > 0 {
            debug!(evicted, "retention trimmed history on read");
        }
        messages.clone()
    }

    /// Append `new_messages` in order, enforce retention and persist, all under
    /// one lock acquisition. Returns the resulting history length.
    pub async fn append_and_trim(&self, new_messages: Vec<Message>, now: Timestamp) -> usize {
        let mut messages = self.messages.lock().await;
        messages.extend(new_messages);
        let evicted = self.policy.enforce_in_place(&mut messages, now);
        if evicted > 0 {
            debug!(evicted, "retention trimmed history on write");
        }

        if let Some(path) = &self.persistence_path {
            if let Err(e) = save_messages(path, &messages) {
                error!("Failed to persist history to {}: {:#}", path.display(), e);
            }
        }

        messages.len()
    }
}

// ─── Persistence ─────────────────────────────────────────────────────────────

fn load_messages(path: &Path) -> Vec<Message> {
    let data = match std::fs::read_to_string(path) {
        Ok(data) => data,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Vec::new(),
        Err(e) => {
            warn!("Could not read {}: {}; starting empty", path.display(), e);
            return Vec::new();
        }
    };

    let entries: Vec<serde_json::Value> = match serde_json::from_str(&data) {
        Ok(entries) => entries,
        Err(e) => {
            warn!("Malformed history in {}: {}; starting empty", path.display(), e);
            return Vec::new();
        }
    };

    entries
        .into_iter()
        .enumerate()
        .filter_map(|(idx, entry)| match serde_json::from_value::<Message>(entry) {
            Ok(message) => Some(message),
            Err(e) => {
                warn!("Skipping malformed history entry {}: {}", idx, e);
                None
            }
        })
        .collect()
}

fn save_messages(path: &Path, messages: &[Message]) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("mkdir {}", parent.display()))?;
    }
    let data = serde_json::to_vec(messages).context("serialize history")?;

    let mut tmp = OsString::from(path.as_os_str());
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    std::fs::write(&tmp, data).with_context(|| format!("write {}", tmp.display()))?;
    std::fs::rename(&tmp, path).with_context(|| format!("rename onto {}", path.display()))?;
    Ok(())
}
