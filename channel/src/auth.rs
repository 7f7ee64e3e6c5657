//! Shared-secret access gate.
//!
//! Clients send `Authorization: authkey <secret>`. This is a plain string
//! comparison against a static key, not a cryptographic proof of identity:
//! anyone who has seen the header can replay it. Deploy behind TLS.

use tracing::warn;

use crate::error::ChannelError;

/// Scheme word that precedes the secret in the `Authorization` header.
pub const AUTH_SCHEME: &str = "authkey";

/// Which routes require the shared secret.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum AuthScope {
    /// Only posting a message needs the secret; history and health are public.
    #[default]
    WriteOnly,
    /// Every route, including the health probe, needs the secret.
    AllRoutes,
}

/// The operations a client can perform against the channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Health,
    Read,
    Write,
}

#[derive(Debug, Clone)]
pub struct AccessGate {
    expected: String,
    scope: AuthScope,
}

impl AccessGate {
    pub fn new(secret: &str, scope: AuthScope) -> Self {
        Self {
            expected: format!("{AUTH_SCHEME} {secret}"),
            scope,
        }
    }

    /// True if the presented header value matches the configured secret,
    /// ignoring surrounding whitespace.
    pub fn authorize(&self, credential: Option<&str>) -> bool {
        credential.is_some_and(|raw| raw.trim() == self.expected)
    }

    pub fn requires_auth(&self, op: Operation) -> bool {
        match (self.scope, op) {
            (_, Operation::Write) => true,
            (AuthScope::AllRoutes, _) => true,
            (AuthScope::WriteOnly, Operation::Health | Operation::Read) => false,
        }
    }

    /// Gate `op`, logging (but never echoing) rejected credentials.
    pub fn check(&self, op: Operation, credential: Option<&str>) -> Result<(), ChannelError> {
        if !self.requires_auth(op) || self.authorize(credential) {
            return Ok(());
        }
        if credential.is_none() {
            warn!(?op, "rejected request without Authorization header");
        } else {
            warn!(?op, "rejected request with mismatched Authorization header");
        }
        Err(ChannelError::Unauthorized)
    }
}
