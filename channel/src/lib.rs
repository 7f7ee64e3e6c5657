//! CalcWizard channel server.
//!
//! A single-topic chat relay: clients post short messages, the channel keeps a
//! bounded one-day history, and any arithmetic in a message gets an automated
//! `Result: ...` reply.

pub mod auth;
pub mod config;
pub mod error;
pub mod http;
pub mod hub;
pub mod service;
pub mod store;

pub use auth::{AccessGate, AuthScope};
pub use config::ChannelConfig;
pub use error::ChannelError;
pub use service::ChannelService;
pub use store::MessageStore;
