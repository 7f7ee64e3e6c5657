//! Domain logic for the CalcWizard channel.
//!
//! Everything here is pure: no I/O, no clocks, no logging. Callers pass the
//! current time in explicitly.

pub mod arith;
pub mod classify;
pub mod message;
pub mod retention;

pub use message::{Message, Timestamp};
pub use retention::{RetentionPolicy, MAX_AGE_SECONDS, MAX_MESSAGES};
