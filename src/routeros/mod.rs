//! RouterOS API transport.
//!
//! This module provides:
//! - The `DeviceSession` abstraction collectors run commands through
//! - A TCP client speaking the RouterOS API sentence protocol
//! - A scripted fake session used by tests
//!
//! Collectors never open or close sessions; the dispatcher owns them
//! and lends one to each `collect` call.

pub mod client;
pub mod fake;
pub mod proto;

use crate::schema::Reply;

pub use client::Client;
pub use fake::FakeSession;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("connection to {address} timed out after {secs}s")]
    ConnectTimeout { address: String, secs: u64 },

    #[error("malformed reply: {0}")]
    Protocol(String),

    #[error("device trap: {message}")]
    Trap { message: String },

    #[error("device fatal: {0}")]
    Fatal(String),

    #[error("login failed for user {user}: {message}")]
    Login { user: String, message: String },

    #[error("connection closed by device")]
    Closed,

    #[error("session unusable after earlier error: {0}")]
    Unusable(String),
}

/// An authenticated channel to one device.
///
/// CONTRACT:
/// - `command` is a RouterOS menu path (e.g. `/interface/print`)
/// - `params` are raw API words in RouterOS syntax:
///   - `=.proplist=a,b` property projection
///   - `?disabled=false` query filter
///   - `=count-only=` count mode
/// - A session is not safe for concurrent use; `&mut self` keeps
///   one request in flight at a time.
#[async_trait::async_trait]
pub trait DeviceSession: Send {
    async fn execute(&mut self, command: &str, params: &[String]) -> Result<Reply, SessionError>;
}

/// Builds the `=.proplist=` projection word for a property list.
pub fn proplist(props: &[&str]) -> String {
    format!("=.proplist={}", props.join(","))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn proplist_joins_properties() {
        assert_eq!(proplist(&["name", "rx-byte"]), "=.proplist=name,rx-byte");
    }
}
