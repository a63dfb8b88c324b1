use std::collections::HashMap;

use super::{DeviceSession, SessionError};
use crate::schema::{Record, Reply};

/// What a scripted command answers with.
#[derive(Debug, Clone)]
enum Scripted {
    Reply(Reply),
    Trap(String),
}

#[derive(Debug, Clone)]
struct Entry {
    /// Answer only when one of the request params equals this word
    filter: Option<String>,
    answer: Scripted,
}

/// Minimal fake device session used in tests to script replies.
///
/// Replies are keyed by command. An entry registered with a filter
/// word (e.g. `?pool=dhcp`) wins over the unfiltered entry when the
/// request carries that word. Unknown commands answer with a trap,
/// the way RouterOS does.
#[derive(Debug, Default)]
pub struct FakeSession {
    script: HashMap<String, Vec<Entry>>,
    requests: Vec<(String, Vec<String>)>,
}

impl FakeSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(self, command: &str, records: Vec<Record>) -> Self {
        self.with_reply(command, Reply::new(records))
    }

    pub fn with_reply(mut self, command: &str, reply: Reply) -> Self {
        self.push(command, None, Scripted::Reply(reply));
        self
    }

    pub fn with_filtered_reply(mut self, command: &str, filter: &str, reply: Reply) -> Self {
        self.push(command, Some(filter.to_string()), Scripted::Reply(reply));
        self
    }

    pub fn with_trap(mut self, command: &str, message: &str) -> Self {
        self.push(command, None, Scripted::Trap(message.to_string()));
        self
    }

    fn push(&mut self, command: &str, filter: Option<String>, answer: Scripted) {
        self.script
            .entry(command.to_string())
            .or_default()
            .push(Entry { filter, answer });
    }

    /// Every request seen so far, in order.
    pub fn requests(&self) -> &[(String, Vec<String>)] {
        &self.requests
    }

    fn lookup(&self, command: &str, params: &[String]) -> Option<&Scripted> {
        let entries = self.script.get(command)?;

        entries
            .iter()
            .find(|e| e.filter.as_ref().is_some_and(|f| params.contains(f)))
            .or_else(|| entries.iter().find(|e| e.filter.is_none()))
            .map(|e| &e.answer)
    }
}

#[async_trait::async_trait]
impl DeviceSession for FakeSession {
    async fn execute(&mut self, command: &str, params: &[String]) -> Result<Reply, SessionError> {
        self.requests.push((command.to_string(), params.to_vec()));

        match self.lookup(command, params) {
            Some(Scripted::Reply(reply)) => Ok(reply.clone()),
            Some(Scripted::Trap(message)) => Err(SessionError::Trap {
                message: message.clone(),
            }),
            None => Err(SessionError::Trap {
                message: "no such command prefix".to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn filtered_reply_wins_over_default() {
        let mut session = FakeSession::new()
            .with_reply("/ip/pool/used/print", Reply::count("0"))
            .with_filtered_reply("/ip/pool/used/print", "?pool=dhcp", Reply::count("12"));

        let dhcp = session
            .execute("/ip/pool/used/print", &["?pool=dhcp".into(), "=count-only=".into()])
            .await
            .unwrap();
        let other = session
            .execute("/ip/pool/used/print", &["?pool=vpn".into()])
            .await
            .unwrap();

        assert_eq!(dhcp.done.get("ret"), Some("12"));
        assert_eq!(other.done.get("ret"), Some("0"));
        assert_eq!(session.requests().len(), 2);
    }

    #[tokio::test]
    async fn unknown_command_traps() {
        let mut session = FakeSession::new();
        assert!(session.execute("/nope", &[]).await.is_err());
    }
}
