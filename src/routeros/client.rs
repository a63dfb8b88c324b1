use std::time::Duration;

use log::debug;
use tokio::io::{AsyncWriteExt, BufStream};
use tokio::net::TcpStream;

use super::proto::{encode_sentence, read_sentence};
use super::{DeviceSession, SessionError};
use crate::config::Device;
use crate::schema::Reply;

/// ============================================================
/// Client
/// ============================================================
///
/// A single authenticated RouterOS API connection.
///
/// Responsibilities:
/// - Open the TCP connection (bounded by a connect timeout)
/// - Log in
/// - Run one command at a time and collect its reply
/// - Refuse further commands once the reply stream is out of step
///
/// Not responsible for:
/// - Reconnecting (a fresh client is opened per scrape)
/// - Retrying failed commands
pub struct Client {
    stream: BufStream<TcpStream>,
    address: String,

    // Set when a command failed before its `!done` was read
    failure: Option<String>,
}

impl Client {
    /// Connects to `device` and logs in.
    ///
    /// Uses the post-6.43 login: name and password are sent in the
    /// `/login` sentence directly.
    pub async fn connect(device: &Device, timeout: Duration) -> Result<Self, SessionError> {
        let address = device.api_address();

        let stream = tokio::time::timeout(timeout, TcpStream::connect(&address))
            .await
            .map_err(|_| SessionError::ConnectTimeout {
                address: address.clone(),
                secs: timeout.as_secs(),
            })??;

        let mut client = Self {
            stream: BufStream::new(stream),
            address,
            failure: None,
        };

        client.login(&device.user, &device.password).await?;
        debug!("logged in to {} as {}", client.address, device.user);

        Ok(client)
    }

    async fn login(&mut self, user: &str, password: &str) -> Result<(), SessionError> {
        let params = [format!("=name={user}"), format!("=password={password}")];

        match self.run("/login", &params).await {
            Ok(_) => Ok(()),
            Err(SessionError::Trap { message }) => Err(SessionError::Login {
                user: user.to_string(),
                message,
            }),
            Err(e) => Err(e),
        }
    }

    /// Sends one command and reads sentences until `!done`.
    ///
    /// A `!trap` is remembered and reported once `!done` arrives, so
    /// the connection stays usable for the next command. Any other
    /// error leaves unread sentences behind; the client then fails
    /// every later command without touching the stream.
    pub async fn run(&mut self, command: &str, params: &[String]) -> Result<Reply, SessionError> {
        if let Some(cause) = &self.failure {
            return Err(SessionError::Unusable(cause.clone()));
        }

        let result = self.exchange(command, params).await;
        match &result {
            Ok(_) | Err(SessionError::Trap { .. }) => {}
            Err(e) => {
                debug!("session to {} unusable after {command}: {e}", self.address);
                self.failure = Some(e.to_string());
            }
        }

        result
    }

    async fn exchange(&mut self, command: &str, params: &[String]) -> Result<Reply, SessionError> {
        let mut words = Vec::with_capacity(params.len() + 1);
        words.push(command);
        words.extend(params.iter().map(|p| p.as_str()));

        self.stream.write_all(&encode_sentence(&words)).await?;
        self.stream.flush().await?;

        let mut reply = Reply::default();
        let mut trap: Option<String> = None;

        loop {
            let sentence = read_sentence(&mut self.stream).await?;

            match sentence.reply.as_str() {
                "!re" => reply.re.push(sentence.attributes),
                "!done" => {
                    reply.done = sentence.attributes;
                    break;
                }
                "!trap" => {
                    let message = sentence.attributes.value("message").to_string();
                    trap.get_or_insert(message);
                }
                // The device closes the connection after `!fatal`
                "!fatal" => {
                    return Err(SessionError::Fatal(sentence.other.join(" ")));
                }
                other => {
                    return Err(SessionError::Protocol(format!("unexpected reply word {other:?}")));
                }
            }
        }

        match trap {
            Some(message) => Err(SessionError::Trap { message }),
            None => Ok(reply),
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }
}

#[async_trait::async_trait]
impl DeviceSession for Client {
    async fn execute(&mut self, command: &str, params: &[String]) -> Result<Reply, SessionError> {
        self.run(command, params).await
    }
}
