//! The HTTP client for the box.

use std::{
    ops::{Deref, DerefMut},
    time::Duration,
};

use serde_json::Value;
use tokio::sync::OnceCell;
use url::Url;

use crate::{
    box_info::BoxInfo,
    command::Command,
    config::Config,
    error::{ConnectionError, Error, Result},
};

/// How long a request may take when no timeout is given.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// A client for a single box.
///
/// Every call is an independent HTTP round trip; nothing is cached and
/// nothing is retried. The underlying connection pool is opened on first use
/// and released by [BoxClient::close], by dropping a [ScopedClient], or by
/// dropping the client itself.
#[derive(Debug)]
pub struct BoxClient {
    host: String,
    port: u16,
    timeout: Duration,
    session: OnceCell<reqwest::Client>,
}

impl BoxClient {
    /// Create a client for the box at `host:port` using [DEFAULT_TIMEOUT].
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self::with_timeout(host, port, DEFAULT_TIMEOUT)
    }

    /// Create a client for the box at `host:port` with a custom request timeout.
    pub fn with_timeout(host: impl Into<String>, port: u16, timeout: Duration) -> Self {
        Self {
            host: host.into(),
            port,
            timeout,
            session: OnceCell::new(),
        }
    }

    /// Create a client from a [Config].
    pub fn from_config(config: &Config) -> Self {
        Self::with_timeout(config.host.clone(), config.port, config.timeout())
    }

    /// The host of the box.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// The port of the box.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// The timeout applied to every request.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Whether a connection pool is currently held.
    pub fn is_open(&self) -> bool {
        self.session.initialized()
    }

    /// Release the connection pool. Calling this more than once is harmless,
    /// and the next request opens a fresh pool.
    pub fn close(&mut self) {
        if self.session.take().is_some() {
            tracing::debug!(host = self.host, port = self.port, "closed session");
        }
    }

    /// Borrow the client for a scope. The connection pool is released when
    /// the returned guard is dropped, whether or not the calls made through
    /// it succeeded.
    pub fn scoped(&mut self) -> ScopedClient<'_> {
        ScopedClient { client: self }
    }

    /// Fetch and decode the current status of the box.
    pub async fn get_info(&self) -> Result<BoxInfo> {
        let body = self.send(Command::Info).await?;
        let value: Value = serde_json::from_str(&body).map_err(Error::InvalidResponse)?;
        Ok(BoxInfo::from_value(&value)?)
    }

    /// Pause the current print.
    pub async fn pause_print(&self) -> Result<bool> {
        self.send_command(Command::Pause).await
    }

    /// Resume a paused print.
    pub async fn resume_print(&self) -> Result<bool> {
        self.send_command(Command::Resume).await
    }

    /// Stop the current print.
    pub async fn stop_print(&self) -> Result<bool> {
        self.send_command(Command::Stop).await
    }

    async fn send_command(&self, command: Command) -> Result<bool> {
        let body = self.send(command).await?;
        check_command_response(command, &body)
    }

    async fn session(&self, url: &Url) -> Result<&reqwest::Client> {
        let session = self
            .session
            .get_or_try_init(|| async {
                tracing::debug!(host = self.host, port = self.port, "opening session");
                reqwest::Client::builder().build()
            })
            .await
            .map_err(|source| ConnectionError::Transport {
                url: url.to_string(),
                source,
            })?;
        Ok(session)
    }

    /// Send a command and return the raw response body.
    async fn send(&self, command: Command) -> Result<String> {
        let url = command.url(&self.host, self.port)?;
        let session = self.session(&url).await?;

        tracing::debug!(%command, %url, "sending command");
        let response = session
            .get(url.clone())
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|err| Error::from_transport(err, url.as_str(), self.timeout))?;

        let status = response.status();
        tracing::debug!(%command, %status, "received response");
        if status.is_client_error() || status.is_server_error() {
            return Err(ConnectionError::Http {
                url: url.to_string(),
                status,
                reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
            }
            .into());
        }

        let body = response
            .text()
            .await
            .map_err(|err| Error::from_transport(err, url.as_str(), self.timeout))?;
        tracing::trace!(%command, body = %body, "response body");

        Ok(body)
    }
}

/// Check the `error` field of a control command's response.
///
/// `{"error": 0}` is success. Any other value, including a missing field, is
/// reported as [Error::CommandFailed] with the raw value attached.
pub fn check_command_response(command: Command, body: &str) -> Result<bool> {
    let value: Value = serde_json::from_str(body).map_err(Error::InvalidResponse)?;
    let code = value.get("error").cloned().unwrap_or(Value::Null);
    if code.as_i64() == Some(0) {
        return Ok(true);
    }

    Err(Error::CommandFailed {
        command,
        code,
        body: body.to_string(),
    })
}

/// A [BoxClient] borrowed for a scope; closes the client when dropped.
#[derive(Debug)]
pub struct ScopedClient<'a> {
    client: &'a mut BoxClient,
}

impl Deref for ScopedClient<'_> {
    type Target = BoxClient;

    fn deref(&self) -> &BoxClient {
        self.client
    }
}

impl DerefMut for ScopedClient<'_> {
    fn deref_mut(&mut self) -> &mut BoxClient {
        self.client
    }
}

impl Drop for ScopedClient<'_> {
    fn drop(&mut self) {
        self.client.close();
    }
}
