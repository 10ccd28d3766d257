//! Errors returned by the box client.

use std::time::Duration;

use crate::{command::Command, decode::DecodeError};

/// A `Result` alias where the error is the crate's [Error].
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Everything that can go wrong while talking to the box.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The box could not be reached, or answered with an HTTP error status.
    #[error(transparent)]
    ConnectionFailed(#[from] ConnectionError),

    /// No response arrived within the configured timeout.
    #[error("Request to {url} timed out after {timeout:?}")]
    RequestTimedOut {
        /// The URL that was requested.
        url: String,
        /// The timeout that elapsed.
        timeout: Duration,
    },

    /// The response body was not valid JSON.
    #[error("Invalid response from the box: {0}")]
    InvalidResponse(#[source] serde_json::Error),

    /// The response was JSON but did not match the status record.
    #[error("Invalid status record: {0}")]
    Decode(#[from] DecodeError),

    /// The box reported that a control command did not succeed.
    #[error("Command {command} failed with error {code}: {body}")]
    CommandFailed {
        /// The command that was sent.
        command: Command,
        /// The raw value of the `error` field, `null` if it was missing.
        code: serde_json::Value,
        /// The raw response body.
        body: String,
    },
}

/// Failures to reach the box, including HTTP level errors.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    /// The transport could not complete the request.
    #[error("Failed to connect to {url}: {source}")]
    Transport {
        /// The URL that was requested.
        url: String,
        /// The underlying transport error.
        #[source]
        source: reqwest::Error,
    },

    /// The host and port do not form a usable URL.
    #[error("Failed to connect to {host}:{port}: {source}")]
    InvalidUrl {
        /// The configured host.
        host: String,
        /// The configured port.
        port: u16,
        /// Why the URL was rejected.
        #[source]
        source: url::ParseError,
    },

    /// The box answered with a 4xx or 5xx status.
    #[error("HTTP error from {url}: {status} {reason}")]
    Http {
        /// The URL that was requested.
        url: String,
        /// The HTTP status code.
        status: reqwest::StatusCode,
        /// The canonical reason phrase for the status.
        reason: String,
    },
}

impl Error {
    /// Classify a transport error from reqwest for the given request.
    pub(crate) fn from_transport(err: reqwest::Error, url: &str, timeout: Duration) -> Self {
        if err.is_timeout() {
            return Error::RequestTimedOut {
                url: url.to_string(),
                timeout,
            };
        }

        Error::ConnectionFailed(ConnectionError::Transport {
            url: url.to_string(),
            source: err,
        })
    }
}
