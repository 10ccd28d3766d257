//! The commands that can be sent to the box.

use parse_display::{Display, FromStr};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{ConnectionError, Result};

/// The CGI endpoint every command is sent to. The host and port are
/// replaced per box.
const BASE_URL: &str = "http://localhost/protocal.csp";

/// The commands the box understands. Each one is a fixed query string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, FromStr, Serialize, Deserialize)]
#[display(style = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Command {
    /// Query the full status of the box.
    Info,
    /// Pause the current print.
    Pause,
    /// Resume a paused print.
    Resume,
    /// Stop the current print.
    Stop,
}

impl Command {
    /// The query string for this command.
    pub fn query(&self) -> &'static str {
        match self {
            Command::Info => "opt=main&fname=Info&function=get",
            Command::Pause => "opt=iot_conf&fname=net&function=set&pause=1",
            Command::Resume => "opt=iot_conf&fname=net&function=set&pause=0",
            Command::Stop => "opt=iot_conf&fname=net&function=set&stop=1",
        }
    }

    /// The full URL for this command on the box at `host:port`.
    ///
    /// The host is validated on its own, so a value such as `box/x` or
    /// `box:8080` is rejected instead of leaking into the path or port.
    pub fn url(&self, host: &str, port: u16) -> Result<Url> {
        let invalid = |source| ConnectionError::InvalidUrl {
            host: host.to_string(),
            port,
            source,
        };

        let mut url = Url::parse(BASE_URL).map_err(invalid)?;
        url.set_host(Some(host)).map_err(invalid)?;
        url.set_port(Some(port)).map_err(|()| invalid(url::ParseError::InvalidPort))?;
        url.set_query(Some(self.query()));
        Ok(url)
    }
}
