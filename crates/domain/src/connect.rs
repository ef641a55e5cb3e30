use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Default SSH port handed to the remote desktop gateway.
pub const DEFAULT_SSH_PORT: u16 = 22;

/// Default VNC port handed to the remote desktop gateway.
pub const DEFAULT_VNC_PORT: u16 = 5900;

// Ordered most specific first.
static PING_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^ping\s+(?:-c\s+\d+\s+)?(\S+)$").ok());
static SSH_CONTAINER_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^ssh\s+-t\s+(\S+)\s+'(pct enter \d+)'$").ok());
static SSH_USER_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^ssh\s+(\S+)@(\S+)$").ok());
static VIRTCTL_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^virtctl\s+(console|ssh|vnc)\s+(\S+)\s+-n\s+(\S+)$").ok());

/// Connection intent class derived from a connect command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectProtocol {
    /// Reachability probe executed directly.
    Ping,
    /// Interactive shell session.
    Ssh,
    /// Graphical console session.
    Vnc,
    /// No interactive hand-off is possible.
    Unsupported,
}

impl ConnectProtocol {
    /// Returns the stable protocol name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ping => "ping",
            Self::Ssh => "ssh",
            Self::Vnc => "vnc",
            Self::Unsupported => "unsupported",
        }
    }
}

/// Structured connection intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectParams {
    /// Intent class.
    pub protocol: ConnectProtocol,
    /// Target host or workload name.
    pub hostname: String,
    /// Login identity, when the command names one.
    pub username: Option<String>,
    /// Target port.
    pub port: u16,
    /// Command to run on the remote side after login.
    pub remote_command: Option<String>,
}

impl ConnectParams {
    /// Returns the intent for commands no shape matches.
    #[must_use]
    pub fn unsupported() -> Self {
        Self {
            protocol: ConnectProtocol::Unsupported,
            hostname: String::new(),
            username: None,
            port: DEFAULT_SSH_PORT,
            remote_command: None,
        }
    }

    /// Returns the protocol the remote desktop gateway should open.
    ///
    /// `vnc` stays `vnc`; everything else becomes `ssh`.
    #[must_use]
    pub fn gateway_protocol(&self) -> ConnectProtocol {
        match self.protocol {
            ConnectProtocol::Vnc => ConnectProtocol::Vnc,
            _ => ConnectProtocol::Ssh,
        }
    }
}

/// Classifies a connect-category command into a connection intent.
///
/// Total: every input yields exactly one intent, `unsupported` when no shape
/// matches.
#[must_use]
pub fn parse_connect_command(command: &str) -> ConnectParams {
    let trimmed = command.trim();

    if let Some(captures) = captures(&PING_PATTERN, trimmed) {
        return ConnectParams {
            protocol: ConnectProtocol::Ping,
            hostname: captures[1].to_owned(),
            ..ConnectParams::unsupported()
        };
    }

    if let Some(captures) = captures(&SSH_CONTAINER_PATTERN, trimmed) {
        return ConnectParams {
            protocol: ConnectProtocol::Ssh,
            hostname: captures[1].to_owned(),
            username: Some("root".to_owned()),
            port: DEFAULT_SSH_PORT,
            remote_command: Some(captures[2].to_owned()),
        };
    }

    if let Some(captures) = captures(&SSH_USER_PATTERN, trimmed) {
        return ConnectParams {
            protocol: ConnectProtocol::Ssh,
            hostname: captures[2].to_owned(),
            username: Some(captures[1].to_owned()),
            port: DEFAULT_SSH_PORT,
            remote_command: None,
        };
    }

    if let Some(captures) = captures(&VIRTCTL_PATTERN, trimmed) {
        let (protocol, port) = if &captures[1] == "vnc" {
            (ConnectProtocol::Vnc, DEFAULT_VNC_PORT)
        } else {
            (ConnectProtocol::Ssh, DEFAULT_SSH_PORT)
        };
        return ConnectParams {
            protocol,
            hostname: captures[2].to_owned(),
            username: None,
            port,
            remote_command: Some(command.to_owned()),
        };
    }

    ConnectParams::unsupported()
}

fn captures<'h>(pattern: &Option<Regex>, haystack: &'h str) -> Option<regex::Captures<'h>> {
    pattern.as_ref()?.captures(haystack)
}
