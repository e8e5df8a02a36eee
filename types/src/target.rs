//! Connection targets and the address parser.
//!
//! A target is written either as `host:port` or as `proto://host:port`. The
//! parser never fails: anything it cannot make sense of is carried through and
//! surfaces later as a dial failure.

use std::fmt;
use std::net::{IpAddr, SocketAddr};

const SCHEME_SEPARATOR: &str = "://";
const DEFAULT_TRANSPORT: &str = "tcp";

/// Split a target into its transport protocol and `host:port` part.
///
/// Only the first `://` counts; everything after it is the address.
#[must_use]
pub fn split_address(full_address: &str) -> (&str, &str) {
    match full_address.split_once(SCHEME_SEPARATOR) {
        Some((network, address)) => (network, address),
        None => (DEFAULT_TRANSPORT, full_address),
    }
}

/// Address family restriction implied by a transport name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IpFamily {
    Any,
    V4,
    V6,
}

impl IpFamily {
    #[must_use]
    pub fn accepts(self, addr: &SocketAddr) -> bool {
        match self {
            IpFamily::Any => true,
            IpFamily::V4 => addr.is_ipv4(),
            IpFamily::V6 => addr.is_ipv6(),
        }
    }
}

/// Transport protocol named by the target's scheme.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transport {
    Tcp,
    Tcp4,
    Tcp6,
    Udp,
    Udp4,
    Udp6,
    /// Stream socket at a filesystem path.
    Unix,
    /// Unrecognized network name, kept verbatim for diagnostics.
    Other(String),
}

impl Transport {
    /// Parse a network name. Unknown names become [`Transport::Other`].
    #[must_use]
    pub fn parse(name: &str) -> Self {
        match name {
            "tcp" => Transport::Tcp,
            "tcp4" => Transport::Tcp4,
            "tcp6" => Transport::Tcp6,
            "udp" => Transport::Udp,
            "udp4" => Transport::Udp4,
            "udp6" => Transport::Udp6,
            "unix" => Transport::Unix,
            other => Transport::Other(other.to_string()),
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Transport::Tcp => "tcp",
            Transport::Tcp4 => "tcp4",
            Transport::Tcp6 => "tcp6",
            Transport::Udp => "udp",
            Transport::Udp4 => "udp4",
            Transport::Udp6 => "udp6",
            Transport::Unix => "unix",
            Transport::Other(name) => name,
        }
    }

    #[must_use]
    pub fn is_datagram(&self) -> bool {
        matches!(self, Transport::Udp | Transport::Udp4 | Transport::Udp6)
    }

    /// Family restriction, or `None` when the network is not IP based.
    #[must_use]
    pub fn family(&self) -> Option<IpFamily> {
        match self {
            Transport::Tcp | Transport::Udp => Some(IpFamily::Any),
            Transport::Tcp4 | Transport::Udp4 => Some(IpFamily::V4),
            Transport::Tcp6 | Transport::Udp6 => Some(IpFamily::V6),
            Transport::Unix | Transport::Other(_) => None,
        }
    }
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed connection target. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeTarget {
    raw: String,
    transport: Transport,
    host_port: String,
}

impl ProbeTarget {
    #[must_use]
    pub fn parse(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let (network, address) = split_address(&raw);
        let transport = Transport::parse(network);
        let host_port = address.to_string();
        Self {
            raw,
            transport,
            host_port,
        }
    }

    /// The target exactly as configured.
    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }

    #[must_use]
    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    #[must_use]
    pub fn host_port(&self) -> &str {
        &self.host_port
    }

    /// IP used for the local side of the dial.
    ///
    /// This reads the whole raw target as an IP literal, so it is `None` for
    /// anything carrying a scheme or a port. Callers treat it as best-effort.
    #[must_use]
    pub fn local_bind_ip(&self) -> Option<IpAddr> {
        self.raw.parse().ok()
    }
}

impl fmt::Display for ProbeTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
