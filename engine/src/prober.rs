//! Single-attempt connectivity probing.
//!
//! A probe resolves the target, opens one connection, and closes it again.
//! Every candidate address the resolver returns is tried in order inside the
//! same bounded dial, the way a standard dialer does; nothing is retried.

use std::future::Future;
use std::io;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::pin::Pin;
use std::time::Duration;

use netcheck_types::ProbeTarget;
#[cfg(unix)]
use netcheck_types::Transport;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpSocket, TcpStream, UdpSocket};
#[cfg(unix)]
use tokio::net::UnixStream;

/// Probe future type alias.
pub type ProbeFut = Pin<Box<dyn Future<Output = Result<(), ProbeError>> + Send + 'static>>;

/// Something that can check one target once.
///
/// The returned future owns everything it needs so the checker can detach it.
pub trait Prober: Send + Sync + 'static {
    fn probe(&self, target: ProbeTarget, timeout: Duration) -> ProbeFut;
}

/// Why a dial did not produce a connection.
#[derive(Debug, Error)]
pub enum DialError {
    #[error("dial {network}: unknown network {network}")]
    UnknownNetwork { network: String },
    #[error("dial {network} {address}: no suitable address found")]
    NoSuitableAddress { network: String, address: String },
    #[error("dial {network} {address}: i/o timeout")]
    Timeout { network: String, address: String },
    #[error("dial {network} {address}: {source}")]
    Io {
        network: String,
        address: String,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("Network connection check determined that {target} is DOWN: {cause}")]
    Down {
        target: String,
        #[source]
        cause: DialError,
    },
    #[error("Network connection check failed to close connection to {target}: {source}")]
    Close {
        target: String,
        #[source]
        source: io::Error,
    },
}

/// Prober that dials the target over the real network.
#[derive(Debug, Clone, Copy, Default)]
pub struct DialProber;

impl Prober for DialProber {
    fn probe(&self, target: ProbeTarget, timeout: Duration) -> ProbeFut {
        Box::pin(async move {
            let connection = match tokio::time::timeout(timeout, dial(&target)).await {
                Ok(Ok(connection)) => connection,
                Ok(Err(cause)) => return Err(down(&target, cause)),
                Err(_) => {
                    let cause = DialError::Timeout {
                        network: target.transport().to_string(),
                        address: target.host_port().to_string(),
                    };
                    return Err(down(&target, cause));
                }
            };
            connection.close(&target).await
        })
    }
}

fn down(target: &ProbeTarget, cause: DialError) -> ProbeError {
    let err = ProbeError::Down {
        target: target.raw().to_string(),
        cause,
    };
    tracing::error!("{err}");
    err
}

enum Connection {
    Stream(TcpStream),
    Datagram(UdpSocket),
    #[cfg(unix)]
    Local(UnixStream),
}

impl Connection {
    async fn close(self, target: &ProbeTarget) -> Result<(), ProbeError> {
        match self {
            Connection::Stream(mut stream) => match stream.shutdown().await {
                Ok(()) => Ok(()),
                // Peer already tore the connection down; nothing left to close.
                Err(e) if e.kind() == io::ErrorKind::NotConnected => Ok(()),
                Err(source) => Err(ProbeError::Close {
                    target: target.raw().to_string(),
                    source,
                }),
            },
            #[cfg(unix)]
            Connection::Local(mut stream) => match stream.shutdown().await {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == io::ErrorKind::NotConnected => Ok(()),
                Err(source) => Err(ProbeError::Close {
                    target: target.raw().to_string(),
                    source,
                }),
            },
            Connection::Datagram(socket) => {
                drop(socket);
                Ok(())
            }
        }
    }
}

async fn dial(target: &ProbeTarget) -> Result<Connection, DialError> {
    let transport = target.transport();
    #[cfg(unix)]
    if *transport == Transport::Unix {
        // Path sockets have no family to filter and no local address to bind.
        return UnixStream::connect(target.host_port())
            .await
            .map(Connection::Local)
            .map_err(|source| io_error(target, source));
    }
    let Some(family) = transport.family() else {
        return Err(DialError::UnknownNetwork {
            network: transport.to_string(),
        });
    };

    let candidates: Vec<SocketAddr> = tokio::net::lookup_host(target.host_port())
        .await
        .map_err(|source| io_error(target, source))?
        .filter(|addr| family.accepts(addr))
        .collect();

    let local_ip = target.local_bind_ip();
    let mut first_err = None;
    for addr in candidates {
        let attempt = if transport.is_datagram() {
            connect_datagram(addr, local_ip).await.map(Connection::Datagram)
        } else {
            connect_stream(addr, local_ip).await.map(Connection::Stream)
        };
        match attempt {
            Ok(connection) => return Ok(connection),
            Err(e) => {
                tracing::debug!(%addr, "Dial attempt failed: {e}");
                first_err.get_or_insert(e);
            }
        }
    }

    match first_err {
        Some(source) => Err(io_error(target, source)),
        None => Err(DialError::NoSuitableAddress {
            network: transport.to_string(),
            address: target.host_port().to_string(),
        }),
    }
}

fn io_error(target: &ProbeTarget, source: io::Error) -> DialError {
    DialError::Io {
        network: target.transport().to_string(),
        address: target.host_port().to_string(),
        source,
    }
}

/// Local IP to bind for `remote`, if the configured one matches its family.
fn matching_local_ip(local_ip: Option<IpAddr>, remote: SocketAddr) -> Option<IpAddr> {
    local_ip.filter(|ip| ip.is_ipv4() == remote.is_ipv4())
}

async fn connect_stream(addr: SocketAddr, local_ip: Option<IpAddr>) -> io::Result<TcpStream> {
    let socket = if addr.is_ipv4() {
        TcpSocket::new_v4()?
    } else {
        TcpSocket::new_v6()?
    };
    if let Some(ip) = matching_local_ip(local_ip, addr)
        && let Err(e) = socket.bind(SocketAddr::new(ip, 0))
    {
        tracing::debug!(local = %ip, "Ignoring local bind failure: {e}");
    }
    socket.connect(addr).await
}

async fn connect_datagram(addr: SocketAddr, local_ip: Option<IpAddr>) -> io::Result<UdpSocket> {
    let unspecified = unspecified_for(addr);
    let socket = match matching_local_ip(local_ip, addr) {
        Some(ip) => match UdpSocket::bind(SocketAddr::new(ip, 0)).await {
            Ok(socket) => socket,
            Err(e) => {
                tracing::debug!(local = %ip, "Ignoring local bind failure: {e}");
                UdpSocket::bind(SocketAddr::new(unspecified, 0)).await?
            }
        },
        None => UdpSocket::bind(SocketAddr::new(unspecified, 0)).await?,
    };
    socket.connect(addr).await?;
    Ok(socket)
}

fn unspecified_for(addr: SocketAddr) -> IpAddr {
    if addr.is_ipv4() {
        IpAddr::V4(Ipv4Addr::UNSPECIFIED)
    } else {
        IpAddr::V6(Ipv6Addr::UNSPECIFIED)
    }
}
