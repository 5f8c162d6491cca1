//! # Endpoint resolution.
//!
//! [`Endpoint`] turns a user-supplied host string and port into a concrete
//! socket address. A literal IP address is used directly with zero network
//! calls; anything else goes through a DNS lookup with a uniform random pick
//! among the returned records (simple client-side load distribution without
//! sticky affinity).
//!
//! ## Rules
//! - **No caching**: every call performs a fresh resolution, so a
//!   load-balanced name whose records change between reconnect attempts is
//!   picked up automatically.
//! - The random pick is a direct uniform index over the record set, so no
//!   record is permanently favored.

use std::net::{IpAddr, SocketAddr};

use rand::Rng;
use tokio::net::lookup_host;
use tokio_util::sync::CancellationToken;

use crate::error::ClientError;

/// The monitored endpoint: a host string plus a TCP port.
///
/// Immutable once the supervisor starts. The host may be a literal IPv4/IPv6
/// address or a DNS name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Endpoint {
    host: String,
    port: u16,
}

impl Endpoint {
    /// Creates a new endpoint.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Returns the host string.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Returns the port.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Resolves the endpoint to a concrete socket address.
    ///
    /// A host that parses as a literal IP short-circuits without touching the
    /// network. Otherwise a DNS query runs (cancellable via `ctx`); zero
    /// usable records yield [`ClientError::ResolutionFailed`], one or more
    /// yield a uniformly random member of the set.
    pub async fn resolve(&self, ctx: &CancellationToken) -> Result<SocketAddr, ClientError> {
        if let Ok(ip) = self.host.parse::<IpAddr>() {
            return Ok(SocketAddr::new(ip, self.port));
        }

        let lookup = lookup_host((self.host.as_str(), self.port));
        let addrs: Vec<SocketAddr> = tokio::select! {
            biased;
            _ = ctx.cancelled() => return Err(ClientError::Canceled),
            res = lookup => res
                .map_err(|_| ClientError::ResolutionFailed {
                    host: self.host.clone(),
                })?
                .collect(),
        };

        pick(&addrs).ok_or_else(|| ClientError::ResolutionFailed {
            host: self.host.clone(),
        })
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Picks a uniformly random address from the record set.
fn pick(addrs: &[SocketAddr]) -> Option<SocketAddr> {
    if addrs.is_empty() {
        return None;
    }
    let idx = rand::rng().random_range(0..addrs.len());
    Some(addrs[idx])
}
