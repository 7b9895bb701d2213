use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use url::Url;

pub const DEFAULT_PORT: u16 = 5000;
pub const LOOPBACK_HOST: &str = "localhost";
pub const CONTAINER_MARKER: &str = "/.dockerenv";

/// Logical identity of one of the three replicas, each listening on a
/// well-known port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeId {
    Node1,
    Node2,
    Node3,
}

impl NodeId {
    /// Unknown ports fall back to the first replica.
    pub fn for_port(port: u16) -> Self {
        match port {
            5001 => NodeId::Node2,
            5002 => NodeId::Node3,
            _ => NodeId::Node1,
        }
    }

    pub fn hostname(&self) -> &'static str {
        match self {
            NodeId::Node1 => "node-1",
            NodeId::Node2 => "node-2",
            NodeId::Node3 => "node-3",
        }
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.hostname())
    }
}

/// Parses the configured port, falling back to [`DEFAULT_PORT`].
pub fn normalize_port(raw: Option<&str>) -> u16 {
    raw.and_then(|value| value.trim().parse::<u16>().ok())
        .unwrap_or(DEFAULT_PORT)
}

/// Answers whether the node is reachable through the loopback interface
/// from where the client is running right now.
pub trait EndpointContext: Send + Sync {
    fn loopback_reachable(&self) -> bool;
}

/// Always talk to `localhost`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Loopback;

impl EndpointContext for Loopback {
    fn loopback_reachable(&self) -> bool {
        true
    }
}

/// Always talk to the replica by service name.
#[derive(Debug, Clone, Copy, Default)]
pub struct NamedPeers;

impl EndpointContext for NamedPeers {
    fn loopback_reachable(&self) -> bool {
        false
    }
}

/// Loopback is reachable iff the client is being served from `localhost`.
#[derive(Debug, Clone)]
pub struct HostnameContext {
    hostname: String,
}

impl HostnameContext {
    pub fn new(hostname: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
        }
    }
}

impl EndpointContext for HostnameContext {
    fn loopback_reachable(&self) -> bool {
        self.hostname == LOOPBACK_HOST
    }
}

/// Loopback is reachable unless a container marker file exists.
/// The marker is checked on every call.
#[derive(Debug, Clone)]
pub struct ContainerContext {
    marker: PathBuf,
}

impl ContainerContext {
    pub fn new(marker: impl Into<PathBuf>) -> Self {
        Self {
            marker: marker.into(),
        }
    }
}

impl Default for ContainerContext {
    fn default() -> Self {
        Self::new(CONTAINER_MARKER)
    }
}

impl EndpointContext for ContainerContext {
    fn loopback_reachable(&self) -> bool {
        !self.marker.exists()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub hostname: String,
    pub port: u16,
}

impl Endpoint {
    pub fn base_url(&self) -> Result<Url, url::ParseError> {
        Url::parse(&self.to_string())
    }

    pub fn url(&self, path: &str) -> Result<Url, url::ParseError> {
        self.base_url()?.join(path)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "http://{}:{}", self.hostname, self.port)
    }
}

/// Resolves the node endpoint: `localhost:<port>` when loopback is
/// reachable, otherwise the replica's service name (e.g. inside a
/// container network). Holds no cached result: every call to
/// [`EndpointResolver::resolve`] consults the context again.
#[derive(Clone)]
pub struct EndpointResolver {
    port: Option<String>,
    context: Arc<dyn EndpointContext>,
}

impl EndpointResolver {
    pub fn new(port: Option<String>, context: Arc<dyn EndpointContext>) -> Self {
        Self { port, context }
    }

    pub fn port(&self) -> u16 {
        normalize_port(self.port.as_deref())
    }

    pub fn resolve(&self) -> Endpoint {
        resolve(self.port.as_deref(), self.context.as_ref())
    }
}

impl fmt::Debug for EndpointResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EndpointResolver")
            .field("port", &self.port)
            .finish_non_exhaustive()
    }
}

/// The node identity only selects the hostname; the configured port is
/// always kept.
pub fn resolve(port: Option<&str>, context: &dyn EndpointContext) -> Endpoint {
    let port = normalize_port(port);
    let hostname = if context.loopback_reachable() {
        LOOPBACK_HOST
    } else {
        NodeId::for_port(port).hostname()
    };
    Endpoint {
        hostname: hostname.to_string(),
        port,
    }
}
