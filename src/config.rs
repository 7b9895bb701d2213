use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use config::{Config, Environment, File, Map};
use serde::Deserialize;

use crate::endpoint::{
    ContainerContext, EndpointContext, EndpointResolver, HostnameContext, Loopback, NamedPeers,
    CONTAINER_MARKER, LOOPBACK_HOST,
};
use crate::error::ConfigError;

pub const DEFAULT_CONFIG_FILE: &str = "mychain";
pub const ENV_PREFIX: &str = "MYCHAIN";

/// How to decide between `localhost` and the replica's service name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContextMode {
    /// Named peers when a container marker file is present.
    Container,
    Loopback,
    Named,
    /// Loopback only when `hostname` is `localhost`.
    Hostname,
}

/// Values given on the command line; they win over every other layer.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub api_port: Option<String>,
    pub context: Option<ContextMode>,
    pub poll_interval_ms: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Raw port value; anything that is not a port number means 5000.
    #[serde(default)]
    pub api_port: Option<String>,
    pub context: ContextMode,
    pub hostname: String,
    pub container_marker: String,
    pub poll_interval_ms: u64,
}

impl Settings {
    /// Defaults, then `path` (or `mychain.toml` if present), then
    /// `MYCHAIN_*` environment variables.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with_env(path, None)
    }

    /// Like [`Settings::load`], reading `MYCHAIN_*` keys from `env`
    /// instead of the process environment when it is given.
    pub fn load_with_env(
        path: Option<&Path>,
        env: Option<Map<String, String>>,
    ) -> Result<Self, ConfigError> {
        let file = match path {
            Some(path) => File::from(path).required(true),
            None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        let settings = Config::builder()
            .set_default("context", "container")?
            .set_default("hostname", LOOPBACK_HOST)?
            .set_default("container_marker", CONTAINER_MARKER)?
            .set_default("poll_interval_ms", 2_000)?
            .add_source(file)
            .add_source(Environment::with_prefix(ENV_PREFIX).source(env))
            .build()?
            .try_deserialize()?;
        Ok(settings)
    }

    pub fn apply(&mut self, overrides: Overrides) {
        if let Some(port) = overrides.api_port {
            self.api_port = Some(port);
        }
        if let Some(context) = overrides.context {
            self.context = context;
        }
        if let Some(interval_ms) = overrides.poll_interval_ms {
            self.poll_interval_ms = interval_ms;
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    pub fn endpoint_context(&self) -> Arc<dyn EndpointContext> {
        match self.context {
            ContextMode::Container => Arc::new(ContainerContext::new(&self.container_marker)),
            ContextMode::Loopback => Arc::new(Loopback),
            ContextMode::Named => Arc::new(NamedPeers),
            ContextMode::Hostname => Arc::new(HostnameContext::new(self.hostname.clone())),
        }
    }

    pub fn resolver(&self) -> EndpointResolver {
        EndpointResolver::new(self.api_port.clone(), self.endpoint_context())
    }
}
