//! Server configuration

use crate::error::ConfigError;
use rigging_core::ActionPlan;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::time::Duration;

/// Default listen port
pub const DEFAULT_PORT: u16 = 12886;

/// Default path prefix for every bound route
pub const DEFAULT_URL_PREFIX: &str = "/api";

/// Version segment used when a service does not report its own
pub const DEFAULT_VERSION: &str = "v1";

/// Default maximum request body size (2 MiB)
pub const DEFAULT_BODY_LIMIT: usize = 2 * 1024 * 1024;

/// Default time allowed for in-flight requests to drain on stop
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

/// Configuration for an [`ApiServer`](crate::ApiServer)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Name recorded on the server's tracing span
    pub name: String,
    /// Listen address
    pub addr: SocketAddr,
    /// Path prefix, empty or starting with '/'
    pub url_prefix: String,
    /// Version segment for services without their own
    pub default_version: String,
    /// Deadline attached to every call context
    #[serde(with = "millis_opt")]
    pub request_timeout: Option<Duration>,
    /// Maximum accepted request body size in bytes
    pub body_limit: usize,
    /// Time allowed for graceful shutdown
    #[serde(with = "millis")]
    pub shutdown_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: "rigging".to_string(),
            addr: SocketAddr::from(([127, 0, 0, 1], DEFAULT_PORT)),
            url_prefix: DEFAULT_URL_PREFIX.to_string(),
            default_version: DEFAULT_VERSION.to_string(),
            request_timeout: None,
            body_limit: DEFAULT_BODY_LIMIT,
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
        }
    }
}

impl ServerConfig {
    /// Parse a JSON configuration document; missing fields take defaults
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_addr(mut self, addr: SocketAddr) -> Self {
        self.addr = addr;
        self
    }

    pub fn with_url_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.url_prefix = prefix.into();
        self
    }

    pub fn with_default_version(mut self, version: impl Into<String>) -> Self {
        self.default_version = version.into();
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    pub fn with_body_limit(mut self, limit: usize) -> Self {
        self.body_limit = limit;
        self
    }

    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    /// Check the prefix shape and the default version
    pub fn validate(&self) -> Result<(), ConfigError> {
        let prefix = &self.url_prefix;
        if !prefix.is_empty() && (!prefix.starts_with('/') || prefix.ends_with('/')) {
            return Err(ConfigError::InvalidPrefix(prefix.clone()));
        }
        if self.default_version.trim().is_empty() {
            return Err(ConfigError::EmptyVersion);
        }
        Ok(())
    }

    /// Path of an action: `{prefix}/{version}/{resource}/{action}`
    pub fn action_path(&self, version: &str, plan: &ActionPlan) -> String {
        format!(
            "{}/{}/{}/{}",
            self.url_prefix,
            version,
            plan.resource(),
            plan.action()
        )
    }

    /// Path of the introspection route: `{prefix}/exports`
    pub fn exports_path(&self) -> String {
        format!("{}/exports", self.url_prefix)
    }
}

mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

mod millis_opt {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(
        value: &Option<Duration>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(d) => serializer.serialize_some(&(d.as_millis() as u64)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Duration>, D::Error> {
        Option::<u64>::deserialize(deserializer).map(|ms| ms.map(Duration::from_millis))
    }
}
