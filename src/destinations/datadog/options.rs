//! Configuration for the Datadog destinations

use super::agent::AgentShipper;
use super::api::ApiShipper;
use crate::core::{Destination, Encoder, EnvProvider, LogLevel, ProcessEnv};
use crate::destinations::{NopDestination, RemoteDestination};
use std::sync::Arc;
use std::time::Duration;

pub const US: &str = "datadoghq.us";
pub const EU: &str = "datadoghq.eu";

/// Site used when none is configured
pub const DEFAULT_SITE: &str = "datadoghq.com";

pub const DEFAULT_FLUSH_TIMEOUT: Duration = Duration::from_secs(5);

pub const API_KEY_VAR: &str = "DD_API_KEY";
pub const SITE_VAR: &str = "DD_SITE";

/// Record layout written to the agent
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AgentFormat {
    /// The encoded entry as-is
    Raw,
    /// `{"env","source","service","status","message"}` around the encoded entry
    #[default]
    Envelope,
}

/// Settings of one Datadog destination. Fixed once the destination is built.
#[derive(Debug, Clone)]
pub struct DatadogConfig {
    pub site: String,
    pub level: LogLevel,
    pub flush_timeout: Duration,
    pub tags: Vec<(String, String)>,
    pub source: Option<String>,
    pub service: Option<String>,
    pub hostname: Option<String>,
    pub env: Option<String>,
    /// Full intake URL, replacing the one derived from the site
    pub endpoint: Option<String>,
    /// Honour `HTTPS_PROXY` and friends for direct submission
    pub use_proxy: bool,
    pub agent_format: AgentFormat,
    /// Connect and write timeout for the agent connection. `None` leaves
    /// both to the operating system.
    pub agent_timeout: Option<Duration>,
}

impl Default for DatadogConfig {
    fn default() -> Self {
        Self {
            site: String::new(),
            level: LogLevel::Info,
            flush_timeout: DEFAULT_FLUSH_TIMEOUT,
            tags: Vec::new(),
            source: None,
            service: None,
            hostname: None,
            env: None,
            endpoint: None,
            use_proxy: true,
            agent_format: AgentFormat::default(),
            agent_timeout: Some(DEFAULT_FLUSH_TIMEOUT),
        }
    }
}

impl DatadogConfig {
    /// Tags as sent on the wire: `k1:v1,k2:v2`, in insertion order
    pub fn tags_string(&self) -> Option<String> {
        if self.tags.is_empty() {
            return None;
        }
        Some(
            self.tags
                .iter()
                .map(|(k, v)| format!("{}:{}", k, v))
                .collect::<Vec<_>>()
                .join(","),
        )
    }

    /// The `env` label, falling back to an `env` tag
    pub fn env_label(&self) -> Option<&str> {
        self.env.as_deref().or_else(|| {
            self.tags
                .iter()
                .find(|(k, _)| k == "env")
                .map(|(_, v)| v.as_str())
        })
    }
}

enum Target {
    Api { api_key: String },
    Agent { host_port: String },
}

/// Builder for a Datadog destination.
///
/// Options are applied in call order on top of the defaults (level Info,
/// 5 second flush timeout, envelope agent records).
///
/// # Example
///
/// ```no_run
/// use layerlog::destinations::datadog;
/// use layerlog::{LogLevel, Logger};
/// use std::time::Duration;
///
/// let remote = datadog::api(std::env::var("DD_API_KEY").unwrap_or_default())
///     .site(datadog::EU)
///     .service_name("billing")
///     .source("rust")
///     .tags([("version", "1.4.2")])
///     .level(LogLevel::Warn)
///     .flush_timeout(Duration::from_secs(2))
///     .build();
///
/// let logger = Logger::builder().destination(remote).build();
/// logger.warn("card declined", &[]);
/// ```
pub struct DatadogBuilder {
    target: Target,
    config: DatadogConfig,
    agent_timeout_set: bool,
}

/// Direct submission to the Datadog logs intake API
pub fn api(api_key: impl Into<String>) -> DatadogBuilder {
    DatadogBuilder::new(Target::Api {
        api_key: api_key.into(),
    })
}

/// Relay through a Datadog agent listening on `host:port`
pub fn agent(host_port: impl Into<String>) -> DatadogBuilder {
    DatadogBuilder::new(Target::Agent {
        host_port: host_port.into(),
    })
}

impl DatadogBuilder {
    fn new(target: Target) -> Self {
        Self {
            target,
            config: DatadogConfig::default(),
            agent_timeout_set: false,
        }
    }

    #[must_use = "builder methods return a new value"]
    pub fn level(mut self, level: LogLevel) -> Self {
        self.config.level = level;
        self
    }

    /// Maximum duration of one delivery (default 5s)
    #[must_use = "builder methods return a new value"]
    pub fn flush_timeout(mut self, timeout: Duration) -> Self {
        self.config.flush_timeout = timeout;
        if !self.agent_timeout_set {
            self.config.agent_timeout = Some(timeout);
        }
        self
    }

    /// Replaces previously set tags
    #[must_use = "builder methods return a new value"]
    pub fn tags<I, K, V>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.config.tags = tags
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn service_name(mut self, service: impl Into<String>) -> Self {
        self.config.service = Some(service.into());
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.config.source = Some(source.into());
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn hostname(mut self, hostname: impl Into<String>) -> Self {
        self.config.hostname = Some(hostname.into());
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn env(mut self, env: impl Into<String>) -> Self {
        self.config.env = Some(env.into());
        self
    }

    /// [`US`], [`EU`] or any other Datadog site
    #[must_use = "builder methods return a new value"]
    pub fn site(mut self, site: impl Into<String>) -> Self {
        self.config.site = site.into();
        self
    }

    /// Submit to this URL instead of `https://http-intake.logs.<site>/api/v2/logs`
    #[must_use = "builder methods return a new value"]
    pub fn endpoint(mut self, url: impl Into<String>) -> Self {
        self.config.endpoint = Some(url.into());
        self
    }

    /// Connect to the intake directly even when a proxy is configured
    #[must_use = "builder methods return a new value"]
    pub fn no_proxy(mut self) -> Self {
        self.config.use_proxy = false;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn agent_format(mut self, format: AgentFormat) -> Self {
        self.config.agent_format = format;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn agent_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.config.agent_timeout = timeout;
        self.agent_timeout_set = true;
        self
    }

    pub fn config(&self) -> &DatadogConfig {
        &self.config
    }

    /// Build against the process environment
    pub fn build(self) -> Arc<dyn Destination> {
        self.build_with_env(&ProcessEnv)
    }

    /// Build the destination.
    ///
    /// An empty API key or agent address yields a [`NopDestination`]. For the
    /// API variant the key and site are published to `env` as `DD_API_KEY`
    /// and `DD_SITE` and read back from it to configure the client.
    pub fn build_with_env(self, env: &dyn EnvProvider) -> Arc<dyn Destination> {
        let config = self.config;
        match self.target {
            Target::Api { api_key } => {
                if api_key.is_empty() {
                    return NopDestination::shared();
                }
                env.set_var(SITE_VAR, &config.site);
                env.set_var(API_KEY_VAR, &api_key);

                let api_key = env.var(API_KEY_VAR).unwrap_or(api_key);
                let site = env
                    .var(SITE_VAR)
                    .filter(|site| !site.is_empty())
                    .unwrap_or_else(|| DEFAULT_SITE.to_string());
                let level = config.level;

                match ApiShipper::new(config, api_key, &site) {
                    Ok(shipper) => Arc::new(RemoteDestination::new(
                        "datadog-api",
                        level,
                        Encoder::json(),
                        shipper,
                    )),
                    Err(e) => {
                        eprintln!("[LOGGER ERROR] Datadog API destination disabled: {}", e);
                        NopDestination::shared()
                    }
                }
            }
            Target::Agent { host_port } => {
                if host_port.is_empty() {
                    return NopDestination::shared();
                }
                let level = config.level;
                Arc::new(RemoteDestination::new(
                    "datadog-agent",
                    level,
                    Encoder::json(),
                    AgentShipper::new(config, host_port),
                ))
            }
        }
    }
}
