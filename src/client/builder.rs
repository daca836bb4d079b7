use std::sync::Arc;
use std::time::Duration;

use super::Client;
use crate::config::AuthConfig;
use crate::config::ClientConfig;
use crate::config::TlsConfig;
use crate::transport::ReqwestTransport;
use crate::transport::Transport;
use crate::Result;

pub struct ClientBuilder {
    config: ClientConfig,
    transport: Option<Arc<dyn Transport>>,
}

impl ClientBuilder {
    /// Create a new builder with default config and specified endpoints
    pub fn new(endpoints: Vec<String>) -> Self {
        Self {
            config: ClientConfig {
                endpoints,
                ..ClientConfig::default()
            },
            transport: None,
        }
    }

    /// Set connection timeout (default: 1s)
    pub fn connect_timeout(
        mut self,
        timeout: Duration,
    ) -> Self {
        self.config.network.connect_timeout_in_ms = timeout.as_millis() as u64;
        self
    }

    /// Set the time allowed for receiving a reply (default: 3s)
    pub fn read_timeout(
        mut self,
        timeout: Duration,
    ) -> Self {
        self.config.network.read_timeout_in_ms = timeout.as_millis() as u64;
        self
    }

    /// Set the time allowed for sending a request (default: 1s)
    pub fn write_timeout(
        mut self,
        timeout: Duration,
    ) -> Self {
        self.config.network.write_timeout_in_ms = timeout.as_millis() as u64;
        self
    }

    /// Enable wire-level diagnostics of every exchange (default: disabled)
    pub fn verbose(
        mut self,
        enable: bool,
    ) -> Self {
        self.config.network.verbose = enable;
        self
    }

    /// TTL in seconds used when an operation is given a ttl of 0
    pub fn default_ttl(
        mut self,
        ttl: u64,
    ) -> Self {
        self.config.default_ttl = ttl;
        self
    }

    pub fn credentials(
        mut self,
        user: &str,
        password: &str,
    ) -> Self {
        self.config.auth = Some(AuthConfig {
            user: user.into(),
            password: password.into(),
        });
        self
    }

    /// CA bundle, client certificate and private key, all PEM encoded
    pub fn tls(
        mut self,
        ca: Option<&str>,
        cert: Option<&str>,
        key: Option<&str>,
    ) -> Self {
        self.config.tls = TlsConfig::new(ca, cert, key);
        self
    }

    pub fn keys_space(
        mut self,
        space: &str,
    ) -> Self {
        self.config.keys_space = space.into();
        self
    }

    pub fn stats_space(
        mut self,
        space: &str,
    ) -> Self {
        self.config.stats_space = space.into();
        self
    }

    pub fn member_space(
        mut self,
        space: &str,
    ) -> Self {
        self.config.member_space = space.into();
        self
    }

    /// Completely replaces the default configuration
    ///
    /// # Warning: Configuration Override
    /// This will discard all previous settings configured through individual
    /// methods like [`connect_timeout`](ClientBuilder::connect_timeout) or
    /// [`default_ttl`](ClientBuilder::default_ttl), including the endpoints
    /// given to [`new`](ClientBuilder::new).
    ///
    /// # Example: Full Configuration
    /// ```ignore
    /// use d_etcd_client::{ClientBuilder, ClientConfig};
    ///
    /// let config = ClientConfig::new()?.with_override_config("config/etcd.toml")?;
    /// let client = ClientBuilder::new(vec![]).set_config(config).build()?;
    /// ```
    pub fn set_config(
        mut self,
        config: ClientConfig,
    ) -> Self {
        self.config = config;
        self
    }

    /// Sends requests through `transport` instead of the default HTTP
    /// transport
    pub fn transport(
        mut self,
        transport: Arc<dyn Transport>,
    ) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Build the client with current configuration
    pub fn build(self) -> Result<Client> {
        let config = self.config.validate()?;
        let transport = match self.transport {
            Some(transport) => transport,
            None => Arc::new(ReqwestTransport::new(&config.network, &config.tls)?),
        };
        Client::new(transport, config)
    }
}
