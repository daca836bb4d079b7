//! Client module for the etcd v2 HTTP API
//!
//! Provides the core components for talking to a cluster:
//! - [`Client`] - Main entry point, one per logical connection to a cluster
//! - [`ClientBuilder`] - Configurable client construction
//! - [`ClusterAddresses`] - Known members and the currently picked one
//! - key space operations on [`Client`] with transparent member failover
//!
//! # Basic Usage
//! ```no_run
//! use d_etcd_client::Client;
//! use std::time::Duration;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let client = Client::builder(vec![
//!         "http://node1:2379".into(),
//!         "http://node2:2379".into(),
//!     ])
//!     .connect_timeout(Duration::from_secs(1))
//!     .build()
//!     .unwrap();
//!
//!     client.set("/locks/a", "v1", 60).await.unwrap();
//!     let resp = client.get("/locks/a").await.unwrap();
//!     println!("value: {:?}", resp.node.value);
//!
//!     client.close().await;
//! }
//! ```
//!
//! # Concurrency
//! Operations take `&self` and keep shared state consistent, but the picked
//! member is a single client-wide cursor: callers issuing CRUD operations
//! from independent tasks should synchronize externally if they rely on
//! observing a particular failover order.

mod builder;
mod cluster;
mod dispatch;
mod kv;

pub use builder::*;
pub use cluster::*;
pub(crate) use dispatch::*;
pub(crate) use kv::wait_request;

#[cfg(test)]
mod dispatch_test;

use std::sync::Arc;

use arc_swap::ArcSwap;
use dashmap::DashMap;
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::error;
use tracing::info;

use crate::config::AuthConfig;
use crate::config::ClientConfig;
use crate::config::TlsConfig;
use crate::metrics::REQUEST_ERRORS_TOTAL;
use crate::transport::Transport;
use crate::watch::WatchGroup;
use crate::watch::WatchId;
use crate::watch::WatcherRegistry;
use crate::Error;
use crate::Result;

/// Main entry point for interacting with an etcd cluster
///
/// Holds the transport, the cluster addresses, the last error and every
/// watcher and asynchronous watch group started through it. Dropping the
/// client cancels all of them; [`close`](Client::close) additionally waits
/// for asynchronous groups to exit.
///
/// Created through the [`builder()`](Client::builder) method
pub struct Client {
    pub(crate) inner: Arc<ClientInner>,
}

pub(crate) struct ClientInner {
    pub(crate) transport: Arc<dyn Transport>,
    pub(crate) cluster: ClusterAddresses,
    pub(crate) config: ArcSwap<ClientConfig>,
    pub(crate) last_error: Mutex<Option<Error>>,
    pub(crate) watchers: Mutex<WatcherRegistry>,
    pub(crate) groups: DashMap<WatchId, WatchGroup>,
    pub(crate) shutdown: CancellationToken,
}

impl Client {
    /// Create a configured client builder
    ///
    /// # Arguments
    /// * `endpoints` - Initial cluster members, e.g. `http://127.0.0.1:2379`
    pub fn builder(endpoints: Vec<String>) -> ClientBuilder {
        ClientBuilder::new(endpoints)
    }

    /// Creates a client on top of an already constructed transport
    pub fn new(
        transport: Arc<dyn Transport>,
        config: ClientConfig,
    ) -> Result<Self> {
        let config = config.validate()?;
        let cluster = ClusterAddresses::new(config.endpoints.clone())?;
        info!("client created with members: {:?}", config.endpoints);

        Ok(Self {
            inner: Arc::new(ClientInner {
                transport,
                cluster,
                config: ArcSwap::from_pointee(config),
                last_error: Mutex::new(None),
                watchers: Mutex::new(WatcherRegistry::default()),
                groups: DashMap::new(),
                shutdown: CancellationToken::new(),
            }),
        })
    }

    /// Current configuration snapshot
    pub fn config(&self) -> Arc<ClientConfig> {
        self.inner.config.load_full()
    }

    /// Sets the basic-auth credentials attached to every subsequent request
    pub fn setup_user(
        &self,
        user: &str,
        password: &str,
    ) {
        self.inner.config.rcu(|current| {
            let mut next = ClientConfig::clone(current);
            next.auth = Some(AuthConfig {
                user: user.into(),
                password: password.into(),
            });
            next
        });
        debug!("credentials updated for user {}", user);
    }

    /// Loads CA, client certificate and key and applies them to every
    /// subsequent request
    pub fn setup_tls(
        &self,
        ca: Option<&str>,
        cert: Option<&str>,
        key: Option<&str>,
    ) -> Result<()> {
        let tls = TlsConfig::new(ca, cert, key);
        if let Err(e) = tls.validate().and_then(|_| self.inner.transport.reload_tls(&tls)) {
            self.inner.record_error(&e);
            return Err(e);
        }

        self.inner.config.rcu(|current| {
            let mut next = ClientConfig::clone(current);
            next.tls = tls.clone();
            next
        });
        Ok(())
    }

    /// Last error produced by any operation of this client, including
    /// best-effort membership refreshes
    pub fn last_error(&self) -> Option<Error> {
        self.inner.last_error.lock().clone()
    }

    /// Known member addresses, in failover order
    pub fn addresses(&self) -> Vec<String> {
        self.inner.cluster.snapshot().to_vec()
    }

    /// Address the next request will be sent to first
    pub fn picked_address(&self) -> String {
        self.inner.cluster.picked_address()
    }

    /// Index of [`picked_address`](Client::picked_address) in
    /// [`addresses`](Client::addresses)
    pub fn picked(&self) -> usize {
        self.inner.cluster.picked()
    }

    /// Stops every asynchronous watch group (waiting for each to exit),
    /// cancels every remaining watcher and empties the watcher registry.
    pub async fn close(self) {
        let ids: Vec<WatchId> = self.inner.groups.iter().map(|g| g.key().clone()).collect();
        for id in ids {
            match self.watch_multi_async_stop(&id).await {
                // finished on its own meanwhile
                Ok(()) | Err(Error::WatchNotFound(_)) => {}
                Err(e) => error!("failed to stop watch group {}: {:?}", id, e),
            }
        }

        self.inner.release_watchers();
        info!("client closed");
    }
}

impl Drop for Client {
    fn drop(&mut self) {
        self.inner.release_watchers();
    }
}

impl ClientInner {
    /// Cancels every watcher and empties the registry
    ///
    /// Registered watchers that were never driven end up `Stopped`; driven
    /// ones stop at their next await point.
    fn release_watchers(&self) {
        self.shutdown.cancel();
        let remaining = self.watchers.lock().clear();
        for watcher in remaining {
            watcher.stop_idle();
        }
    }

    pub(crate) fn record_error(
        &self,
        e: &Error,
    ) {
        REQUEST_ERRORS_TOTAL.with_label_values(&[&e.code().to_string()]).inc();
        *self.last_error.lock() = Some(e.clone());
    }
}
