use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use arc_swap::ArcSwap;
use tracing::debug;
use tracing::info;
use tracing::warn;

use super::ApiRequest;
use super::Client;
use crate::config::invalid;
use crate::metrics::REQUESTS_TOTAL;
use crate::response::parse_members;
use crate::scoped_timer::ScopedTimer;
use crate::response::Member;
use crate::Error;
use crate::Result;

/// Known cluster members and the currently picked one
///
/// The address list is replaced as a whole: readers holding a snapshot keep
/// a consistent list while a membership refresh installs a new one. The
/// picked cursor is always read modulo the current list length.
pub struct ClusterAddresses {
    addresses: ArcSwap<Vec<String>>,
    picked: AtomicUsize,
}

impl ClusterAddresses {
    pub(crate) fn new(addresses: Vec<String>) -> Result<Self> {
        if addresses.is_empty() {
            return Err(invalid("at least one cluster address is required".into()));
        }
        Ok(Self {
            addresses: ArcSwap::from_pointee(addresses),
            picked: AtomicUsize::new(0),
        })
    }

    pub(crate) fn snapshot(&self) -> Arc<Vec<String>> {
        self.addresses.load_full()
    }

    pub(crate) fn picked(&self) -> usize {
        let len = self.addresses.load().len();
        self.picked.load(Ordering::Acquire) % len
    }

    pub(crate) fn picked_address(&self) -> String {
        let addresses = self.addresses.load();
        addresses[self.picked.load(Ordering::Acquire) % addresses.len()].clone()
    }

    /// Moves the cursor to `index` of the current list
    pub(crate) fn pick(
        &self,
        index: usize,
    ) {
        self.picked.store(index, Ordering::Release);
    }

    /// Installs a new, non-empty address list and resets the cursor
    pub(crate) fn replace(
        &self,
        addresses: Vec<String>,
    ) {
        debug_assert!(!addresses.is_empty());
        self.addresses.store(Arc::new(addresses));
        self.picked.store(0, Ordering::Release);
    }
}

impl Client {
    /// Refreshes the member list from the member space of the picked member.
    ///
    /// On success the client URLs of every listed member replace the known
    /// addresses and the cursor returns to the first one. Failures are never
    /// fatal: the existing list stays untouched and the error is recorded as
    /// [`last_error`](Client::last_error).
    pub async fn sync_cluster(&self) {
        match self.list_members().await {
            Ok(members) => {
                let addresses: Vec<String> = members.into_iter().flat_map(|m| m.client_urls).collect();
                if addresses.is_empty() {
                    warn!("member listing returned no client URLs, keeping current addresses");
                    self.inner
                        .record_error(&Error::Parse("member listing contains no client URLs".into()));
                    return;
                }
                info!("cluster members synced: {:?}", addresses);
                self.inner.cluster.replace(addresses);
            }
            Err(e) => warn!("cluster sync failed, keeping current addresses: {}", e),
        }
    }

    /// Lists cluster members as reported by the picked member
    ///
    /// Only the picked member is asked, so an unreachable member surfaces as
    /// [`Error::Transport`]. Errors are recorded as
    /// [`last_error`](Client::last_error).
    pub async fn list_members(&self) -> Result<Vec<Member>> {
        let config = self.inner.config.load();
        let request = ApiRequest::members("list_members");
        let url = format!(
            "{}{}",
            self.inner.cluster.picked_address().trim_end_matches('/'),
            request.path(&config)
        );
        debug!("list_members from {}", url);

        let _timer = ScopedTimer::new(request.op);
        REQUESTS_TOTAL.with_label_values(&[request.op]).inc();

        let result = match self.inner.transport.send(request.to_http(url, &config)).await {
            Ok(reply) => parse_members(&reply),
            Err(e) => Err(Error::Transport(e)),
        };
        if let Err(e) = &result {
            self.inner.record_error(e);
        }
        result
    }
}
