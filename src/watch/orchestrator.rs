use std::fmt::Display;
use std::sync::Arc;

use futures::future::join_all;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::error;
use tracing::info;

use super::Watcher;
use super::WatchControl;
use crate::client::Client;
use crate::response::Response;
use crate::Error;
use crate::Result;

/// Identifier of an asynchronous watch group
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WatchId(String);

impl WatchId {
    pub(crate) fn generate() -> Self {
        Self(nanoid::nanoid!())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for WatchId {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Task driving one asynchronous watch group and the token stopping it
#[derive(Debug)]
pub(crate) struct WatchGroup {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

impl Client {
    /// Creates a watcher on `key`, starting at `index` (0 = from now)
    ///
    /// The watcher does nothing until it is handed to
    /// [`watch_multi`](Client::watch_multi) or
    /// [`watch_multi_async`](Client::watch_multi_async). With `recursive` it
    /// covers the whole subtree; with `once` it stops after the first
    /// callback. The callback runs on the task driving the watcher and
    /// returns [`WatchControl::Stop`] to end the subscription.
    pub fn watcher_create<F>(
        &self,
        key: &str,
        index: u64,
        recursive: bool,
        once: bool,
        callback: F,
    ) -> Arc<Watcher>
    where
        F: FnMut(Result<Response>) -> WatchControl + Send + 'static,
    {
        Arc::new(Watcher::new(
            key,
            index,
            recursive,
            once,
            Box::new(callback),
            self.inner.shutdown.child_token(),
        ))
    }

    /// Registers `watcher` with this client; `false` if already registered
    pub fn watcher_add(
        &self,
        watcher: &Arc<Watcher>,
    ) -> bool {
        self.inner.watchers.lock().add(watcher)
    }

    /// Unregisters `watcher`; `false` if it is not registered here
    pub fn watcher_del(
        &self,
        watcher: &Watcher,
    ) -> bool {
        self.inner.watchers.lock().del(watcher)
    }

    /// Number of registered watchers
    pub fn watcher_count(&self) -> usize {
        self.inner.watchers.lock().len()
    }

    /// Registered watchers, in registry order
    pub fn watchers(&self) -> Vec<Arc<Watcher>> {
        self.inner.watchers.lock().iter().cloned().collect()
    }

    /// Stops one watcher without affecting the others of its group
    ///
    /// An outstanding long-poll is aborted. A watcher that is not being
    /// driven stops and leaves the registry immediately.
    pub fn watcher_stop(
        &self,
        watcher: &Watcher,
    ) {
        if watcher.stop_idle() {
            self.inner.watchers.lock().del(watcher);
        }
        debug!("[{}] watcher stop requested", watcher.key());
    }

    /// Drives every watcher of the set on the calling task until all of them
    /// stopped
    ///
    /// Watchers already stopped, or driven elsewhere, are skipped.
    pub async fn watch_multi(
        &self,
        watchers: impl IntoIterator<Item = Arc<Watcher>>,
    ) {
        let group = self.inner.shutdown.child_token();
        let inner = &self.inner;
        join_all(watchers.into_iter().map(|w| inner.drive(w, group.clone()))).await;
    }

    /// Drives the set on a dedicated task and returns immediately
    ///
    /// The returned id stops the group through
    /// [`watch_multi_async_stop`](Client::watch_multi_async_stop).
    pub fn watch_multi_async(
        &self,
        watchers: impl IntoIterator<Item = Arc<Watcher>>,
    ) -> WatchId {
        let id = WatchId::generate();
        let token = self.inner.shutdown.child_token();
        let watchers: Vec<Arc<Watcher>> = watchers.into_iter().collect();
        let count = watchers.len();

        let inner = self.inner.clone();
        let group = token.clone();
        let group_id = id.clone();
        let handle = tokio::spawn(async move {
            join_all(watchers.into_iter().map(|w| inner.drive(w, group.clone()))).await;
            if inner.groups.remove(&group_id).is_some() {
                debug!("watch group {} finished", group_id);
            }
        });

        info!("watch group {} started with {} watchers", id, count);
        self.inner.groups.insert(id.clone(), WatchGroup { token, handle });
        // the task may have finished before its entry existed
        self.inner.groups.remove_if(&id, |_, g| g.handle.is_finished());
        id
    }

    /// Stops an asynchronous watch group and waits for its task to exit
    ///
    /// No callback of the group runs once this returns. A group whose
    /// watchers all stopped on their own is already gone and yields
    /// [`Error::WatchNotFound`].
    pub async fn watch_multi_async_stop(
        &self,
        id: &WatchId,
    ) -> Result<()> {
        let Some((_, group)) = self.inner.groups.remove(id) else {
            return Err(Error::WatchNotFound(id.to_string()));
        };
        group.token.cancel();
        if let Err(e) = group.handle.await {
            error!("watch group {} exited abnormally: {:?}", id, e);
        }
        info!("watch group {} stopped", id);
        Ok(())
    }
}
