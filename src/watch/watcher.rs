use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::error;
use tracing::trace;
use tracing::warn;

use crate::client::wait_request;
use crate::client::ApiRequest;
use crate::client::ClientInner;
use crate::constants::EVENT_INDEX_CLEARED;
use crate::metrics::ACTIVE_WATCHERS;
use crate::metrics::WATCH_EVENTS_TOTAL;
use crate::response::Response;
use crate::Error;
use crate::Result;

/// Returned by a watcher callback to keep watching or to stop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchControl {
    Continue,
    Stop,
}

/// Receives every event (or error) of one watcher, on the task driving it
pub type WatcherCallback = Box<dyn FnMut(Result<Response>) -> WatchControl + Send>;

/// Watcher lifecycle
///
/// `Created -> Active -> Stopped`. A stopped watcher is never restarted; it is
/// destroyed when its last handle is dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatcherLifecycle {
    /// Built, possibly registered, not driven yet
    Created,
    /// A drive loop owns it and a long-poll may be outstanding
    Active,
    Stopped,
}

#[derive(Debug)]
struct WatcherState {
    lifecycle: WatcherLifecycle,
    /// waitIndex of the next long-poll, 0 = from now
    index: u64,
    /// Consecutive failed long-polls
    attempts: usize,
}

/// What the drive loop does after one long-poll completed
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Step {
    Reissue,
    Backoff(Duration),
    Stop,
}

/// Subscription to the changes of one key (or one subtree)
///
/// Created through [`Client::watcher_create`](crate::Client::watcher_create)
/// and driven by [`Client::watch_multi`](crate::Client::watch_multi) or
/// [`Client::watch_multi_async`](crate::Client::watch_multi_async).
pub struct Watcher {
    key: String,
    recursive: bool,
    once: bool,
    state: Mutex<WatcherState>,
    callback: Mutex<WatcherCallback>,
    token: CancellationToken,
    /// Position in the owning client's registry
    pub(super) slot: Mutex<Option<usize>>,
}

impl Debug for Watcher {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("Watcher")
            .field("key", &self.key)
            .field("recursive", &self.recursive)
            .field("once", &self.once)
            .field("state", &*self.state.lock())
            .field("slot", &*self.slot.lock())
            .finish_non_exhaustive()
    }
}

impl Watcher {
    pub(crate) fn new(
        key: &str,
        index: u64,
        recursive: bool,
        once: bool,
        callback: WatcherCallback,
        token: CancellationToken,
    ) -> Self {
        Self {
            key: key.to_string(),
            recursive,
            once,
            state: Mutex::new(WatcherState {
                lifecycle: WatcherLifecycle::Created,
                index,
                attempts: 0,
            }),
            callback: Mutex::new(callback),
            token,
            slot: Mutex::new(None),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn recursive(&self) -> bool {
        self.recursive
    }

    pub fn once(&self) -> bool {
        self.once
    }

    pub fn state(&self) -> WatcherLifecycle {
        self.state.lock().lifecycle
    }

    /// Index the next long-poll resumes from: one past the last delivered
    /// event, or the starting index if nothing was delivered yet
    pub fn index(&self) -> u64 {
        self.state.lock().index
    }

    /// Consecutive failed long-polls since the last delivered event
    pub fn attempts(&self) -> usize {
        self.state.lock().attempts
    }

    /// Position in the owning client's registry, if registered
    pub fn slot(&self) -> Option<usize> {
        *self.slot.lock()
    }

    /// Claims the watcher for a drive loop. Fails if it was cancelled, is
    /// already being driven or has stopped.
    pub(crate) fn activate(&self) -> bool {
        let mut state = self.state.lock();
        if state.lifecycle != WatcherLifecycle::Created || self.token.is_cancelled() {
            return false;
        }
        state.lifecycle = WatcherLifecycle::Active;
        true
    }

    /// Cancels the watcher. A watcher nobody drives stops right away and
    /// `true` is returned; an active one is stopped by its drive loop.
    pub(crate) fn stop_idle(&self) -> bool {
        self.token.cancel();
        let mut state = self.state.lock();
        if state.lifecycle == WatcherLifecycle::Created {
            state.lifecycle = WatcherLifecycle::Stopped;
            return true;
        }
        false
    }

    pub(crate) fn mark_stopped(&self) {
        self.state.lock().lifecycle = WatcherLifecycle::Stopped;
    }

    pub(crate) fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub(crate) fn next_request(&self) -> ApiRequest {
        wait_request("watcher", &self.key, self.index(), self.recursive)
    }

    /// Applies the outcome of one long-poll and decides what happens next.
    ///
    /// Events at an index below the resume index were delivered already and
    /// are dropped without reaching the callback.
    pub(crate) fn handle(
        &self,
        result: Result<Response>,
        backoff: impl FnOnce(usize) -> Duration,
    ) -> Step {
        match result {
            Ok(resp) => {
                {
                    let mut state = self.state.lock();
                    if state.index > 0 && resp.node.modified_index < state.index {
                        trace!(
                            "[{}] dropping stale event at {} (resume index {})",
                            self.key,
                            resp.node.modified_index,
                            state.index
                        );
                        return Step::Reissue;
                    }
                    state.index = resp.node.modified_index + 1;
                    state.attempts = 0;
                }
                WATCH_EVENTS_TOTAL.inc();
                self.notify(Ok(resp))
            }
            Err(e @ Error::ClusterUnavailable { .. }) => {
                error!("[{}] watcher stopped, no member reachable: {}", self.key, e);
                self.notify(Err(e));
                Step::Stop
            }
            Err(Error::Service(e)) if e.code == EVENT_INDEX_CLEARED => {
                let resume = e.index + 1;
                warn!("[{}] event history cleared, resuming at {}", self.key, resume);
                let step = self.notify(Err(Error::Service(e)));
                if step == Step::Reissue {
                    self.state.lock().index = resume;
                }
                step
            }
            Err(e) => {
                let attempts = {
                    let mut state = self.state.lock();
                    state.attempts += 1;
                    state.attempts
                };
                warn!("[{}] long-poll failed ({} in a row): {}", self.key, attempts, e);
                match self.notify(Err(e)) {
                    Step::Reissue => Step::Backoff(backoff(attempts)),
                    step => step,
                }
            }
        }
    }

    fn notify(
        &self,
        result: Result<Response>,
    ) -> Step {
        let control = {
            let mut callback = self.callback.lock();
            (callback.as_mut())(result)
        };
        if control == WatchControl::Stop || self.once {
            Step::Stop
        } else {
            Step::Reissue
        }
    }
}

impl ClientInner {
    /// Drives one watcher until it stops, is cancelled or `group` is
    /// cancelled. Dropping the in-flight long-poll aborts the HTTP request.
    pub(crate) async fn drive(
        &self,
        watcher: Arc<Watcher>,
        group: CancellationToken,
    ) {
        if !watcher.activate() {
            debug!("[{}] watcher not started: already driven or stopped", watcher.key());
            return;
        }
        self.watchers.lock().add(&watcher);
        ACTIVE_WATCHERS.inc();
        debug!("[{}] watcher active from index {}", watcher.key(), watcher.index());

        loop {
            let request = watcher.next_request();
            let result = tokio::select! {
                biased;
                _ = watcher.token().cancelled() => break,
                _ = group.cancelled() => break,
                result = self.dispatch(&request) => result,
            };

            let policy = self.config.load().watch;
            match watcher.handle(result, |attempts| policy.backoff(attempts)) {
                Step::Reissue => {}
                Step::Backoff(delay) => {
                    tokio::select! {
                        biased;
                        _ = watcher.token().cancelled() => break,
                        _ = group.cancelled() => break,
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
                Step::Stop => break,
            }
        }

        watcher.mark_stopped();
        self.watchers.lock().del(&watcher);
        ACTIVE_WATCHERS.dec();
        debug!("[{}] watcher stopped at index {}", watcher.key(), watcher.index());
    }
}
