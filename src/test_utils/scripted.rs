use std::collections::HashMap;
use std::collections::VecDeque;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::time::Duration;

use parking_lot::Mutex;

use super::event_reply;
use crate::config::TlsConfig;
use crate::constants::PARAM_WAIT_INDEX;
use crate::transport::HttpReply;
use crate::transport::HttpRequest;
use crate::transport::Transport;
use crate::Result;
use crate::TransportError;
use crate::TransportErrorKind;

#[derive(Debug, Clone)]
pub enum ScriptStep {
    Reply(HttpReply),
    Fail(TransportErrorKind),
    /// Answers every request after `delay` with a `set` event at the
    /// requested waitIndex (1 if none); never consumed
    Follow(Duration),
}

/// Fake cluster answering from per-member scripts
///
/// A member without a script refuses connections. A member whose script is
/// exhausted holds the request open forever, the way a long-poll without
/// changes behaves.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    scripts: Mutex<HashMap<String, VecDeque<ScriptStep>>>,
    calls: Mutex<Vec<HttpRequest>>,
    in_flight: AtomicUsize,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(
        self,
        address: &str,
        steps: Vec<ScriptStep>,
    ) -> Self {
        self.scripts.lock().entry(address.to_string()).or_default().extend(steps);
        self
    }

    pub fn push(
        &self,
        address: &str,
        step: ScriptStep,
    ) {
        self.scripts.lock().entry(address.to_string()).or_default().push_back(step);
    }

    pub fn calls(&self) -> Vec<HttpRequest> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    /// Requests currently held open by the fake cluster
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    fn next_step(
        &self,
        url: &str,
    ) -> Option<ScriptStep> {
        let mut scripts = self.scripts.lock();
        match scripts.iter_mut().find(|(address, _)| url.starts_with(address.as_str())) {
            None => Some(ScriptStep::Fail(TransportErrorKind::Connect)),
            Some((_, steps)) => match steps.front() {
                Some(ScriptStep::Follow(_)) => steps.front().cloned(),
                _ => steps.pop_front(),
            },
        }
    }
}

struct InFlight<'a>(&'a AtomicUsize);

impl<'a> InFlight<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait::async_trait]
impl Transport for ScriptedTransport {
    async fn send(
        &self,
        request: HttpRequest,
    ) -> std::result::Result<HttpReply, TransportError> {
        self.calls.lock().push(request.clone());

        match self.next_step(&request.url) {
            Some(ScriptStep::Reply(reply)) => Ok(reply),
            Some(ScriptStep::Fail(kind)) => Err(TransportError::new(kind, request.url, "scripted failure")),
            Some(ScriptStep::Follow(delay)) => {
                tokio::time::sleep(delay).await;
                let index = request
                    .param(PARAM_WAIT_INDEX)
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(1);
                Ok(event_reply("set", "/follow", "tick", index))
            }
            None => {
                let _guard = InFlight::enter(&self.in_flight);
                std::future::pending().await
            }
        }
    }

    fn reload_tls(
        &self,
        _tls: &TlsConfig,
    ) -> Result<()> {
        Ok(())
    }
}
