use tracing::debug;
use tracing::error;
use tracing::warn;

use super::ClientInner;
use crate::config::invalid;
use crate::config::ClientConfig;
use crate::metrics::CLUSTER_EXHAUSTED_TOTAL;
use crate::metrics::FAILOVERS_TOTAL;
use crate::metrics::REQUESTS_TOTAL;
use crate::response::log_response;
use crate::response::parse_response;
use crate::response::Response;
use crate::scoped_timer::ScopedTimer;
use crate::transport::HttpReply;
use crate::transport::HttpRequest;
use crate::transport::Method;
use crate::Error;
use crate::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Space {
    Keys,
    Stats,
    Members,
}

/// One logical operation, independent of the member it is sent to
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ApiRequest {
    pub(crate) op: &'static str,
    pub(crate) method: Method,
    pub(crate) space: Space,
    pub(crate) path: String,
    pub(crate) params: Vec<(&'static str, String)>,
    pub(crate) long_poll: bool,
}

impl ApiRequest {
    /// Operation on `key`, used verbatim as suffix of the key space
    pub(crate) fn keys(
        op: &'static str,
        method: Method,
        key: &str,
    ) -> Self {
        Self {
            op,
            method,
            space: Space::Keys,
            path: key.to_string(),
            params: Vec::new(),
            long_poll: false,
        }
    }

    pub(crate) fn stats(
        op: &'static str,
        path: &str,
    ) -> Self {
        Self {
            op,
            method: Method::Get,
            space: Space::Stats,
            path: path.to_string(),
            params: Vec::new(),
            long_poll: false,
        }
    }

    pub(crate) fn members(op: &'static str) -> Self {
        Self {
            op,
            method: Method::Get,
            space: Space::Members,
            path: String::new(),
            params: Vec::new(),
            long_poll: false,
        }
    }

    pub(crate) fn param(
        mut self,
        name: &'static str,
        value: impl ToString,
    ) -> Self {
        self.params.push((name, value.to_string()));
        self
    }

    /// Adds `name=true` when `on` is set
    pub(crate) fn flag(
        self,
        name: &'static str,
        on: bool,
    ) -> Self {
        if on {
            self.param(name, "true")
        } else {
            self
        }
    }

    /// Adds the ttl parameter unless it is 0
    pub(crate) fn ttl(
        self,
        ttl: u64,
    ) -> Self {
        if ttl > 0 {
            self.param(crate::constants::PARAM_TTL, ttl)
        } else {
            self
        }
    }

    /// The server holds the request open until a change occurs, so no
    /// request deadline applies
    pub(crate) fn long_poll(mut self) -> Self {
        self.long_poll = true;
        self
    }

    pub(crate) fn path(
        &self,
        config: &ClientConfig,
    ) -> String {
        let prefix = match self.space {
            Space::Keys => &config.keys_space,
            Space::Stats => &config.stats_space,
            Space::Members => &config.member_space,
        };
        format!("{}{}", prefix, self.path)
    }

    pub(crate) fn to_http(
        &self,
        url: String,
        config: &ClientConfig,
    ) -> HttpRequest {
        HttpRequest {
            method: self.method,
            url,
            params: self.params.clone(),
            timeout: if self.long_poll {
                None
            } else {
                Some(config.network.request_timeout())
            },
            auth: config.auth.clone(),
        }
    }
}

impl ClientInner {
    /// Issues one logical operation and parses its reply.
    ///
    /// Every error, whether from the transport, the service or the parser,
    /// is recorded as the client's last error before being returned.
    pub(crate) async fn dispatch(
        &self,
        request: &ApiRequest,
    ) -> Result<Response> {
        let _timer = ScopedTimer::new(request.op);
        REQUESTS_TOTAL.with_label_values(&[request.op]).inc();

        let result = match self.send_with_failover(request).await {
            Ok(reply) => parse_response(&reply),
            Err(e) => Err(e),
        };

        match &result {
            Ok(resp) => {
                debug!("[{}] {} -> {:?} at {}", request.op, request.path, resp.action, resp.etcd_index);
                if self.config.load().network.verbose {
                    log_response(resp);
                }
            }
            Err(e) => {
                debug!("[{}] {} -> {}", request.op, request.path, e);
                self.record_error(e);
            }
        }
        result
    }

    /// Sends `request` to the picked member, advancing through the remaining
    /// members on transport failure. Each known member is tried at most once.
    ///
    /// Only transport failures move on to the next member: any reply, even a
    /// malformed one, proves the member reachable and is returned as is.
    pub(crate) async fn send_with_failover(
        &self,
        request: &ApiRequest,
    ) -> Result<HttpReply> {
        let config = self.config.load_full();
        let addresses = self.cluster.snapshot();
        let total = addresses.len();
        let start = self.cluster.picked();
        let path = request.path(&config);

        let mut last = None;
        for attempt in 0..total {
            let picked = (start + attempt) % total;
            let url = format!("{}{}", addresses[picked].trim_end_matches('/'), path);

            match self.transport.send(request.to_http(url, &config)).await {
                Ok(reply) => return Ok(reply),
                Err(e) => {
                    let next = (picked + 1) % total;
                    warn!(
                        "[{}] member {} failed ({}), failing over to {}",
                        request.op, addresses[picked], e, addresses[next]
                    );
                    FAILOVERS_TOTAL.inc();
                    self.cluster.pick(next);
                    last = Some(e);
                }
            }
        }

        match last {
            Some(last) => {
                CLUSTER_EXHAUSTED_TOTAL.inc();
                error!("[{}] all {} cluster members failed, last error: {}", request.op, total, last);
                Err(Error::ClusterUnavailable { attempted: total, last })
            }
            None => Err(invalid("no cluster address to send to".into())),
        }
    }
}
