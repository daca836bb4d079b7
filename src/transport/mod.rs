//! HTTP transport seam.
//!
//! The dispatcher and the watchers only ever need "issue method M to URL U
//! with timeout T and parameters P, return status and body, or fail with a
//! transport error". [`Transport`] captures exactly that, so the production
//! [`ReqwestTransport`] can be swapped for a scripted one in tests.

mod http;
pub use http::*;


use std::time::Duration;

#[cfg(test)]
use mockall::automock;

use crate::config::AuthConfig;
use crate::config::TlsConfig;
use crate::constants::HEADER_ETCD_INDEX;
use crate::constants::HEADER_RAFT_INDEX;
use crate::constants::HEADER_RAFT_TERM;
use crate::Result;
use crate::TransportError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    /// Whether parameters travel in an urlencoded form body rather than the
    /// query string
    pub fn has_form_body(&self) -> bool {
        matches!(self, Method::Put | Method::Post)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub params: Vec<(&'static str, String)>,
    /// `None` leaves the request unbounded, used by long-polls
    pub timeout: Option<Duration>,
    pub auth: Option<AuthConfig>,
}

impl HttpRequest {
    pub fn param(
        &self,
        name: &str,
    ) -> Option<&str> {
        self.params.iter().find(|(k, _)| *k == name).map(|(_, v)| v.as_str())
    }
}

/// Status, cluster sequencing headers and body of one HTTP exchange
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HttpReply {
    pub status: u16,
    pub etcd_index: Option<String>,
    pub raft_index: Option<String>,
    pub raft_term: Option<String>,
    pub body: String,
}

impl HttpReply {
    pub fn new(
        status: u16,
        body: impl Into<String>,
    ) -> Self {
        Self {
            status,
            body: body.into(),
            ..Default::default()
        }
    }

    pub fn with_header(
        mut self,
        name: &str,
        value: impl ToString,
    ) -> Self {
        let value = Some(value.to_string());
        match name.to_ascii_lowercase().as_str() {
            HEADER_ETCD_INDEX => self.etcd_index = value,
            HEADER_RAFT_INDEX => self.raft_index = value,
            HEADER_RAFT_TERM => self.raft_term = value,
            _ => {}
        }
        self
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Performs one HTTP exchange.
    ///
    /// Any returned [`TransportError`] means the member could not be talked
    /// to; a reply with an error status is still `Ok`.
    async fn send(
        &self,
        request: HttpRequest,
    ) -> std::result::Result<HttpReply, TransportError>;

    /// Replaces the TLS material used by subsequent requests
    fn reload_tls(
        &self,
        tls: &TlsConfig,
    ) -> Result<()>;
}
