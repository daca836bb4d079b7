use std::sync::Arc;

use arc_swap::ArcSwap;
use tracing::debug;
use tracing::info;

use super::HttpReply;
use super::HttpRequest;
use super::Method;
use super::Transport;
use crate::config::NetworkConfig;
use crate::config::TlsConfig;
use crate::constants::HEADER_ETCD_INDEX;
use crate::constants::HEADER_RAFT_INDEX;
use crate::constants::HEADER_RAFT_TERM;
use crate::Error;
use crate::Result;
use crate::TransportError;
use crate::TransportErrorKind;

/// [`Transport`] backed by a pooled `reqwest` client.
///
/// The connect timeout, verbosity and TLS material are baked into the pooled
/// client; reloading TLS swaps the whole client atomically so in-flight
/// requests keep the client they started with.
pub struct ReqwestTransport {
    network: NetworkConfig,
    client: ArcSwap<reqwest::Client>,
}

impl ReqwestTransport {
    pub fn new(
        network: &NetworkConfig,
        tls: &TlsConfig,
    ) -> Result<Self> {
        let client = build_client(network, tls)?;
        Ok(Self {
            network: network.clone(),
            client: ArcSwap::from_pointee(client),
        })
    }
}

#[async_trait::async_trait]
impl Transport for ReqwestTransport {
    async fn send(
        &self,
        request: HttpRequest,
    ) -> std::result::Result<HttpReply, TransportError> {
        let client = self.client.load_full();
        let url = request.url.clone();

        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
        };

        let mut builder = client.request(method, &request.url);
        builder = if request.method.has_form_body() {
            builder.form(&request.params)
        } else {
            builder.query(&request.params)
        };
        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(auth) = &request.auth {
            builder = builder.basic_auth(&auth.user, Some(&auth.password));
        }

        let response = builder.send().await.map_err(|e| classify(&url, e))?;

        let header = |name: &str| {
            response
                .headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(ToString::to_string)
        };
        let status = response.status().as_u16();
        let etcd_index = header(HEADER_ETCD_INDEX);
        let raft_index = header(HEADER_RAFT_INDEX);
        let raft_term = header(HEADER_RAFT_TERM);

        let body = response.text().await.map_err(|e| classify(&url, e))?;
        if self.network.verbose {
            debug!(%url, status, %body, "http exchange");
        }

        Ok(HttpReply {
            status,
            etcd_index,
            raft_index,
            raft_term,
            body,
        })
    }

    fn reload_tls(
        &self,
        tls: &TlsConfig,
    ) -> Result<()> {
        let client = build_client(&self.network, tls)?;
        self.client.store(Arc::new(client));
        info!("TLS material reloaded");
        Ok(())
    }
}

pub(super) fn build_client(
    network: &NetworkConfig,
    tls: &TlsConfig,
) -> Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder()
        .use_rustls_tls()
        .connect_timeout(network.connect_timeout())
        .connection_verbose(network.verbose);

    if tls.enable_tls {
        if let Some(ca) = &tls.ca_path {
            let pem = read_pem(ca)?;
            let cert = reqwest::Certificate::from_pem(&pem)
                .map_err(|e| Error::Tls(format!("invalid CA certificate {ca}: {e}")))?;
            builder = builder.add_root_certificate(cert);
        }
        if let (Some(cert), Some(key)) = (&tls.cert_path, &tls.key_path) {
            let mut pem = read_pem(cert)?;
            pem.extend(read_pem(key)?);
            let identity = reqwest::Identity::from_pem(&pem)
                .map_err(|e| Error::Tls(format!("invalid client identity {cert}: {e}")))?;
            builder = builder.identity(identity);
        }
    }

    builder.build().map_err(|e| Error::Tls(e.to_string()))
}

fn read_pem(path: &str) -> Result<Vec<u8>> {
    std::fs::read(path).map_err(|e| Error::Tls(format!("failed to read {path}: {e}")))
}

fn classify(
    url: &str,
    e: reqwest::Error,
) -> TransportError {
    let kind = if e.is_timeout() {
        TransportErrorKind::Timeout
    } else if e.is_connect() {
        TransportErrorKind::Connect
    } else {
        TransportErrorKind::Io
    };
    TransportError::new(kind, url, e.to_string())
}
