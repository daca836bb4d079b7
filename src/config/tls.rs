use std::path::Path;

use serde::Deserialize;
use serde::Serialize;

use super::invalid;
use crate::Result;

/// Client-side TLS material, applied to every request of a client
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct TlsConfig {
    /// Enables TLS for `https://` members
    /// Default: false (disabled)
    #[serde(default)]
    pub enable_tls: bool,

    /// Path to the Certificate Authority root certificate (PEM)
    #[serde(default)]
    pub ca_path: Option<String>,

    /// Client certificate chain path in PEM format, used for mTLS
    #[serde(default)]
    pub cert_path: Option<String>,

    /// Client private key path in PEM format, used for mTLS
    #[serde(default)]
    pub key_path: Option<String>,
}

impl TlsConfig {
    pub fn new(
        ca: Option<&str>,
        cert: Option<&str>,
        key: Option<&str>,
    ) -> Self {
        Self {
            enable_tls: true,
            ca_path: ca.map(Into::into),
            cert_path: cert.map(Into::into),
            key_path: key.map(Into::into),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !self.enable_tls {
            return Ok(());
        }

        if self.cert_path.is_some() != self.key_path.is_some() {
            return Err(invalid("client certificate and key must be configured together".into()));
        }

        for path in [&self.ca_path, &self.cert_path, &self.key_path].into_iter().flatten() {
            if !Path::new(path).exists() {
                return Err(invalid(format!("TLS file {path} does not exist")));
            }
        }
        Ok(())
    }
}
