use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;

use super::invalid;
use crate::Result;

/// Timeouts shared by every request a client issues
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct NetworkConfig {
    /// TCP connect timeout in milliseconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_in_ms: u64,

    /// Time allowed to receive a complete response in milliseconds
    #[serde(default = "default_read_timeout")]
    pub read_timeout_in_ms: u64,

    /// Time allowed to send a complete request in milliseconds
    #[serde(default = "default_write_timeout")]
    pub write_timeout_in_ms: u64,

    /// Log connection-level read/write activity of the HTTP stack
    #[serde(default)]
    pub verbose: bool,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            connect_timeout_in_ms: default_connect_timeout(),
            read_timeout_in_ms: default_read_timeout(),
            write_timeout_in_ms: default_write_timeout(),
            verbose: false,
        }
    }
}

impl NetworkConfig {
    pub fn validate(&self) -> Result<()> {
        if self.connect_timeout_in_ms == 0 {
            return Err(invalid("connect timeout must be > 0".into()));
        }
        if self.read_timeout_in_ms == 0 || self.write_timeout_in_ms == 0 {
            return Err(invalid(format!(
                "read timeout {}ms and write timeout {}ms must be > 0",
                self.read_timeout_in_ms, self.write_timeout_in_ms
            )));
        }
        Ok(())
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_in_ms)
    }

    /// Deadline of a non-blocking request: send and receive budget combined
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.write_timeout_in_ms + self.read_timeout_in_ms)
    }
}

fn default_connect_timeout() -> u64 {
    1000
}
fn default_read_timeout() -> u64 {
    3000
}
fn default_write_timeout() -> u64 {
    1000
}
