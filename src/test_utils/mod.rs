//! Test components shared by the unit tests: a scripted transport standing in
//! for a cluster, reply builders and client constructors.

mod scripted;

pub use scripted::*;

use std::sync::Arc;

use serde_json::json;

use crate::transport::HttpReply;
use crate::transport::MockTransport;
use crate::transport::Transport;
use crate::Client;
use crate::ClientConfig;
use crate::WatchPolicy;

pub const A: &str = "http://a:2379";
pub const B: &str = "http://b:2379";
pub const C: &str = "http://c:2379";

/// Client on `addresses` with short watcher backoff
pub fn test_client(
    addresses: &[&str],
    transport: Arc<dyn Transport>,
) -> Client {
    let config = ClientConfig {
        endpoints: addresses.iter().map(|a| a.to_string()).collect(),
        watch: WatchPolicy {
            base_delay_ms: 1,
            max_delay_ms: 5,
        },
        ..ClientConfig::default()
    };
    Client::new(transport, config).expect("test client should build")
}

pub fn mock_client(
    addresses: &[&str],
    transport: MockTransport,
) -> Client {
    test_client(addresses, Arc::new(transport))
}

/// Body of a key space response for a leaf node
pub fn leaf_body(
    action: &str,
    key: &str,
    value: &str,
    modified_index: u64,
) -> String {
    json!({
        "action": action,
        "node": {
            "key": key,
            "value": value,
            "modifiedIndex": modified_index,
            "createdIndex": modified_index,
        }
    })
    .to_string()
}

/// 200 reply carrying a leaf event at `modified_index`
pub fn event_reply(
    action: &str,
    key: &str,
    value: &str,
    modified_index: u64,
) -> HttpReply {
    HttpReply::new(200, leaf_body(action, key, value, modified_index)).with_header("X-Etcd-Index", modified_index)
}

/// Error document reply as the service sends it
pub fn error_reply(
    status: u16,
    code: u32,
    message: &str,
    index: u64,
) -> HttpReply {
    let body = json!({
        "errorCode": code,
        "message": message,
        "cause": "test",
        "index": index,
    })
    .to_string();
    HttpReply::new(status, body).with_header("X-Etcd-Index", index)
}
