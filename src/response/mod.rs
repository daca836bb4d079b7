//! Hierarchical response model of the v2 key space.
//!
//! A [`Response`] owns its [`Node`] tree; every directory node owns its
//! children, so dropping the response releases the whole tree.

mod log;
mod parser;
pub use log::*;
pub use parser::*;


use serde::Deserialize;

/// Action the service reports for a successful operation or watch event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
pub enum Action {
    #[serde(rename = "set")]
    Set,
    #[serde(rename = "get")]
    Get,
    #[serde(rename = "update")]
    Update,
    #[serde(rename = "create")]
    Create,
    #[serde(rename = "delete")]
    Delete,
    #[serde(rename = "expire")]
    Expire,
    #[serde(rename = "compareAndSwap")]
    CompareAndSwap,
    #[serde(rename = "compareAndDelete")]
    CompareAndDelete,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Set => "set",
            Action::Get => "get",
            Action::Update => "update",
            Action::Create => "create",
            Action::Delete => "delete",
            Action::Expire => "expire",
            Action::CompareAndSwap => "compareAndSwap",
            Action::CompareAndDelete => "compareAndDelete",
        }
    }
}

/// One key of the hierarchical key space.
///
/// A node is either a leaf (`dir == false`, no children) or a directory
/// (`dir == true`, no value, zero or more children). A leaf may lack a value
/// when it describes a deleted or expired key.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Node {
    /// Full key path; empty for the root of the key space
    pub key: String,
    pub value: Option<String>,
    pub dir: bool,
    /// Children in the order the service presented them
    pub nodes: Vec<Node>,
    /// RFC 3339 expiration time, absent for non-expiring keys
    pub expiration: Option<String>,
    /// Remaining seconds to live, -1 for non-expiring keys
    pub ttl: i64,
    pub modified_index: u64,
    pub created_index: u64,
}

impl Node {
    pub fn is_leaf(&self) -> bool {
        !self.dir
    }

    pub fn expires(&self) -> bool {
        self.ttl >= 0
    }

    /// Depth-first lookup of a descendant (or self) by full key
    pub fn find(
        &self,
        key: &str,
    ) -> Option<&Node> {
        if self.key == key {
            return Some(self);
        }
        self.nodes.iter().find_map(|child| child.find(key))
    }
}

/// Outcome of one successful dispatch or watch event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub action: Action,
    pub node: Node,
    /// State of the node before the operation replaced it, if any
    pub prev_node: Option<Node>,
    pub etcd_index: u64,
    pub raft_index: u64,
    pub raft_term: u64,
}

/// One cluster member as listed by the member space
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Member {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "peerURLs", default)]
    pub peer_urls: Vec<String>,
    #[serde(rename = "clientURLs", default)]
    pub client_urls: Vec<String>,
}
