use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use super::Action;
use super::Member;
use super::Node;
use super::Response;
use crate::transport::HttpReply;
use crate::Error;
use crate::Result;
use crate::ServiceError;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawResponse {
    action: Action,
    node: Option<RawNode>,
    prev_node: Option<RawNode>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawNode {
    #[serde(default)]
    key: String,
    value: Option<String>,
    #[serde(default)]
    dir: bool,
    nodes: Option<Vec<RawNode>>,
    expiration: Option<String>,
    ttl: Option<i64>,
    #[serde(default)]
    modified_index: u64,
    #[serde(default)]
    created_index: u64,
}

#[derive(Deserialize)]
struct RawMembers {
    #[serde(default)]
    members: Vec<Member>,
}

impl RawNode {
    /// Builds the node tree depth-first: children are fully converted
    /// before their parent is assembled.
    fn into_node(self) -> Result<Node> {
        let nodes = match self.nodes {
            Some(_) if !self.dir => {
                return Err(Error::Parse(format!("leaf node {} carries child nodes", self.key)));
            }
            Some(children) => children.into_iter().map(RawNode::into_node).collect::<Result<Vec<_>>>()?,
            None => Vec::new(),
        };

        if self.dir && self.value.is_some() {
            return Err(Error::Parse(format!("directory node {} carries a value", self.key)));
        }
        if self.created_index > self.modified_index {
            return Err(Error::Parse(format!(
                "node {} created at {} after its last modification at {}",
                self.key, self.created_index, self.modified_index
            )));
        }

        let (ttl, expiration) = match self.ttl {
            Some(ttl) => (ttl, self.expiration),
            None => (-1, None),
        };

        Ok(Node {
            key: self.key,
            value: self.value,
            dir: self.dir,
            nodes,
            expiration,
            ttl,
            modified_index: self.modified_index,
            created_index: self.created_index,
        })
    }
}

/// Turns one HTTP reply of the key space into a [`Response`] or an [`Error`].
///
/// - an error document yields [`Error::Service`] with the service's code
/// - a non-2xx status without an error document, or a body that is not a
///   well-formed response, yields [`Error::Parse`]
pub fn parse_response(reply: &HttpReply) -> Result<Response> {
    let document = parse_document(reply)?;

    let raw: RawResponse =
        serde_json::from_value(document).map_err(|e| Error::Parse(format!("malformed response document: {e}")))?;

    let node = raw
        .node
        .ok_or_else(|| Error::Parse(format!("{} response without node", raw.action.as_str())))?
        .into_node()?;
    let prev_node = raw.prev_node.map(RawNode::into_node).transpose()?;

    Ok(Response {
        action: raw.action,
        node,
        prev_node,
        etcd_index: header_index("X-Etcd-Index", reply.etcd_index.as_deref()),
        raft_index: header_index("X-Raft-Index", reply.raft_index.as_deref()),
        raft_term: header_index("X-Raft-Term", reply.raft_term.as_deref()),
    })
}

/// Parses the member listing into its members, in service order
pub fn parse_members(reply: &HttpReply) -> Result<Vec<Member>> {
    let document = parse_document(reply)?;
    let raw: RawMembers =
        serde_json::from_value(document).map_err(|e| Error::Parse(format!("malformed member listing: {e}")))?;
    Ok(raw.members)
}

/// Parses any successful JSON document, used by the stats space
pub fn parse_json(reply: &HttpReply) -> Result<Value> {
    parse_document(reply)
}

/// Validates status and error document, returning the decoded body
fn parse_document(reply: &HttpReply) -> Result<Value> {
    let document: std::result::Result<Value, _> = serde_json::from_str(&reply.body);

    if let Ok(document) = &document {
        if document.get("errorCode").is_some() {
            let service: ServiceError = serde_json::from_value(document.clone())
                .map_err(|e| Error::Parse(format!("malformed error document: {e}")))?;
            return Err(service.into());
        }
    }

    if !reply.is_success() {
        return Err(Error::Parse(format!("unexpected status {} without error document", reply.status)));
    }

    document.map_err(|e| Error::Parse(format!("body is not valid JSON: {e}")))
}

fn header_index(
    name: &str,
    value: Option<&str>,
) -> u64 {
    match value.map(|v| v.trim().parse::<u64>()) {
        Some(Ok(index)) => index,
        Some(Err(e)) => {
            warn!("ignoring malformed {} header: {:?}", name, e);
            0
        }
        None => 0,
    }
}
