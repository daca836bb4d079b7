use tracing::debug;

use super::Node;
use super::Response;

/// Logs a response at debug level: the action and sequencing numbers, then
/// the node tree one node per line, children indented under their parent.
pub fn log_response(resp: &Response) {
    debug!(
        "response action={} etcd_index={} raft_index={} raft_term={}",
        resp.action.as_str(),
        resp.etcd_index,
        resp.raft_index,
        resp.raft_term
    );
    if let Some(prev) = &resp.prev_node {
        debug!("prev_node:");
        log_node(prev, 1);
    }
    debug!("node:");
    log_node(&resp.node, 1);
}

fn log_node(
    node: &Node,
    depth: usize,
) {
    let indent = "  ".repeat(depth);
    if node.dir {
        debug!(
            "{indent}{} (dir, {} children) ttl={} created={} modified={}",
            node.key,
            node.nodes.len(),
            node.ttl,
            node.created_index,
            node.modified_index
        );
        for child in &node.nodes {
            log_node(child, depth + 1);
        }
    } else {
        debug!(
            "{indent}{} = {:?} ttl={} created={} modified={}",
            node.key, node.value, node.ttl, node.created_index, node.modified_index
        );
    }
}
