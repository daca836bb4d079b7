// -
// Path prefixes of the v2 HTTP API

pub(crate) const DEFAULT_KEYS_SPACE: &str = "/v2/keys";
pub(crate) const DEFAULT_STATS_SPACE: &str = "/v2/stats";
pub(crate) const DEFAULT_MEMBER_SPACE: &str = "/v2/members";

// -
// Cluster sequencing headers

pub(crate) const HEADER_ETCD_INDEX: &str = "x-etcd-index";
pub(crate) const HEADER_RAFT_INDEX: &str = "x-raft-index";
pub(crate) const HEADER_RAFT_TERM: &str = "x-raft-term";

// -
// Request parameter names

pub(crate) const PARAM_VALUE: &str = "value";
pub(crate) const PARAM_TTL: &str = "ttl";
pub(crate) const PARAM_DIR: &str = "dir";
pub(crate) const PARAM_PREV_EXIST: &str = "prevExist";
pub(crate) const PARAM_PREV_VALUE: &str = "prevValue";
pub(crate) const PARAM_PREV_INDEX: &str = "prevIndex";
pub(crate) const PARAM_RECURSIVE: &str = "recursive";
pub(crate) const PARAM_SORTED: &str = "sorted";
pub(crate) const PARAM_WAIT: &str = "wait";
pub(crate) const PARAM_WAIT_INDEX: &str = "waitIndex";
pub(crate) const PARAM_REFRESH: &str = "refresh";

// -
// Service error codes. The service owns [100, 500].

pub const KEY_NOT_FOUND: u32 = 100;
pub const TEST_FAILED: u32 = 101;
pub const NOT_FILE: u32 = 102;
pub const NOT_DIR: u32 = 104;
pub const NODE_EXIST: u32 = 105;
pub const ROOT_READ_ONLY: u32 = 107;
pub const DIR_NOT_EMPTY: u32 = 108;
pub const PREV_VALUE_REQUIRED: u32 = 201;
pub const TTL_NAN: u32 = 202;
pub const INDEX_NAN: u32 = 203;
pub const INVALID_FIELD: u32 = 209;
pub const RAFT_INTERNAL: u32 = 300;
pub const LEADER_ELECT: u32 = 301;
pub const WATCHER_CLEARED: u32 = 400;
pub const EVENT_INDEX_CLEARED: u32 = 401;

// -
// Local error codes. Disjoint from the service range.

pub const ERROR_RESPONSE_PARSE_FAILED: u32 = 1000;
pub const ERROR_SEND_REQUEST_FAILED: u32 = 1001;
pub const ERROR_CLUSTER_FAILED: u32 = 1002;
pub const ERROR_INVALID_CONFIG: u32 = 1003;
pub const ERROR_WATCH_NOT_FOUND: u32 = 1004;
