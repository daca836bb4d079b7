//! Key space operations.
//!
//! Each operation maps onto exactly one method/path/parameter combination;
//! the key argument is used verbatim as the path suffix of the key space.
//! A `ttl` of 0 falls back to the configured default ttl, and an effective
//! ttl of 0 leaves the key without expiry.

use serde_json::Value;

use super::ApiRequest;
use super::Client;
use crate::constants::PARAM_DIR;
use crate::constants::PARAM_PREV_EXIST;
use crate::constants::PARAM_PREV_INDEX;
use crate::constants::PARAM_PREV_VALUE;
use crate::constants::PARAM_RECURSIVE;
use crate::constants::PARAM_REFRESH;
use crate::constants::PARAM_SORTED;
use crate::constants::PARAM_VALUE;
use crate::constants::PARAM_WAIT;
use crate::constants::PARAM_WAIT_INDEX;
use crate::response::parse_json;
use crate::response::Response;
use crate::transport::Method;
use crate::Result;

impl Client {
    /// Reads a key
    pub async fn get(
        &self,
        key: &str,
    ) -> Result<Response> {
        self.inner.dispatch(&ApiRequest::keys("get", Method::Get, key)).await
    }

    /// Lists the nodes under a directory
    ///
    /// With `sorted` the service returns children in key order, otherwise in
    /// its own order; `recursive` includes the whole subtree.
    pub async fn directory(
        &self,
        key: &str,
        sorted: bool,
        recursive: bool,
    ) -> Result<Response> {
        let request = ApiRequest::keys("directory", Method::Get, key)
            .flag(PARAM_SORTED, sorted)
            .flag(PARAM_RECURSIVE, recursive);
        self.inner.dispatch(&request).await
    }

    /// Sets the value of a key, creating it if needed
    pub async fn set(
        &self,
        key: &str,
        value: &str,
        ttl: u64,
    ) -> Result<Response> {
        let request = ApiRequest::keys("set", Method::Put, key)
            .param(PARAM_VALUE, value)
            .ttl(self.effective_ttl(ttl));
        self.inner.dispatch(&request).await
    }

    /// Creates a directory; fails with `NODE_EXIST` if the key exists
    pub async fn make_directory(
        &self,
        key: &str,
        ttl: u64,
    ) -> Result<Response> {
        let request = ApiRequest::keys("make_directory", Method::Put, key)
            .flag(PARAM_DIR, true)
            .param(PARAM_PREV_EXIST, false)
            .ttl(self.effective_ttl(ttl));
        self.inner.dispatch(&request).await
    }

    /// Creates a directory whether it exists or not
    pub async fn dir_set(
        &self,
        key: &str,
        ttl: u64,
    ) -> Result<Response> {
        let request = ApiRequest::keys("dir_set", Method::Put, key)
            .flag(PARAM_DIR, true)
            .ttl(self.effective_ttl(ttl));
        self.inner.dispatch(&request).await
    }

    /// Updates the ttl of an existing directory
    pub async fn dir_update(
        &self,
        key: &str,
        ttl: u64,
    ) -> Result<Response> {
        let request = ApiRequest::keys("dir_update", Method::Put, key)
            .flag(PARAM_DIR, true)
            .param(PARAM_PREV_EXIST, true)
            .ttl(self.effective_ttl(ttl));
        self.inner.dispatch(&request).await
    }

    /// Updates the value or ttl of an existing key
    ///
    /// With `refresh` only the ttl is renewed: the value is not sent and
    /// watchers are not notified.
    pub async fn update(
        &self,
        key: &str,
        value: &str,
        ttl: u64,
        refresh: bool,
    ) -> Result<Response> {
        let mut request = ApiRequest::keys("update", Method::Put, key);
        if refresh {
            request = request.flag(PARAM_REFRESH, true);
        } else {
            request = request.param(PARAM_VALUE, value);
        }
        let request = request.param(PARAM_PREV_EXIST, true).ttl(self.effective_ttl(ttl));
        self.inner.dispatch(&request).await
    }

    /// Creates a key; fails with `NODE_EXIST` if it already exists
    pub async fn create(
        &self,
        key: &str,
        value: &str,
        ttl: u64,
    ) -> Result<Response> {
        let request = ApiRequest::keys("create", Method::Put, key)
            .param(PARAM_VALUE, value)
            .param(PARAM_PREV_EXIST, false)
            .ttl(self.effective_ttl(ttl));
        self.inner.dispatch(&request).await
    }

    /// Creates a key with a service-assigned, monotonically increasing name
    /// under the directory `key`
    pub async fn create_in_order(
        &self,
        key: &str,
        value: &str,
        ttl: u64,
    ) -> Result<Response> {
        let request = ApiRequest::keys("create_in_order", Method::Post, key)
            .param(PARAM_VALUE, value)
            .ttl(self.effective_ttl(ttl));
        self.inner.dispatch(&request).await
    }

    /// Deletes a key
    pub async fn delete(
        &self,
        key: &str,
    ) -> Result<Response> {
        self.inner.dispatch(&ApiRequest::keys("delete", Method::Delete, key)).await
    }

    /// Deletes a directory; without `recursive` it must be empty
    pub async fn dir_remove(
        &self,
        key: &str,
        recursive: bool,
    ) -> Result<Response> {
        let request = ApiRequest::keys("dir_remove", Method::Delete, key)
            .flag(PARAM_DIR, true)
            .flag(PARAM_RECURSIVE, recursive);
        self.inner.dispatch(&request).await
    }

    /// Waits for the next change of `key` at or after `index` (0 = from now)
    pub async fn watch(
        &self,
        key: &str,
        index: u64,
    ) -> Result<Response> {
        self.inner.dispatch(&wait_request("watch", key, index, false)).await
    }

    /// Waits for the next change of `key` or any key below it
    pub async fn watch_recursive(
        &self,
        key: &str,
        index: u64,
    ) -> Result<Response> {
        self.inner.dispatch(&wait_request("watch_recursive", key, index, true)).await
    }

    /// Sets `value` only if the current value equals `prev`
    pub async fn compare_and_swap(
        &self,
        key: &str,
        value: &str,
        prev: &str,
        ttl: u64,
    ) -> Result<Response> {
        let request = ApiRequest::keys("compare_and_swap", Method::Put, key)
            .param(PARAM_VALUE, value)
            .param(PARAM_PREV_VALUE, prev)
            .ttl(self.effective_ttl(ttl));
        self.inner.dispatch(&request).await
    }

    /// Sets `value` only if the key was last modified at index `prev`
    pub async fn compare_and_swap_by_index(
        &self,
        key: &str,
        value: &str,
        prev: u64,
        ttl: u64,
    ) -> Result<Response> {
        let request = ApiRequest::keys("compare_and_swap_by_index", Method::Put, key)
            .param(PARAM_VALUE, value)
            .param(PARAM_PREV_INDEX, prev)
            .ttl(self.effective_ttl(ttl));
        self.inner.dispatch(&request).await
    }

    /// Deletes the key only if its current value equals `prev`
    pub async fn compare_and_delete(
        &self,
        key: &str,
        prev: &str,
    ) -> Result<Response> {
        let request = ApiRequest::keys("compare_and_delete", Method::Delete, key).param(PARAM_PREV_VALUE, prev);
        self.inner.dispatch(&request).await
    }

    /// Deletes the key only if it was last modified at index `prev`
    pub async fn compare_and_delete_by_index(
        &self,
        key: &str,
        prev: u64,
    ) -> Result<Response> {
        let request =
            ApiRequest::keys("compare_and_delete_by_index", Method::Delete, key).param(PARAM_PREV_INDEX, prev);
        self.inner.dispatch(&request).await
    }

    /// Raft statistics of the leader as seen by the picked member
    pub async fn stats_leader(&self) -> Result<Value> {
        self.stats("stats_leader", "/leader").await
    }

    /// Statistics of the picked member itself
    pub async fn stats_self(&self) -> Result<Value> {
        self.stats("stats_self", "/self").await
    }

    /// Operation counters of the store
    pub async fn stats_store(&self) -> Result<Value> {
        self.stats("stats_store", "/store").await
    }

    async fn stats(
        &self,
        op: &'static str,
        path: &str,
    ) -> Result<Value> {
        let result = match self.inner.send_with_failover(&ApiRequest::stats(op, path)).await {
            Ok(reply) => parse_json(&reply),
            Err(e) => Err(e),
        };
        if let Err(e) = &result {
            self.inner.record_error(e);
        }
        result
    }

    fn effective_ttl(
        &self,
        ttl: u64,
    ) -> u64 {
        if ttl == 0 {
            self.inner.config.load().default_ttl
        } else {
            ttl
        }
    }
}

/// Long-poll GET on `key`, resuming at `index` when it is non-zero
pub(crate) fn wait_request(
    op: &'static str,
    key: &str,
    index: u64,
    recursive: bool,
) -> ApiRequest {
    let mut request = ApiRequest::keys(op, Method::Get, key)
        .flag(PARAM_WAIT, true)
        .flag(PARAM_RECURSIVE, recursive)
        .long_poll();
    if index > 0 {
        request = request.param(PARAM_WAIT_INDEX, index);
    }
    request
}
