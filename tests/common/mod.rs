//! In-process stand-in for one etcd v2 member, served by warp.
//!
//! Covers what the integration tests exercise: leaf keys with optional ttl,
//! compare-and-swap by value, delete and the member listing.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::json;
use serde_json::Value;
use warp::http::StatusCode;
use warp::path::Tail;
use warp::reply::Response;
use warp::Filter;
use warp::Reply;

/// Address nothing listens on; connecting to it is refused immediately
pub const DEAD: &str = "http://127.0.0.1:1";

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    ttl: Option<i64>,
    created_index: u64,
    modified_index: u64,
}

#[derive(Debug, Default)]
struct Store {
    index: u64,
    keys: HashMap<String, Entry>,
    members: Vec<String>,
}

type Shared = Arc<Mutex<Store>>;

pub struct FakeEtcd {
    pub addr: SocketAddr,
    store: Shared,
}

impl FakeEtcd {
    pub async fn start() -> Self {
        let store: Shared = Arc::new(Mutex::new(Store::default()));
        let (addr, server) = warp::serve(routes(store.clone())).bind_ephemeral(([127, 0, 0, 1], 0));
        tokio::spawn(server);

        let fake = Self { addr, store };
        fake.set_members(vec![fake.url()]);
        fake
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Client URLs returned by the member listing, one member each
    pub fn set_members(
        &self,
        members: Vec<String>,
    ) {
        self.store.lock().members = members;
    }
}

fn routes(store: Shared) -> impl Filter<Extract = (Response,), Error = warp::Rejection> + Clone {
    let with_store = warp::any().map(move || store.clone());
    let keys = warp::path!("v2" / "keys" / ..).and(warp::path::tail());

    let members = warp::get()
        .and(warp::path!("v2" / "members"))
        .and(with_store.clone())
        .map(list_members);
    let get = warp::get().and(keys.clone()).and(with_store.clone()).map(get_key);
    let put = warp::put()
        .and(keys.clone())
        .and(warp::body::form::<HashMap<String, String>>())
        .and(with_store.clone())
        .map(put_key);
    let delete = warp::delete().and(keys).and(with_store).map(delete_key);

    members.or(get).unify().or(put).unify().or(delete).unify()
}

fn reply(
    status: StatusCode,
    body: Value,
    index: u64,
) -> Response {
    let reply = warp::reply::with_header(body.to_string(), "X-Etcd-Index", index.to_string());
    warp::reply::with_status(reply, status).into_response()
}

fn node_json(
    key: &str,
    entry: &Entry,
) -> Value {
    let mut node = json!({
        "key": key,
        "value": entry.value,
        "createdIndex": entry.created_index,
        "modifiedIndex": entry.modified_index,
    });
    if let Some(ttl) = entry.ttl {
        node["ttl"] = json!(ttl);
        node["expiration"] = json!("2026-10-17T12:00:00Z");
    }
    node
}

fn error(
    status: StatusCode,
    code: u32,
    message: &str,
    key: &str,
    index: u64,
) -> Response {
    let body = json!({ "errorCode": code, "message": message, "cause": key, "index": index });
    reply(status, body, index)
}

fn list_members(store: Shared) -> Response {
    let store = store.lock();
    let members: Vec<Value> = store
        .members
        .iter()
        .enumerate()
        .map(|(i, url)| {
            json!({
                "id": format!("{:016x}", i + 1),
                "name": format!("node{}", i + 1),
                "peerURLs": [],
                "clientURLs": [url],
            })
        })
        .collect();
    reply(StatusCode::OK, json!({ "members": members }), store.index)
}

fn get_key(
    tail: Tail,
    store: Shared,
) -> Response {
    let key = format!("/{}", tail.as_str());
    let store = store.lock();
    match store.keys.get(&key) {
        Some(entry) => reply(
            StatusCode::OK,
            json!({ "action": "get", "node": node_json(&key, entry) }),
            store.index,
        ),
        None => error(StatusCode::NOT_FOUND, 100, "Key not found", &key, store.index),
    }
}

fn put_key(
    tail: Tail,
    form: HashMap<String, String>,
    store: Shared,
) -> Response {
    let key = format!("/{}", tail.as_str());
    let mut store = store.lock();
    let previous = store.keys.get(&key).cloned();

    if let Some(expected) = form.get("prevValue") {
        match &previous {
            Some(prev) if &prev.value == expected => {}
            Some(prev) => {
                let cause = format!("[{} != {}]", expected, prev.value);
                return error(StatusCode::PRECONDITION_FAILED, 101, "Compare failed", &cause, store.index);
            }
            None => return error(StatusCode::NOT_FOUND, 100, "Key not found", &key, store.index),
        }
    }

    store.index += 1;
    let index = store.index;
    let entry = Entry {
        value: form.get("value").cloned().unwrap_or_default(),
        ttl: form.get("ttl").and_then(|t| t.parse().ok()),
        created_index: previous.as_ref().map(|p| p.created_index).unwrap_or(index),
        modified_index: index,
    };
    store.keys.insert(key.clone(), entry.clone());

    let action = if form.contains_key("prevValue") {
        "compareAndSwap"
    } else {
        "set"
    };
    let mut body = json!({ "action": action, "node": node_json(&key, &entry) });
    if let Some(prev) = &previous {
        body["prevNode"] = node_json(&key, prev);
    }
    let status = if previous.is_some() {
        StatusCode::OK
    } else {
        StatusCode::CREATED
    };
    reply(status, body, index)
}

fn delete_key(
    tail: Tail,
    store: Shared,
) -> Response {
    let key = format!("/{}", tail.as_str());
    let mut store = store.lock();
    match store.keys.remove(&key) {
        Some(prev) => {
            store.index += 1;
            let index = store.index;
            let body = json!({
                "action": "delete",
                "node": { "key": key, "createdIndex": prev.created_index, "modifiedIndex": index },
                "prevNode": node_json(&key, &prev),
            });
            reply(StatusCode::OK, body, index)
        }
        None => error(StatusCode::NOT_FOUND, 100, "Key not found", &key, store.index),
    }
}
