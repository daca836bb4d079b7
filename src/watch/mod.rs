//! Long-poll watchers
//!
//! A [`Watcher`] follows one key (or subtree) by chaining long-poll GETs,
//! each resuming one index past the last delivered event. Watchers are
//! driven in sets, either on the calling task
//! ([`Client::watch_multi`](crate::Client::watch_multi)) or on one spawned
//! task per group
//! ([`Client::watch_multi_async`](crate::Client::watch_multi_async)). Within
//! a set all long-polls are multiplexed on a single task.

mod orchestrator;
mod registry;
mod watcher;

pub use orchestrator::*;
pub(crate) use registry::*;
pub use watcher::*;
