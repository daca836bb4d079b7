mod client;
mod config;
pub mod constants;
mod errors;
pub mod metrics;
mod response;
mod scoped_timer;
pub mod transport;
mod watch;

pub use client::*;
pub use crate::config::*;
pub use errors::*;
pub use response::*;
pub use watch::*;

//-----------------------------------------------------------
// Test utils

#[cfg(test)]
pub mod test_utils;
