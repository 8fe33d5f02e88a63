//! Read-only HTTP API over the published leaderboard
//!
//! Handlers only read the latest state from the refresher's `watch` channel;
//! they never touch the score store.

pub mod handlers;
pub mod server;

pub use handlers::ApiState;
pub use server::{ApiServer, ApiServerConfig};
