//! HTTP front end: one RSS route per notification channel.
//!
//! Lifecycle:
//! 1. Restore channel watermarks from the configured store
//! 2. Build the feed engine and RSS renderer
//! 3. Bind and serve until the process exits

pub mod server;
pub mod state;

pub use {
    server::{build_app, start},
    state::AppState,
};
