use std::sync::Arc;

use notifeed_feed::{FeedEngine, Renderer};

/// Shared state handed to every request handler.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<FeedEngine>,
    pub renderer: Renderer,
    pub version: &'static str,
}

impl AppState {
    pub fn new(engine: FeedEngine, renderer: Renderer) -> Self {
        Self {
            engine: Arc::new(engine),
            renderer,
            version: env!("CARGO_PKG_VERSION"),
        }
    }
}
