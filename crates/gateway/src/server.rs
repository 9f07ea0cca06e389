use std::{net::SocketAddr, sync::Arc};

use {
    axum::{
        Json, Router,
        body::Body,
        extract::{Path, State},
        http::{StatusCode, header},
        response::{IntoResponse, Response},
        routing::get,
    },
    chrono::Utc,
    notifeed_config::NotifeedConfig,
    notifeed_feed::{
        ChannelRegistry, FeedEngine, NotificationSource, Renderer, WatermarkStore,
        default_channels,
    },
    tower_http::trace::TraceLayer,
    tracing::{info, warn},
};

use crate::state::AppState;

const RSS_CONTENT_TYPE: &str = "application/rss+xml; charset=utf-8";
const DEFAULT_CHANNEL: &str = "all";

/// Build the router with every route and layer attached.
pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/notifications", get(default_feed_handler))
        .route(
            "/notifications/{channel}",
            get(feed_handler).delete(reset_handler),
        )
        .route("/notifications/{channel}/detail", get(detail_feed_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Restore channels, build the engine and serve until the listener fails.
pub async fn start(
    config: &NotifeedConfig,
    source: Arc<dyn NotificationSource>,
    store: Arc<dyn WatermarkStore>,
) -> anyhow::Result<()> {
    let registry = ChannelRegistry::restore(default_channels(), store.as_ref()).await;
    let engine =
        FeedEngine::new(registry, source, store).with_max_entries(config.feed.max_entries);
    let renderer = Renderer::new(config.feed.meta.clone(), config.feed.guid);
    let app = build_app(AppState::new(engine, renderer));

    let listener =
        tokio::net::TcpListener::bind((config.server.bind.as_str(), config.server.port)).await?;
    let addr = listener.local_addr()?;
    info!(%addr, "notifeed listening");
    for channel in default_channels() {
        info!("  http://{addr}/notifications/{}", channel.name);
    }

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;
    Ok(())
}

// ── Handlers ─────────────────────────────────────────────────────────────────

async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": state.version,
        "channels": state.engine.registry().names(),
    }))
}

async fn default_feed_handler(State(state): State<AppState>) -> Response {
    serve_feed(&state, DEFAULT_CHANNEL, false)
}

async fn feed_handler(State(state): State<AppState>, Path(channel): Path<String>) -> Response {
    serve_feed(&state, &channel, false)
}

async fn detail_feed_handler(
    State(state): State<AppState>,
    Path(channel): Path<String>,
) -> Response {
    serve_feed(&state, &channel, true)
}

async fn reset_handler(State(state): State<AppState>, Path(channel): Path<String>) -> Response {
    match state.engine.reset(&channel).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => error_response(e),
    }
}

fn serve_feed(state: &AppState, channel: &str, detail: bool) -> Response {
    let entries = match state.engine.poll(channel, detail) {
        Ok(entries) => entries,
        Err(e) => return error_response(e),
    };
    let chunks = state.renderer.render(Utc::now(), entries);
    (
        [(header::CONTENT_TYPE, RSS_CONTENT_TYPE)],
        Body::from_stream(chunks),
    )
        .into_response()
}

fn error_response(e: notifeed_feed::Error) -> Response {
    if e.is_not_found() {
        return (StatusCode::NOT_FOUND, e.to_string()).into_response();
    }
    warn!(error = %e, "request failed");
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
}
