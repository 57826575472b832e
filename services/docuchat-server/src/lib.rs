//! DocuChat server - chat about meeting transcripts through Gemini context caches.
//!
//! This crate provides the HTTP backend:
//! - Meeting catalog and per-meeting chat history over flat-file storage
//! - Gemini context-cache lifecycle (create, look up, transparently replace)
//! - A conversation controller producing schema-constrained email drafts
//!
//! ## Architecture
//!
//! ```text
//! Client → Routes → ConversationService → CacheManager → Gemini
//!                         ↓                    ↓
//!                   history store        meeting store
//! ```

#![warn(clippy::all)]
#![allow(clippy::pedantic)]

pub mod cache;
pub mod conversation;
pub mod provider;
pub mod routes;

pub use cache::CacheManager;
pub use conversation::{ConversationService, EmailDraft};
pub use provider::{
    CachedContent, CreateCacheRequest, GeminiClient, GenerateRequest, ModelProvider, ProviderError,
};
pub use routes::AppState;

use axum::Router;
use std::net::SocketAddr;
use tower_http::cors::{Any, CorsLayer};

use docuchat_common::Config;

/// Build the server router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(routes::api_routes(state))
        .merge(routes::health_routes())
        .layer(cors)
}

/// Start the DocuChat server.
pub async fn start_server(config: &Config) -> anyhow::Result<()> {
    let addr = SocketAddr::from((
        config.server.host.parse::<std::net::IpAddr>()?,
        config.server.port,
    ));

    let state = AppState::from_config(config)?;
    let router = build_router(state);

    tracing::info!("Starting DocuChat server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}
