//! Read-only HTTP API over the document store.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/api/stands` | Every stand, tagged with its owner, sorted by name |
//! | `GET` | `/api/personagens` | All character names, ascending |
//! | `GET` | `/api/personagem/{nome}` | Character detail |
//! | `GET` | `/api/stand/{nome}` | Stand detail, tagged with its owner |
//! | `GET` | `/api/partes-com-episodios` | Arcs with their episodes |
//! | `GET` | `/api/estatisticas/nacionalidade` | Character count per nationality |
//!
//! Any other path is served from `[server].static_dir`.
//!
//! # Error Contract
//!
//! ```json
//! { "error": "Personagem não encontrado" }
//! ```
//!
//! Missing characters and stands answer 404 with a fixed message. Any store
//! failure is logged and answered with a generic 500.
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted.

use std::path::Path as FsPath;
use std::sync::Arc;

use anyhow::Context;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::config::Config;
use crate::db;
use crate::models::ArcDoc;
use crate::store::DocumentStore;
use crate::views::{self, CharacterView, NameView, NationalityView, StandView};

/// Shared state passed to every handler. The store is constructed by the
/// caller and owned for the lifetime of the server.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("character not found")]
    CharacterNotFound,
    #[error("stand not found")]
    StandNotFound,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::CharacterNotFound => (StatusCode::NOT_FOUND, "Personagem não encontrado"),
            ApiError::StandNotFound => (StatusCode::NOT_FOUND, "Stand não encontrado"),
            ApiError::Internal(err) => {
                error!(error = %format!("{:#}", err), "Request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "Erro interno do servidor")
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Builds the application router around an already connected store.
pub fn router(store: Arc<dyn DocumentStore>, static_dir: &FsPath) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/stands", get(handle_stands))
        .route("/api/personagens", get(handle_characters))
        .route("/api/personagem/{nome}", get(handle_character))
        .route("/api/stand/{nome}", get(handle_stand))
        .route("/api/partes-com-episodios", get(handle_arcs))
        .route("/api/estatisticas/nacionalidade", get(handle_nationalities))
        .fallback_service(ServeDir::new(static_dir))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(AppState { store })
}

/// Connects the store, serves until Ctrl-C, then closes the store.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let store: Arc<dyn DocumentStore> = Arc::new(db::connect_store(config).await?);
    let bind_addr = config.server.bind.clone();

    let listener = match tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", bind_addr))
    {
        Ok(listener) => listener,
        Err(err) => {
            store.close().await;
            return Err(err);
        }
    };

    let app = router(store.clone(), &config.server.static_dir);
    println!("Wiki server listening on http://{}", bind_addr);

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error");

    store.close().await;
    info!("Store connection closed");
    served
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}

// ============ Handlers ============

async fn handle_stands(State(state): State<AppState>) -> Result<Json<Vec<StandView>>, ApiError> {
    let owners = state.store.characters_with_stand().await?;
    Ok(Json(views::stand_list(owners)))
}

async fn handle_characters(State(state): State<AppState>) -> Result<Json<Vec<NameView>>, ApiError> {
    let names = state.store.character_names().await?;
    Ok(Json(views::name_list(names)))
}

async fn handle_character(
    State(state): State<AppState>,
    Path(nome): Path<String>,
) -> Result<Json<CharacterView>, ApiError> {
    let doc = state
        .store
        .find_character(&nome)
        .await?
        .ok_or(ApiError::CharacterNotFound)?;
    Ok(Json(CharacterView::from(doc)))
}

async fn handle_stand(
    State(state): State<AppState>,
    Path(nome): Path<String>,
) -> Result<Json<StandView>, ApiError> {
    let owner = state
        .store
        .find_stand_owner(&nome)
        .await?
        .ok_or(ApiError::StandNotFound)?;
    StandView::from_owner(owner)
        .map(Json)
        .ok_or(ApiError::StandNotFound)
}

async fn handle_arcs(State(state): State<AppState>) -> Result<Json<Vec<ArcDoc>>, ApiError> {
    Ok(Json(state.store.arcs().await?))
}

async fn handle_nationalities(
    State(state): State<AppState>,
) -> Result<Json<Vec<NationalityView>>, ApiError> {
    let groups = state.store.nationality_counts().await?;
    Ok(Json(groups.into_iter().map(NationalityView::from).collect()))
}
