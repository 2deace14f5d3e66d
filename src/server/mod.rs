//! HTTP surface over the post store.
//!
//! Every mutating route runs the store's locked read-modify-write cycle on
//! Tokio's blocking pool and answers with the full collection, newest first.
//! The short `/add`, `/edit/:id` and `/delete/:id` paths are served next to
//! their REST equivalents under `/posts`.

use crate::errors::{AppError, AppResult, PostError};
use crate::post_core::{self, EditRequest, Post, PostDraft};
use crate::post_io::PostStore;
use crate::streak;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

/// JSON response body, pretty-printed, non-ASCII left as is.
pub struct PrettyJson<T>(pub T);

impl<T: Serialize> IntoResponse for PrettyJson<T> {
    fn into_response(self) -> Response {
        match serde_json::to_vec_pretty(&self.0) {
            Ok(body) => ([(header::CONTENT_TYPE, "application/json")], body).into_response(),
            Err(e) => {
                error!("Failed to serialize response: {}", e);
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

#[derive(Debug, Serialize)]
struct Summary {
    streak: u32,
    posts: Vec<Post>,
}

#[derive(Debug, Serialize)]
struct StreakBody {
    streak: u32,
}

#[derive(Debug, Serialize)]
struct HealthBody {
    status: &'static str,
}

/// Maps application errors onto HTTP responses.
///
/// Client mistakes are echoed back. Anything else is logged here and answered
/// with a generic message.
#[derive(Debug)]
pub struct ApiError(AppError);

impl From<AppError> for ApiError {
    fn from(error: AppError) -> Self {
        ApiError(error)
    }
}

impl ApiError {
    fn invalid_body(rejection: JsonRejection) -> Self {
        warn!("Rejected request body: {}", rejection.body_text());
        ApiError(AppError::Post(PostError::Validation(
            "request body must be a JSON object".to_string(),
        )))
    }

    fn invalid_id(rejection: PathRejection) -> Self {
        warn!("Rejected post id: {}", rejection.body_text());
        ApiError(AppError::Post(PostError::Validation(
            "post id must be a positive integer".to_string(),
        )))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            AppError::Post(PostError::Validation(_)) => (StatusCode::BAD_REQUEST, self.0.to_string()),
            AppError::Post(PostError::NotFound { .. }) => (StatusCode::NOT_FOUND, self.0.to_string()),
            other => {
                error!("Request failed: {}", other);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        (status, PrettyJson(ErrorBody { error: message })).into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

/// Runs a store operation off the async executor.
async fn with_store<T, F>(store: Arc<PostStore>, f: F) -> ApiResult<T>
where
    F: FnOnce(&PostStore) -> AppResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(move || f(&store))
        .await
        .map_err(|e| AppError::Server(format!("Store task failed: {}", e)))?
        .map_err(ApiError::from)
}

async fn index(State(store): State<Arc<PostStore>>) -> ApiResult<PrettyJson<Summary>> {
    let posts = with_store(store, |store| store.load_posts()).await?;
    let streak = streak::current_streak(&posts);
    Ok(PrettyJson(Summary {
        streak,
        posts: post_core::sorted_descending(&posts),
    }))
}

async fn list_posts(State(store): State<Arc<PostStore>>) -> ApiResult<PrettyJson<Vec<Post>>> {
    let posts = with_store(store, |store| store.load_posts()).await?;
    Ok(PrettyJson(post_core::sorted_descending(&posts)))
}

async fn get_streak(State(store): State<Arc<PostStore>>) -> ApiResult<PrettyJson<StreakBody>> {
    let posts = with_store(store, |store| store.load_posts()).await?;
    Ok(PrettyJson(StreakBody {
        streak: streak::current_streak(&posts),
    }))
}

async fn create_post(
    State(store): State<Arc<PostStore>>,
    payload: Result<Json<PostDraft>, JsonRejection>,
) -> ApiResult<PrettyJson<Vec<Post>>> {
    let Json(draft) = payload.map_err(ApiError::invalid_body)?;
    let (posts, _) = with_store(store, move |store| store.append(draft)).await?;
    Ok(PrettyJson(post_core::sorted_descending(&posts)))
}

async fn edit_post(
    State(store): State<Arc<PostStore>>,
    path: Result<Path<u64>, PathRejection>,
    payload: Result<Json<EditRequest>, JsonRejection>,
) -> ApiResult<PrettyJson<Vec<Post>>> {
    let Path(id) = path.map_err(ApiError::invalid_id)?;
    let Json(request) = payload.map_err(ApiError::invalid_body)?;
    let posts = with_store(store, move |store| store.edit(id, request.content)).await?;
    Ok(PrettyJson(post_core::sorted_descending(&posts)))
}

async fn delete_post(
    State(store): State<Arc<PostStore>>,
    path: Result<Path<u64>, PathRejection>,
) -> ApiResult<PrettyJson<Vec<Post>>> {
    let Path(id) = path.map_err(ApiError::invalid_id)?;
    let posts = with_store(store, move |store| store.delete(id)).await?;
    Ok(PrettyJson(post_core::sorted_descending(&posts)))
}

async fn health() -> PrettyJson<HealthBody> {
    PrettyJson(HealthBody { status: "ok" })
}

/// Builds the application router around a shared store.
pub fn router(store: Arc<PostStore>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/streak", get(get_streak))
        .route("/posts", get(list_posts).post(create_post))
        .route("/posts/:id", put(edit_post).delete(delete_post))
        .route("/add", post(create_post))
        .route("/edit/:id", put(edit_post))
        .route("/delete/:id", delete(delete_post))
        .layer(TraceLayer::new_for_http())
        .with_state(store)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

/// Serves the router on `addr` until Ctrl-C.
///
/// # Errors
///
/// Returns `AppError::Io` if the address cannot be bound or the server fails.
pub async fn serve(store: Arc<PostStore>, addr: SocketAddr) -> AppResult<()> {
    let listener = TcpListener::bind(addr).await?;
    info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router(store))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}
