pub mod config;
pub mod database;
pub mod entity;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod state;
pub mod utils;

use std::time::Duration;

use axum::http::HeaderValue;
use tower_http::cors::{Any, CorsLayer};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable as ScalarServable};
use utoipa_swagger_ui::SwaggerUi;

use crate::config::CorsConfig;
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Photo Feed Service API",
        version = "1.0.0",
        description = "Cursor-paginated photo feed with likes, owner-only deletion, and \
            write-once blob uploads. Identity is an opaque client-generated token passed \
            in the X-User-Id header."
    ),
    paths(
        handlers::photo::create_photo,
        handlers::photo::list_feed,
        handlers::photo::list_user_photos,
        handlers::photo::toggle_like,
        handlers::photo::delete_photo,
        handlers::upload::create_upload_target,
        handlers::upload::upload_blob,
        handlers::upload::fetch_blob,
        handlers::user::upsert_profile,
        handlers::user::get_profile,
    ),
    components(schemas(
        error::ErrorBody,
        models::photo::CreatePhotoRequest,
        models::photo::PhotoResponse,
        models::photo::FeedResponse,
        models::photo::UserPhotosResponse,
        models::photo::ToggleLikeResponse,
        models::upload::UploadTargetResponse,
        models::upload::BlobUploadResponse,
        models::user::UpsertProfileRequest,
        models::user::ProfileResponse,
    )),
    tags(
        (name = "Photos", description = "Feed, likes, and photo lifecycle"),
        (name = "Uploads", description = "Write-once blob upload targets"),
        (name = "Users", description = "Display profiles for identity tokens"),
    ),
)]
struct ApiDoc;

/// Build the application router.
pub fn build_router(state: AppState) -> axum::Router {
    let api = ApiDoc::openapi();
    let cors = cors_layer(&state.config.server.cors);

    axum::Router::new()
        .nest("/api", routes::api_routes())
        .with_state(state)
        .layer(cors)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", api.clone()))
        .merge(Scalar::with_url("/scalar", api))
}

fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods(Any)
        .allow_headers(Any)
        .max_age(Duration::from_secs(config.max_age));

    if config.allow_origins.is_empty() {
        layer.allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> = config
            .allow_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();
        layer.allow_origin(origins)
    }
}
