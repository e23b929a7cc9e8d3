use axum::{
    Router,
    routing::{delete, get, post, put},
};

use crate::handlers;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/photos", photo_routes())
        .nest("/uploads", upload_routes())
        .nest("/users", user_routes())
}

fn photo_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::photo::list_feed).post(handlers::photo::create_photo),
        )
        .route("/{id}", delete(handlers::photo::delete_photo))
        .route("/{id}/like", post(handlers::photo::toggle_like))
}

fn upload_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(handlers::upload::create_upload_target))
        .route(
            "/{storage_id}",
            put(handlers::upload::upload_blob).get(handlers::upload::fetch_blob),
        )
        .layer(handlers::upload::blob_upload_body_limit())
}

fn user_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/{user_id}",
            get(handlers::user::get_profile).put(handlers::user::upsert_profile),
        )
        .route("/{user_id}/photos", get(handlers::photo::list_user_photos))
}
