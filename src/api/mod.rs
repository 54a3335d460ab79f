//! HTTP API server

use axum::{
    http::{header, Method},
    middleware,
    routing::{get, patch},
    Router,
};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub mod error;
pub mod extract;
pub mod handlers;
pub mod state;

pub use error::ApiError;
pub use state::AppState;

/// Build the API router using the provided application state
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/drinks",
            get(handlers::list_drinks).post(handlers::create_drink),
        )
        .route("/drinks-detail", get(handlers::list_drink_details))
        .route(
            "/drinks/:id",
            patch(handlers::patch_drink).delete(handlers::delete_drink),
        )
        .fallback(handlers::not_found)
        .layer(middleware::map_response(handlers::method_not_allowed))
        .layer(CatchPanicLayer::custom(handlers::panic_response))
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// All origins; bearer and JSON headers; the usual REST verbs
fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::PATCH,
            Method::OPTIONS,
        ])
}
