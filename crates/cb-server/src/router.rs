use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handler;
use crate::state::AppState;

/// Build the axum router with all board endpoints.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/v1/health", get(handler::health_handler))
        .route("/v1/users", post(handler::create_user))
        .route(
            "/v1/users/:username",
            get(handler::get_user).patch(handler::update_user_profile),
        )
        .route("/v1/users/:username/saved/:post_id", post(handler::toggle_saved_post))
        .route("/v1/communities", post(handler::create_community))
        .route(
            "/v1/communities/:name",
            get(handler::get_community).patch(handler::update_community),
        )
        .route("/v1/communities/:name/join", post(handler::join_community))
        .route("/v1/communities/:name/leave", post(handler::leave_community))
        .route("/v1/posts", get(handler::list_posts).post(handler::create_post))
        .route("/v1/posts/:id", get(handler::get_post).delete(handler::delete_post))
        .route("/v1/posts/:id/vote", post(handler::vote_post))
        .route(
            "/v1/posts/:id/comments",
            get(handler::list_comments).post(handler::add_comment),
        )
        .route(
            "/v1/admin/retention",
            get(handler::get_retention_config).put(handler::set_retention_config),
        )
        .route("/v1/admin/retention/run", post(handler::run_retention))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
