use axum::routing::get;
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::handlers;
use crate::state::AppState;

pub fn routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .nest("/auth", auth_routes())
        .nest("/posts", post_routes())
        .nest("/files", file_routes())
        .nest("/feed", feed_routes())
}

fn auth_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::auth::signup))
        .routes(routes!(handlers::auth::login))
        .routes(routes!(
            handlers::auth::get_status,
            handlers::auth::update_status
        ))
}

fn post_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            handlers::post::list_posts,
            handlers::post::create_post
        ))
        .routes(routes!(
            handlers::post::get_post,
            handlers::post::update_post,
            handlers::post::delete_post
        ))
        .layer(handlers::post::post_body_limit())
}

fn file_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().routes(routes!(handlers::files::download_file))
}

fn feed_routes() -> OpenApiRouter<AppState> {
    // Websocket endpoint; not part of the OpenAPI surface.
    OpenApiRouter::new().route("/ws", get(handlers::feed::feed_ws))
}
