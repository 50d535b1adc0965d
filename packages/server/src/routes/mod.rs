mod v1;

use utoipa_axum::router::OpenApiRouter;

use crate::state::AppState;

/// All API routes, versioned under `/api/v1`.
pub fn api_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().nest("/v1", v1::routes())
}
