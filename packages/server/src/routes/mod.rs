mod v1;

use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::config::AppConfig;
use crate::handlers;
use crate::state::AppState;

pub fn api_routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    OpenApiRouter::new().nest("/v1", v1::routes(config))
}

/// Unauthenticated byte-stream proxy, mounted at the root.
pub fn proxy_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().nest(
        "/proxy",
        OpenApiRouter::new().routes(routes!(handlers::proxy::proxy_image)),
    )
}
