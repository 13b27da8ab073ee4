use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::config::AppConfig;
use crate::handlers;
use crate::state::AppState;

pub fn routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .nest("/auth", auth_routes())
        .nest("/image", image_routes(config))
        .nest("/admin", admin_routes())
}

fn auth_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::auth::github_login))
        .routes(routes!(handlers::auth::github_callback))
        .routes(routes!(handlers::auth::me))
}

fn image_routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    let upload = OpenApiRouter::new()
        .routes(routes!(handlers::image::upload_image))
        .layer(handlers::image::upload_body_limit(config.upload.max_size));

    OpenApiRouter::new()
        .routes(routes!(handlers::image::list_images))
        .routes(routes!(
            handlers::image::get_image,
            handlers::image::delete_image
        ))
        .merge(upload)
}

fn admin_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::admin::list_images))
        .routes(routes!(handlers::admin::stats))
}
