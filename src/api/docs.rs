//! OpenAPI document.

use utoipa::OpenApi;

use super::handlers;

/// OpenAPI description of the HTTP API.
#[derive(OpenApi)]
#[openapi(
    info(title = "Surebet Scanner API", description = "Surebet detection and stake calculator"),
    paths(
        handlers::health,
        handlers::ready,
        handlers::status,
        handlers::opportunities,
        handlers::calculate,
        handlers::scan,
        handlers::metrics,
    ),
    tags(
        (name = "health", description = "Liveness, readiness and metrics"),
        (name = "scanner", description = "Poll loop output"),
        (name = "engine", description = "On-demand calculation")
    )
)]
pub struct ApiDoc;
