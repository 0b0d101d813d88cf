pub mod health;
pub mod orders;

use axum::Router;
use tower_http::trace::TraceLayer;
use utoipa::openapi::{InfoBuilder, OpenApi};
use utoipa_axum::router::OpenApiRouter;
use utoipa_swagger_ui::SwaggerUi;

use crate::{app_error::AppError, app_state::AppState};

/// Every route of the service, mounted under `/v1`, with its OpenAPI spec.
pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().nest(
        "/v1",
        orders::routes_with_openapi().merge(health::routes_with_openapi()),
    )
}

/// Builds the full application: API routes, Swagger UI, 404 fallback and
/// request tracing.
pub fn app(state: AppState) -> Router {
    let (router, mut openapi) = routes_with_openapi().split_for_parts();
    openapi.info = InfoBuilder::new()
        .title("Food OrderService API")
        .version("1.0.0")
        .build();

    router
        .merge(create_swagger_ui(openapi))
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn create_swagger_ui(openapi: OpenApi) -> SwaggerUi {
    SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi)
}

async fn not_found() -> AppError {
    AppError::NotFound("Endpoint not found".into())
}
