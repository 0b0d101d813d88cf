use axum::Json;
use serde::Serialize;
use utoipa::ToSchema;
use utoipa_axum::router::OpenApiRouter;

use crate::app_state::AppState;

pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().routes(utoipa_axum::routes!(healthz))
}

#[derive(Serialize, ToSchema)]
struct HealthRes {
    status: &'static str,
}

/// Liveness probe.
#[utoipa::path(
    get,
    path = "/healthz",
    tags = ["Health"],
    responses(
        (status = 200, description = "Service is up", body = HealthRes)
    )
)]
async fn healthz() -> Json<HealthRes> {
    Json(HealthRes { status: "ok" })
}
