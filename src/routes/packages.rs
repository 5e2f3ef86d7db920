use axum::extract::State;
use axum::Json;

use crate::app::AppState;
use crate::errors::AppResult;
use crate::models::package::{DecisionResponse, PackageCheckRequest};

#[utoipa::path(
    post,
    path = "/packages/access",
    tag = "Packages",
    request_body = PackageCheckRequest,
    responses(
        (status = 200, description = "Granted, or not handled when `allowed` is false", body = DecisionResponse),
        (status = 400, description = "Package name cannot be mapped to a project"),
        (status = 403, description = "Read access denied"),
        (status = 404, description = "No matching GitLab project or user")
    )
)]
pub async fn allow_access(
    State(state): State<AppState>,
    Json(payload): Json<PackageCheckRequest>,
) -> AppResult<Json<DecisionResponse>> {
    let allowed = state.plugin.allow_access(&payload.user, &payload.package).await?;
    Ok(Json(DecisionResponse { allowed }))
}

#[utoipa::path(
    post,
    path = "/packages/publish",
    tag = "Packages",
    request_body = PackageCheckRequest,
    responses(
        (status = 200, description = "Granted, or not handled when `allowed` is false", body = DecisionResponse),
        (status = 400, description = "Package name cannot be mapped to a project"),
        (status = 403, description = "Publish denied"),
        (status = 404, description = "No matching GitLab project or user")
    )
)]
pub async fn allow_publish(
    State(state): State<AppState>,
    Json(payload): Json<PackageCheckRequest>,
) -> AppResult<Json<DecisionResponse>> {
    let allowed = state.plugin.allow_publish(&payload.user, &payload.package).await?;
    Ok(Json(DecisionResponse { allowed }))
}
