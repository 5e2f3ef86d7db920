use axum::extract::State;
use axum::Json;

use crate::app::AppState;
use crate::authz::AuthOutcome;
use crate::errors::{AppError, AppResult};
use crate::models::user::{AuthenticateResponse, CredentialsRequest};

#[utoipa::path(
    post,
    path = "/auth/authenticate",
    tag = "Auth",
    request_body = CredentialsRequest,
    responses(
        (status = 200, description = "Credentials accepted", body = AuthenticateResponse),
        (status = 401, description = "GitLab rejected the credentials"),
        (status = 404, description = "No GitLab account matches the login"),
        (status = 502, description = "GitLab unreachable")
    )
)]
pub async fn authenticate(
    State(state): State<AppState>,
    Json(payload): Json<CredentialsRequest>,
) -> AppResult<Json<AuthenticateResponse>> {
    let outcome = state.plugin.authenticate(&payload.username, &payload.password).await?;
    respond(outcome, &payload.username)
}

#[utoipa::path(
    post,
    path = "/auth/adduser",
    tag = "Auth",
    request_body = CredentialsRequest,
    responses(
        (status = 200, description = "Registration accepted", body = AuthenticateResponse),
        (status = 401, description = "GitLab rejected the credentials")
    )
)]
pub async fn adduser(
    State(state): State<AppState>,
    Json(payload): Json<CredentialsRequest>,
) -> AppResult<Json<AuthenticateResponse>> {
    let outcome = state.plugin.adduser(&payload.username, &payload.password).await?;
    respond(outcome, &payload.username)
}

fn respond(outcome: AuthOutcome, username: &str) -> AppResult<Json<AuthenticateResponse>> {
    match outcome {
        AuthOutcome::Authenticated(groups) => Ok(Json(AuthenticateResponse {
            authenticated: true,
            groups,
        })),
        AuthOutcome::Rejected => Err(AppError::authentication_failed(format!(
            "invalid credentials for {username}"
        ))),
    }
}
