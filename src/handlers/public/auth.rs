use crate::database::models::{LoginRequest, RegisterUser};
use crate::middleware::{ApiJson, ApiResponse, ApiResult};
use crate::services::{AuthSession, RequestContext};
use crate::state::AppState;
use axum::extract::State;

/// POST /api/v1/auth/register - Create a client account and receive a token
///
/// Expected input:
/// ```json
/// { "email": "ana@mail.pt", "password": "at-least-8", "first_name": "Ana", "last_name": "Silva" }
/// ```
///
/// Output is 201 with `{ "token", "expires_at", "user" }`.
pub async fn register(
    State(state): State<AppState>,
    ctx: RequestContext,
    ApiJson(input): ApiJson<RegisterUser>,
) -> ApiResult<AuthSession> {
    let session = state.services.auth.register(&ctx, input).await?;
    Ok(ApiResponse::created(session))
}

/// POST /api/v1/auth/login - Exchange email and password for a token
pub async fn login(
    State(state): State<AppState>,
    ctx: RequestContext,
    ApiJson(input): ApiJson<LoginRequest>,
) -> ApiResult<AuthSession> {
    let session = state.services.auth.login(&ctx, input).await?;
    Ok(ApiResponse::success(session))
}
