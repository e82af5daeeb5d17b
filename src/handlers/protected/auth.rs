use axum::extract::State;

use crate::auth::Principal;
use crate::database::models::User;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::{AuthSession, RequestContext};
use crate::state::AppState;

/// GET /api/v1/auth/me - The account behind the current token
pub async fn me(State(state): State<AppState>, principal: Principal, ctx: RequestContext) -> ApiResult<User> {
    let user = state.services.auth.me(&ctx, &principal).await?;
    Ok(ApiResponse::success(user))
}

/// POST /api/v1/auth/refresh - A new token for the current principal
pub async fn refresh(State(state): State<AppState>, principal: Principal, ctx: RequestContext) -> ApiResult<AuthSession> {
    let session = state.services.auth.refresh(&ctx, &principal).await?;
    Ok(ApiResponse::success(session))
}
