use axum::extract::State;
use uuid::Uuid;

use super::ListParams;
use crate::auth::Principal;
use crate::database::models::{User, CreateUser, UpdateUser};
use crate::middleware::{ApiJson, ApiPath, ApiQuery, ApiResponse, ApiResult};
use crate::services::RequestContext;
use crate::state::AppState;

/// GET /api/v1/users - List accounts (managers and admins)
pub async fn list(
    State(state): State<AppState>,
    principal: Principal,
    ctx: RequestContext,
    ApiQuery(params): ApiQuery<ListParams>,
) -> ApiResult<Vec<User>> {
    let records = state.services.users.list(&ctx, &principal, &params.into()).await?;
    Ok(ApiResponse::success(records))
}

/// POST /api/v1/users
pub async fn create(
    State(state): State<AppState>,
    principal: Principal,
    ctx: RequestContext,
    ApiJson(input): ApiJson<CreateUser>,
) -> ApiResult<User> {
    let record = state.services.users.create(&ctx, &principal, input).await?;
    Ok(ApiResponse::created(record))
}

/// GET /api/v1/users/:id
pub async fn get(
    State(state): State<AppState>,
    principal: Principal,
    ctx: RequestContext,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<User> {
    let record = state.services.users.get(&ctx, &principal, id).await?;
    Ok(ApiResponse::success(record))
}

/// PUT /api/v1/users/:id - Role, active flag and email are manager-only
pub async fn update(
    State(state): State<AppState>,
    principal: Principal,
    ctx: RequestContext,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(changes): ApiJson<UpdateUser>,
) -> ApiResult<User> {
    let record = state.services.users.update(&ctx, &principal, id, changes).await?;
    Ok(ApiResponse::success(record))
}

/// DELETE /api/v1/users/:id - Soft delete
pub async fn delete(
    State(state): State<AppState>,
    principal: Principal,
    ctx: RequestContext,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<()> {
    state.services.users.delete(&ctx, &principal, id).await?;
    Ok(ApiResponse::no_content())
}
