use axum::extract::State;
use uuid::Uuid;

use super::ListParams;
use crate::auth::Principal;
use crate::database::models::{Client, CreateClient, UpdateClient};
use crate::middleware::{ApiJson, ApiPath, ApiQuery, ApiResponse, ApiResult};
use crate::services::RequestContext;
use crate::state::AppState;

/// GET /api/v1/clients - List clients visible to the caller
pub async fn list(
    State(state): State<AppState>,
    principal: Principal,
    ctx: RequestContext,
    ApiQuery(params): ApiQuery<ListParams>,
) -> ApiResult<Vec<Client>> {
    let records = state.services.clients.list(&ctx, &principal, &params.into()).await?;
    Ok(ApiResponse::success(records))
}

/// POST /api/v1/clients
pub async fn create(
    State(state): State<AppState>,
    principal: Principal,
    ctx: RequestContext,
    ApiJson(input): ApiJson<CreateClient>,
) -> ApiResult<Client> {
    let record = state.services.clients.create(&ctx, &principal, input).await?;
    Ok(ApiResponse::created(record))
}

pub async fn get(
    State(state): State<AppState>,
    principal: Principal,
    ctx: RequestContext,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Client> {
    let record = state.services.clients.get(&ctx, &principal, id).await?;
    Ok(ApiResponse::success(record))
}

/// PUT /api/v1/clients/:id - Partial update; omitted fields keep their values
pub async fn update(
    State(state): State<AppState>,
    principal: Principal,
    ctx: RequestContext,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(changes): ApiJson<UpdateClient>,
) -> ApiResult<Client> {
    let record = state.services.clients.update(&ctx, &principal, id, changes).await?;
    Ok(ApiResponse::success(record))
}

/// DELETE /api/v1/clients/:id - Soft delete, managers only
pub async fn delete(
    State(state): State<AppState>,
    principal: Principal,
    ctx: RequestContext,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<()> {
    state.services.clients.delete(&ctx, &principal, id).await?;
    Ok(ApiResponse::no_content())
}
