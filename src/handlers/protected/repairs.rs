use axum::extract::State;
use uuid::Uuid;

use super::ListParams;
use crate::auth::Principal;
use crate::database::models::{Repair, CreateRepair, UpdateRepair};
use crate::middleware::{ApiJson, ApiPath, ApiQuery, ApiResponse, ApiResult};
use crate::services::RequestContext;
use crate::state::AppState;

/// GET /api/v1/repairs - List repairs visible to the caller, `car_id` narrows to one car
pub async fn list(
    State(state): State<AppState>,
    principal: Principal,
    ctx: RequestContext,
    ApiQuery(params): ApiQuery<ListParams>,
) -> ApiResult<Vec<Repair>> {
    let records = state.services.repairs.list(&ctx, &principal, &params.into()).await?;
    Ok(ApiResponse::success(records))
}

/// POST /api/v1/repairs
pub async fn create(
    State(state): State<AppState>,
    principal: Principal,
    ctx: RequestContext,
    ApiJson(input): ApiJson<CreateRepair>,
) -> ApiResult<Repair> {
    let record = state.services.repairs.create(&ctx, &principal, input).await?;
    Ok(ApiResponse::created(record))
}

/// GET /api/v1/repairs/:id
pub async fn get(
    State(state): State<AppState>,
    principal: Principal,
    ctx: RequestContext,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Repair> {
    let record = state.services.repairs.get(&ctx, &principal, id).await?;
    Ok(ApiResponse::success(record))
}

/// PUT /api/v1/repairs/:id - Partial update; omitted fields keep their values
pub async fn update(
    State(state): State<AppState>,
    principal: Principal,
    ctx: RequestContext,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(changes): ApiJson<UpdateRepair>,
) -> ApiResult<Repair> {
    let record = state.services.repairs.update(&ctx, &principal, id, changes).await?;
    Ok(ApiResponse::success(record))
}

/// DELETE /api/v1/repairs/:id - Soft delete
pub async fn delete(
    State(state): State<AppState>,
    principal: Principal,
    ctx: RequestContext,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<()> {
    state.services.repairs.delete(&ctx, &principal, id).await?;
    Ok(ApiResponse::no_content())
}
