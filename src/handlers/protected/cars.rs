use axum::extract::State;
use uuid::Uuid;

use super::ListParams;
use crate::auth::Principal;
use crate::database::models::{Car, CreateCar, Repair, UpdateCar};
use crate::middleware::{ApiJson, ApiPath, ApiQuery, ApiResponse, ApiResult};
use crate::services::RequestContext;
use crate::state::AppState;

/// GET /api/v1/cars - List cars visible to the caller
pub async fn list(
    State(state): State<AppState>,
    principal: Principal,
    ctx: RequestContext,
    ApiQuery(params): ApiQuery<ListParams>,
) -> ApiResult<Vec<Car>> {
    let records = state.services.cars.list(&ctx, &principal, &params.into()).await?;
    Ok(ApiResponse::success(records))
}

/// POST /api/v1/cars - Clients register their own cars, staff must pass `owner_id`
pub async fn create(
    State(state): State<AppState>,
    principal: Principal,
    ctx: RequestContext,
    ApiJson(input): ApiJson<CreateCar>,
) -> ApiResult<Car> {
    let record = state.services.cars.create(&ctx, &principal, input).await?;
    Ok(ApiResponse::created(record))
}

/// GET /api/v1/cars/:id
pub async fn get(
    State(state): State<AppState>,
    principal: Principal,
    ctx: RequestContext,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Car> {
    let record = state.services.cars.get(&ctx, &principal, id).await?;
    Ok(ApiResponse::success(record))
}

/// PUT /api/v1/cars/:id - Partial update; omitted fields keep their values
pub async fn update(
    State(state): State<AppState>,
    principal: Principal,
    ctx: RequestContext,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(changes): ApiJson<UpdateCar>,
) -> ApiResult<Car> {
    let record = state.services.cars.update(&ctx, &principal, id, changes).await?;
    Ok(ApiResponse::success(record))
}

/// DELETE /api/v1/cars/:id - Soft delete
pub async fn delete(
    State(state): State<AppState>,
    principal: Principal,
    ctx: RequestContext,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<()> {
    state.services.cars.delete(&ctx, &principal, id).await?;
    Ok(ApiResponse::no_content())
}

/// GET /api/v1/cars/:id/repairs - Repair history of one car
pub async fn repairs(
    State(state): State<AppState>,
    principal: Principal,
    ctx: RequestContext,
    ApiPath(id): ApiPath<Uuid>,
    ApiQuery(params): ApiQuery<ListParams>,
) -> ApiResult<Vec<Repair>> {
    let records = state.services.cars.repairs(&ctx, &principal, id, &params.into()).await?;
    Ok(ApiResponse::success(records))
}
