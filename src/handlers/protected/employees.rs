use axum::extract::State;
use uuid::Uuid;

use super::ListParams;
use crate::auth::Principal;
use crate::database::models::{Employee, CreateEmployee, UpdateEmployee};
use crate::middleware::{ApiJson, ApiPath, ApiQuery, ApiResponse, ApiResult};
use crate::services::RequestContext;
use crate::state::AppState;

/// GET /api/v1/employees - List employees visible to the caller
pub async fn list(
    State(state): State<AppState>,
    principal: Principal,
    ctx: RequestContext,
    ApiQuery(params): ApiQuery<ListParams>,
) -> ApiResult<Vec<Employee>> {
    let records = state.services.employees.list(&ctx, &principal, &params.into()).await?;
    Ok(ApiResponse::success(records))
}

/// POST /api/v1/employees - Manager-only; the employee code is generated
pub async fn create(
    State(state): State<AppState>,
    principal: Principal,
    ctx: RequestContext,
    ApiJson(input): ApiJson<CreateEmployee>,
) -> ApiResult<Employee> {
    let record = state.services.employees.create(&ctx, &principal, input).await?;
    Ok(ApiResponse::created(record))
}

/// GET /api/v1/employees/:id
pub async fn get(
    State(state): State<AppState>,
    principal: Principal,
    ctx: RequestContext,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Employee> {
    let record = state.services.employees.get(&ctx, &principal, id).await?;
    Ok(ApiResponse::success(record))
}

/// PUT /api/v1/employees/:id - Partial update; omitted fields keep their values
pub async fn update(
    State(state): State<AppState>,
    principal: Principal,
    ctx: RequestContext,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(changes): ApiJson<UpdateEmployee>,
) -> ApiResult<Employee> {
    let record = state.services.employees.update(&ctx, &principal, id, changes).await?;
    Ok(ApiResponse::success(record))
}

/// DELETE /api/v1/employees/:id - Soft delete
pub async fn delete(
    State(state): State<AppState>,
    principal: Principal,
    ctx: RequestContext,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<()> {
    state.services.employees.delete(&ctx, &principal, id).await?;
    Ok(ApiResponse::no_content())
}
