use axum::extract::State;
use uuid::Uuid;

use super::ListParams;
use crate::auth::Principal;
use crate::database::models::{Appointment, CreateAppointment, UpdateAppointment};
use crate::middleware::{ApiJson, ApiPath, ApiQuery, ApiResponse, ApiResult};
use crate::services::RequestContext;
use crate::state::AppState;

/// GET /api/v1/appointments - List appointments visible to the caller
pub async fn list(
    State(state): State<AppState>,
    principal: Principal,
    ctx: RequestContext,
    ApiQuery(params): ApiQuery<ListParams>,
) -> ApiResult<Vec<Appointment>> {
    let records = state.services.appointments.list(&ctx, &principal, &params.into()).await?;
    Ok(ApiResponse::success(records))
}

/// POST /api/v1/appointments - Book a slot; the car must belong to the customer
pub async fn create(
    State(state): State<AppState>,
    principal: Principal,
    ctx: RequestContext,
    ApiJson(input): ApiJson<CreateAppointment>,
) -> ApiResult<Appointment> {
    let record = state.services.appointments.create(&ctx, &principal, input).await?;
    Ok(ApiResponse::created(record))
}

pub async fn get(
    State(state): State<AppState>,
    principal: Principal,
    ctx: RequestContext,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Appointment> {
    let record = state.services.appointments.get(&ctx, &principal, id).await?;
    Ok(ApiResponse::success(record))
}

/// PUT /api/v1/appointments/:id - Partial update; omitted fields keep their values
pub async fn update(
    State(state): State<AppState>,
    principal: Principal,
    ctx: RequestContext,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(changes): ApiJson<UpdateAppointment>,
) -> ApiResult<Appointment> {
    let record = state.services.appointments.update(&ctx, &principal, id, changes).await?;
    Ok(ApiResponse::success(record))
}

pub async fn delete(
    State(state): State<AppState>,
    principal: Principal,
    ctx: RequestContext,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<()> {
    state.services.appointments.delete(&ctx, &principal, id).await?;
    Ok(ApiResponse::no_content())
}
