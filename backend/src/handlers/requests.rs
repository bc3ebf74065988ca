//! HTTP handlers for the transfer request workflow

use axum::{
    extract::{Path, Query, State},
    Json,
};
use uuid::Uuid;

use shared::TransferRequest;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::requests::{CreateRequestInput, RequestFilter, RespondInput};
use crate::services::RequestService;
use crate::AppState;

/// Open a new transfer request
pub async fn create_request(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateRequestInput>,
) -> AppResult<Json<TransferRequest>> {
    let service = RequestService::new(state.db);
    let request = service.create(&current_user.0, input).await?;
    Ok(Json(request))
}

/// List transfer requests
pub async fn list_requests(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(filter): Query<RequestFilter>,
) -> AppResult<Json<Vec<TransferRequest>>> {
    let service = RequestService::new(state.db);
    let requests = service.list(filter).await?;
    Ok(Json(requests))
}

/// Fetch one request
pub async fn get_request(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(request_id): Path<Uuid>,
) -> AppResult<Json<TransferRequest>> {
    let service = RequestService::new(state.db);
    let request = service.get(request_id).await?;
    Ok(Json(request))
}

/// Accept, reject, deliver or cancel a request
pub async fn respond_to_request(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(request_id): Path<Uuid>,
    Json(input): Json<RespondInput>,
) -> AppResult<Json<TransferRequest>> {
    let service = RequestService::new(state.db);
    let request = service.respond(&current_user.0, request_id, input).await?;
    Ok(Json(request))
}
