//! HTTP handlers for the movement ledger

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared::{Location, MovementDraft, MovementEvent, MovementKind, Shift};

use crate::error::{AppError, AppResult};
use crate::middleware::CurrentUser;
use crate::services::ledger::{LedgerService, MovementFilter};
use crate::services::ReversalService;
use crate::AppState;

/// A batch of movement lines to append atomically
#[derive(Debug, Deserialize)]
pub struct MovementBatchInput {
    pub lines: Vec<MovementDraft>,
}

#[derive(Debug, Serialize)]
pub struct MovementBatchResponse {
    pub movement_ids: Vec<Uuid>,
}

/// Query-string form of the ledger filters; locations arrive as a
/// `(type, id)` pair
#[derive(Debug, Default, Deserialize)]
pub struct MovementQueryParams {
    pub product_id: Option<Uuid>,
    pub location_type: Option<String>,
    pub location_id: Option<Uuid>,
    pub kind: Option<MovementKind>,
    pub date_from: Option<DateTime<Utc>>,
    pub date_to: Option<DateTime<Utc>>,
    pub actor_id: Option<Uuid>,
    pub shift: Option<Shift>,
    pub quantity_less_than: Option<i64>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl MovementQueryParams {
    fn into_filter(self) -> AppResult<MovementFilter> {
        let location = match self.location_type {
            Some(kind) => Some(
                Location::from_parts(&kind, self.location_id)
                    .map_err(|e| AppError::Validation(e.to_string()))?,
            ),
            None => None,
        };
        Ok(MovementFilter {
            product_id: self.product_id,
            location,
            kind: self.kind,
            date_from: self.date_from,
            date_to: self.date_to,
            actor_id: self.actor_id,
            shift: self.shift,
            quantity_less_than: self.quantity_less_than,
            limit: self.limit,
            offset: self.offset,
        })
    }
}

/// Append a movement batch; all lines commit or none do
pub async fn post_movement_batch(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<MovementBatchInput>,
) -> AppResult<Json<MovementBatchResponse>> {
    let service = LedgerService::new(state.db, state.config.stock.low_stock_threshold);
    let movement_ids = service.append_batch(&current_user.0, &input.lines).await?;
    Ok(Json(MovementBatchResponse { movement_ids }))
}

/// Audit query over the ledger
pub async fn list_movements(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(params): Query<MovementQueryParams>,
) -> AppResult<Json<Vec<MovementEvent>>> {
    let service = LedgerService::new(state.db, state.config.stock.low_stock_threshold);
    let movements = service.query(params.into_filter()?).await?;
    Ok(Json(movements))
}

/// Reverse (delete with inverse effect) a recent movement
pub async fn reverse_movement(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(movement_id): Path<Uuid>,
) -> AppResult<Json<MovementEvent>> {
    let service = ReversalService::new(state.db, state.config.stock.reversal_window_hours);
    let reversed = service
        .reverse(&current_user.0, movement_id, Utc::now())
        .await?;
    Ok(Json(reversed))
}
