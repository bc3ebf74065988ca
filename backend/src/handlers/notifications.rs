//! HTTP handlers for the notification feed

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared::{Actor, Notification, NotificationKind, Recipient};

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::authz::{authorize, StockAction};
use crate::services::notification::NotificationFilter;
use crate::services::NotificationService;
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct FeedParams {
    /// Admins may read another branch's feed; branch users always see their
    /// own
    pub branch_id: Option<Uuid>,
    pub kind: Option<NotificationKind>,
    pub unread_only: Option<bool>,
    pub limit: Option<i64>,
}

impl FeedParams {
    fn into_filter(self) -> NotificationFilter {
        NotificationFilter {
            kind: self.kind,
            unread_only: self.unread_only,
            limit: self.limit,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UnreadCountResponse {
    pub unread: i64,
}

/// Resolve which feed the actor is asking for and check access
fn resolve_recipient(actor: &Actor, requested: Option<Uuid>) -> AppResult<Recipient> {
    let recipient = match (requested, actor.branch_id) {
        (Some(branch_id), _) => Recipient::Branch(branch_id),
        (None, Some(branch_id)) => Recipient::Branch(branch_id),
        (None, None) => Recipient::Admins,
    };
    authorize(actor, StockAction::ReadNotifications { recipient })?;
    Ok(recipient)
}

/// List a recipient's notifications, newest first
pub async fn list_notifications(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(params): Query<FeedParams>,
) -> AppResult<Json<Vec<Notification>>> {
    let recipient = resolve_recipient(&current_user.0, params.branch_id)?;
    let service = NotificationService::new(state.db);
    let notifications = service.list(recipient, params.into_filter()).await?;
    Ok(Json(notifications))
}

/// Unread count for the actor's feed
pub async fn get_unread_count(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(params): Query<FeedParams>,
) -> AppResult<Json<UnreadCountResponse>> {
    let recipient = resolve_recipient(&current_user.0, params.branch_id)?;
    let service = NotificationService::new(state.db);
    let unread = service.unread_count(recipient).await?;
    Ok(Json(UnreadCountResponse { unread }))
}

/// Mark one notification read (idempotent)
pub async fn mark_notification_read(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(notification_id): Path<Uuid>,
) -> AppResult<Json<serde_json::Value>> {
    let recipient = resolve_recipient(&current_user.0, None)?;
    let service = NotificationService::new(state.db);
    service.mark_read(recipient, notification_id).await?;
    Ok(Json(serde_json::json!({ "success": true })))
}

/// Mark the whole feed read
pub async fn mark_all_notifications_read(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<serde_json::Value>> {
    let recipient = resolve_recipient(&current_user.0, None)?;
    let service = NotificationService::new(state.db);
    let updated = service.mark_all_read(recipient).await?;
    Ok(Json(serde_json::json!({ "success": true, "updated": updated })))
}
