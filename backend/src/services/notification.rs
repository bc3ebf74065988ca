//! Notification service: outbox recording and best-effort dispatch
//!
//! Domain events are recorded as rows inside the same transaction as the
//! ledger or workflow mutation that produced them, so a rolled-back mutation
//! never leaves a notification behind. Dispatch runs afterwards and may fail
//! or be retried without touching the originating mutation.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

use shared::{Notification, NotificationKind, Recipient};

use crate::error::{AppError, AppResult};

/// Notification service
#[derive(Clone)]
pub struct NotificationService {
    db: PgPool,
}

/// A domain event about to be recorded in the outbox
#[derive(Debug, Clone)]
pub struct OutboxEvent {
    pub recipient: Recipient,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub product_id: Option<Uuid>,
    pub request_id: Option<Uuid>,
    pub created_by: Option<Uuid>,
}

/// Feed filters
#[derive(Debug, Default, Deserialize)]
pub struct NotificationFilter {
    pub kind: Option<NotificationKind>,
    pub unread_only: Option<bool>,
    pub limit: Option<i64>,
}

#[derive(Debug, FromRow)]
struct NotificationRow {
    id: Uuid,
    recipient_branch_id: Option<Uuid>,
    kind: String,
    title: String,
    message: String,
    product_id: Option<Uuid>,
    request_id: Option<Uuid>,
    is_urgent: bool,
    is_read: bool,
    read_at: Option<DateTime<Utc>>,
    created_by: Option<Uuid>,
    created_at: DateTime<Utc>,
    dispatched_at: Option<DateTime<Utc>>,
}

impl NotificationRow {
    fn into_model(self) -> AppResult<Notification> {
        let kind = NotificationKind::from_str(&self.kind)
            .map_err(|e| AppError::InternalError(anyhow::anyhow!("{}: {}", e, self.kind)))?;
        Ok(Notification {
            id: self.id,
            recipient: Recipient::from_branch_column(self.recipient_branch_id),
            kind,
            title: self.title,
            message: self.message,
            product_id: self.product_id,
            request_id: self.request_id,
            is_urgent: self.is_urgent,
            is_read: self.is_read,
            read_at: self.read_at,
            created_by: self.created_by,
            created_at: self.created_at,
            dispatched_at: self.dispatched_at,
        })
    }
}

const NOTIFICATION_COLUMNS: &str = "id, recipient_branch_id, kind, title, message, product_id, \
     request_id, is_urgent, is_read, read_at, created_by, created_at, dispatched_at";

impl NotificationService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Record an event in the outbox inside the caller's transaction.
    pub async fn enqueue(
        tx: &mut Transaction<'_, Postgres>,
        event: OutboxEvent,
    ) -> AppResult<Uuid> {
        let id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO notifications (
                recipient_branch_id, kind, title, message, product_id,
                request_id, is_urgent, created_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id
            "#,
        )
        .bind(event.recipient.branch_column())
        .bind(event.kind.as_str())
        .bind(&event.title)
        .bind(&event.message)
        .bind(event.product_id)
        .bind(event.request_id)
        .bind(event.kind.is_urgent())
        .bind(event.created_by)
        .fetch_one(&mut **tx)
        .await?;

        Ok(id)
    }

    /// Best-effort delivery of undispatched events. Emits each one to the
    /// delivery channel (the structured log stream here) and stamps it; a
    /// failure leaves the row undispatched for the next attempt.
    pub async fn dispatch_pending(&self, limit: i64) -> AppResult<u64> {
        let rows = sqlx::query_as::<_, NotificationRow>(&format!(
            "SELECT {NOTIFICATION_COLUMNS} FROM notifications \
             WHERE dispatched_at IS NULL ORDER BY created_at LIMIT $1"
        ))
        .bind(limit)
        .fetch_all(&self.db)
        .await?;

        let mut dispatched = 0;
        for row in rows {
            let notification = row.into_model()?;
            tracing::info!(
                notification_id = %notification.id,
                kind = notification.kind.as_str(),
                recipient = ?notification.recipient,
                title = %notification.title,
                "dispatching notification"
            );
            let result = sqlx::query(
                "UPDATE notifications SET dispatched_at = now() \
                 WHERE id = $1 AND dispatched_at IS NULL",
            )
            .bind(notification.id)
            .execute(&self.db)
            .await?;
            dispatched += result.rows_affected();
        }

        Ok(dispatched)
    }

    /// List a recipient's feed, newest first
    pub async fn list(
        &self,
        recipient: Recipient,
        filter: NotificationFilter,
    ) -> AppResult<Vec<Notification>> {
        let limit = filter.limit.unwrap_or(100).clamp(1, 500);
        let rows = sqlx::query_as::<_, NotificationRow>(&format!(
            r#"
            SELECT {NOTIFICATION_COLUMNS} FROM notifications
            WHERE recipient_branch_id IS NOT DISTINCT FROM $1
              AND ($2::text IS NULL OR kind = $2)
              AND (NOT $3 OR is_read = false)
            ORDER BY created_at DESC
            LIMIT $4
            "#
        ))
        .bind(recipient.branch_column())
        .bind(filter.kind.map(|k| k.as_str()))
        .bind(filter.unread_only.unwrap_or(false))
        .bind(limit)
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(NotificationRow::into_model).collect()
    }

    /// Unread count for a recipient
    pub async fn unread_count(&self, recipient: Recipient) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM notifications \
             WHERE recipient_branch_id IS NOT DISTINCT FROM $1 AND is_read = false",
        )
        .bind(recipient.branch_column())
        .fetch_one(&self.db)
        .await?;
        Ok(count)
    }

    /// Mark one notification read. Idempotent: `read_at` keeps the timestamp
    /// of the first call.
    pub async fn mark_read(&self, recipient: Recipient, id: Uuid) -> AppResult<()> {
        let result = sqlx::query(
            "UPDATE notifications \
             SET is_read = true, read_at = COALESCE(read_at, now()) \
             WHERE id = $1 AND recipient_branch_id IS NOT DISTINCT FROM $2",
        )
        .bind(id)
        .bind(recipient.branch_column())
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Notification".to_string()));
        }
        Ok(())
    }

    /// Mark a recipient's whole feed read; returns how many were unread
    pub async fn mark_all_read(&self, recipient: Recipient) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE notifications \
             SET is_read = true, read_at = COALESCE(read_at, now()) \
             WHERE recipient_branch_id IS NOT DISTINCT FROM $1 AND is_read = false",
        )
        .bind(recipient.branch_column())
        .execute(&self.db)
        .await?;
        Ok(result.rows_affected())
    }
}

/// Low-stock alert for a location that dropped to or below the threshold
pub fn low_stock_event(
    recipient: Recipient,
    product_id: Uuid,
    product_name: &str,
    location_name: &str,
    remaining: i64,
) -> OutboxEvent {
    OutboxEvent {
        recipient,
        kind: NotificationKind::LowStock,
        title: format!("Low stock alert - {}", product_name),
        message: format!(
            "Remaining quantity of '{}' at {}: {}. Please reorder or restock.",
            product_name, location_name, remaining
        ),
        product_id: Some(product_id),
        request_id: None,
        created_by: None,
    }
}

/// Event announcing a newly created request to its source
pub fn request_created_event(
    recipient: Recipient,
    request_id: Uuid,
    product_id: Uuid,
    product_name: &str,
    quantity: i64,
    requesting_branch_name: &str,
    created_by: Uuid,
) -> OutboxEvent {
    OutboxEvent {
        recipient,
        kind: NotificationKind::RequestCreated,
        title: format!("New product request - {}", product_name),
        message: format!(
            "Branch '{}' requested {} x '{}'.",
            requesting_branch_name, quantity, product_name
        ),
        product_id: Some(product_id),
        request_id: Some(request_id),
        created_by: Some(created_by),
    }
}

/// Event informing the requesting branch of a status change
pub fn request_status_event(
    kind: NotificationKind,
    recipient: Recipient,
    request_id: Uuid,
    product_id: Uuid,
    product_name: &str,
    quantity: i64,
    responded_by: Uuid,
) -> OutboxEvent {
    let status_label = match kind {
        NotificationKind::RequestAccepted => "accepted",
        NotificationKind::RequestRejected => "rejected",
        NotificationKind::RequestDelivered => "delivered",
        _ => "updated",
    };
    OutboxEvent {
        recipient,
        kind,
        title: format!("Request {} - {}", status_label, product_name),
        message: format!(
            "Your request for {} x '{}' was {}.",
            quantity, product_name, status_label
        ),
        product_id: Some(product_id),
        request_id: Some(request_id),
        created_by: Some(responded_by),
    }
}
