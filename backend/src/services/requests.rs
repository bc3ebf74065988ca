//! Transfer request workflow
//!
//! Explicit finite-state machine over inter-branch product requests. The
//! transition table lives in the shared crate; this service enforces it
//! against stored rows, composes the Accept transition with the transfer
//! movement it posts, and records the notification event for every
//! transition in the same transaction.

use chrono::Utc;
use serde::Deserialize;
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

use shared::{
    validate_quantity, validate_request_source, Actor, Location, NotificationKind, Recipient,
    RequestAction, RequestStatus, Shift, TransferRequest,
};

use crate::error::{AppError, AppResult};
use crate::services::authz::{authorize, StockAction};
use crate::services::notification::{
    request_created_event, request_status_event, NotificationService,
};
use crate::services::stock::derived_quantity_on;

/// Transfer request workflow service
#[derive(Clone)]
pub struct RequestService {
    db: PgPool,
}

/// Input for opening a request
#[derive(Debug, Deserialize)]
pub struct CreateRequestInput {
    pub requesting_branch_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i64,
    pub source: Location,
    pub notes: Option<String>,
}

/// Input for responding to a request
#[derive(Debug, Deserialize)]
pub struct RespondInput {
    pub action: RequestAction,
    pub notes: Option<String>,
}

/// Listing filters
#[derive(Debug, Default, Deserialize)]
pub struct RequestFilter {
    /// Requests opened by this branch
    pub requesting_branch_id: Option<Uuid>,
    /// Requests drawing from this branch
    pub source_branch_id: Option<Uuid>,
    pub status: Option<RequestStatus>,
}

#[derive(Debug, FromRow)]
struct RequestRow {
    id: Uuid,
    requesting_branch_id: Uuid,
    product_id: Uuid,
    quantity: i64,
    source_type: String,
    source_id: Option<Uuid>,
    status: String,
    requested_by: Uuid,
    requested_at: chrono::DateTime<Utc>,
    responded_by: Option<Uuid>,
    responded_at: Option<chrono::DateTime<Utc>>,
    request_notes: Option<String>,
    response_notes: Option<String>,
}

impl RequestRow {
    fn into_model(self) -> AppResult<TransferRequest> {
        let invalid = |e: &'static str| AppError::InternalError(anyhow::anyhow!(e));
        Ok(TransferRequest {
            id: self.id,
            requesting_branch_id: self.requesting_branch_id,
            product_id: self.product_id,
            quantity: self.quantity,
            source: Location::from_parts(&self.source_type, self.source_id).map_err(invalid)?,
            status: RequestStatus::from_str(&self.status).map_err(invalid)?,
            requested_by: self.requested_by,
            requested_at: self.requested_at,
            responded_by: self.responded_by,
            responded_at: self.responded_at,
            request_notes: self.request_notes,
            response_notes: self.response_notes,
        })
    }
}

const REQUEST_COLUMNS: &str = "id, requesting_branch_id, product_id, quantity, source_type, \
     source_id, status, requested_by, requested_at, responded_by, responded_at, \
     request_notes, response_notes";

impl RequestService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Open a new request in `Pending` and announce it to the source.
    pub async fn create(
        &self,
        actor: &Actor,
        input: CreateRequestInput,
    ) -> AppResult<TransferRequest> {
        authorize(
            actor,
            StockAction::CreateRequest {
                branch_id: input.requesting_branch_id,
            },
        )?;

        validate_quantity(input.quantity).map_err(|msg| AppError::InvalidQuantity {
            message: msg.to_string(),
            line: None,
        })?;
        validate_request_source(input.source).map_err(|msg| AppError::Validation(msg.to_string()))?;
        if input.source.branch_id() == Some(input.requesting_branch_id) {
            return Err(AppError::Validation(
                "A branch cannot request stock from itself".to_string(),
            ));
        }

        let mut tx = self.db.begin().await?;

        let branch_name: String = sqlx::query_scalar(
            "SELECT name FROM branches WHERE id = $1 AND is_active = true",
        )
        .bind(input.requesting_branch_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Branch".to_string()))?;

        if let Location::Branch { id } = input.source {
            let exists: bool =
                sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM branches WHERE id = $1)")
                    .bind(id)
                    .fetch_one(&mut *tx)
                    .await?;
            if !exists {
                return Err(AppError::NotFound("Source branch".to_string()));
            }
        }

        let product_name: String = sqlx::query_scalar("SELECT name FROM products WHERE id = $1")
            .bind(input.product_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound("Product".to_string()))?;

        let row = sqlx::query_as::<_, RequestRow>(&format!(
            r#"
            INSERT INTO transfer_requests (
                requesting_branch_id, product_id, quantity,
                source_type, source_id, requested_by, request_notes
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {REQUEST_COLUMNS}
            "#
        ))
        .bind(input.requesting_branch_id)
        .bind(input.product_id)
        .bind(input.quantity)
        .bind(input.source.kind_str())
        .bind(input.source.entity_id())
        .bind(actor.id)
        .bind(input.notes.as_deref())
        .fetch_one(&mut *tx)
        .await?;
        let request = row.into_model()?;

        let recipient = match input.source {
            Location::Branch { id } => Recipient::Branch(id),
            _ => Recipient::Admins,
        };
        NotificationService::enqueue(
            &mut tx,
            request_created_event(
                recipient,
                request.id,
                request.product_id,
                &product_name,
                request.quantity,
                &branch_name,
                actor.id,
            ),
        )
        .await?;

        tx.commit().await?;

        tracing::info!(request_id = %request.id, branch = %branch_name, "transfer request created");
        self.dispatch_best_effort().await;

        Ok(request)
    }

    /// Apply a workflow action to a request.
    ///
    /// The status re-check runs under a row lock, so concurrent responders
    /// serialize and the loser sees a non-pending status. Accept posts the
    /// transfer movement in the same transaction as the status flip.
    pub async fn respond(
        &self,
        actor: &Actor,
        request_id: Uuid,
        input: RespondInput,
    ) -> AppResult<TransferRequest> {
        let mut tx = self.db.begin().await?;

        let row = sqlx::query_as::<_, RequestRow>(&format!(
            "SELECT {REQUEST_COLUMNS} FROM transfer_requests WHERE id = $1 FOR UPDATE"
        ))
        .bind(request_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Request".to_string()))?;
        let request = row.into_model()?;

        authorize(
            actor,
            StockAction::RespondRequest {
                request: &request,
                action: input.action,
            },
        )?;

        let new_status = request
            .status
            .apply(input.action)
            .map_err(|e| AppError::InvalidTransition(e.to_string()))?;

        if input.action == RequestAction::Accept {
            self.post_transfer(&mut tx, actor, &request).await?;
        }

        let now = Utc::now();
        let row = sqlx::query_as::<_, RequestRow>(&format!(
            r#"
            UPDATE transfer_requests
            SET status = $2, responded_by = $3, responded_at = $4, response_notes = $5
            WHERE id = $1
            RETURNING {REQUEST_COLUMNS}
            "#
        ))
        .bind(request_id)
        .bind(new_status.as_str())
        .bind(actor.id)
        .bind(now)
        .bind(input.notes.as_deref())
        .fetch_one(&mut *tx)
        .await?;
        let updated = row.into_model()?;

        if let Some(kind) = match input.action {
            RequestAction::Accept => Some(NotificationKind::RequestAccepted),
            RequestAction::Reject => Some(NotificationKind::RequestRejected),
            RequestAction::Deliver => Some(NotificationKind::RequestDelivered),
            RequestAction::Cancel => None,
        } {
            let product_name: String =
                sqlx::query_scalar("SELECT name FROM products WHERE id = $1")
                    .bind(updated.product_id)
                    .fetch_one(&mut *tx)
                    .await?;
            NotificationService::enqueue(
                &mut tx,
                request_status_event(
                    kind,
                    Recipient::Branch(updated.requesting_branch_id),
                    updated.id,
                    updated.product_id,
                    &product_name,
                    updated.quantity,
                    actor.id,
                ),
            )
            .await?;
        }

        tx.commit().await?;

        tracing::info!(
            request_id = %request_id,
            status = updated.status.as_str(),
            actor_id = %actor.id,
            "transfer request transitioned"
        );
        self.dispatch_best_effort().await;

        Ok(updated)
    }

    /// Post the transfer movement realizing an accepted request. Branch
    /// sources are availability-checked under the product row lock; the
    /// central counter is untouched since a transfer moves stock between
    /// locations without changing the system total.
    async fn post_transfer(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        actor: &Actor,
        request: &TransferRequest,
    ) -> AppResult<()> {
        sqlx::query("SELECT id FROM products WHERE id = $1 FOR UPDATE")
            .bind(request.product_id)
            .execute(&mut **tx)
            .await?;

        if request.source.is_branch() {
            let available =
                derived_quantity_on(&mut **tx, request.product_id, request.source).await?;
            if available < request.quantity {
                return Err(AppError::InsufficientStock(format!(
                    "{} available at source branch, {} requested",
                    available, request.quantity
                )));
            }
        }

        sqlx::query(
            r#"
            INSERT INTO movements (
                product_id, quantity, kind, source_type, source_id,
                destination_type, destination_id, actor_id, shift, notes
            )
            VALUES ($1, $2, 'transfer', $3, $4, 'branch', $5, $6, $7, $8)
            "#,
        )
        .bind(request.product_id)
        .bind(request.quantity)
        .bind(request.source.kind_str())
        .bind(request.source.entity_id())
        .bind(request.requesting_branch_id)
        .bind(actor.id)
        .bind(Shift::covering(Utc::now()).as_str())
        .bind(format!("Transfer for request {}", request.id))
        .execute(&mut **tx)
        .await?;

        Ok(())
    }

    /// Fetch one request
    pub async fn get(&self, request_id: Uuid) -> AppResult<TransferRequest> {
        let row = sqlx::query_as::<_, RequestRow>(&format!(
            "SELECT {REQUEST_COLUMNS} FROM transfer_requests WHERE id = $1"
        ))
        .bind(request_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Request".to_string()))?;
        row.into_model()
    }

    /// List requests, newest first
    pub async fn list(&self, filter: RequestFilter) -> AppResult<Vec<TransferRequest>> {
        let rows = sqlx::query_as::<_, RequestRow>(&format!(
            r#"
            SELECT {REQUEST_COLUMNS} FROM transfer_requests
            WHERE ($1::uuid IS NULL OR requesting_branch_id = $1)
              AND ($2::uuid IS NULL OR (source_type = 'branch' AND source_id = $2))
              AND ($3::text IS NULL OR status = $3)
            ORDER BY requested_at DESC
            "#
        ))
        .bind(filter.requesting_branch_id)
        .bind(filter.source_branch_id)
        .bind(filter.status.map(|s| s.as_str()))
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(RequestRow::into_model).collect()
    }

    async fn dispatch_best_effort(&self) {
        let notifications = NotificationService::new(self.db.clone());
        if let Err(err) = notifications.dispatch_pending(50).await {
            tracing::warn!(error = %err, "notification dispatch failed");
        }
    }
}
