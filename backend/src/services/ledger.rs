//! Movement ledger service
//!
//! The ledger is the append-only source of truth for stock. Batches commit
//! atomically: every line is validated, availability-checked and appended in
//! one transaction with the affected product rows locked, so concurrent
//! submissions against the same stock serialize and partial application is
//! impossible.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use shared::{
    central_delta, validate_endpoints, validate_quantity, Actor, Location, MovementDraft,
    MovementEvent, MovementKind, Recipient, Shift,
};

use crate::error::{AppError, AppResult};
use crate::services::authz::{authorize, StockAction};
use crate::services::notification::{low_stock_event, NotificationService};
use crate::services::stock::derived_quantity_on;

/// Movement ledger service
#[derive(Clone)]
pub struct LedgerService {
    db: PgPool,
    low_stock_threshold: i64,
}

/// Query filters for the audit/reporting interface. All optional; results
/// are ordered newest first and restartable through limit/offset.
#[derive(Debug, Default, Deserialize)]
pub struct MovementFilter {
    pub product_id: Option<Uuid>,
    /// Matches movements where this location is either endpoint
    pub location: Option<Location>,
    pub kind: Option<MovementKind>,
    pub date_from: Option<DateTime<Utc>>,
    pub date_to: Option<DateTime<Utc>>,
    pub actor_id: Option<Uuid>,
    pub shift: Option<Shift>,
    pub quantity_less_than: Option<i64>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, FromRow)]
pub(crate) struct MovementRow {
    id: Uuid,
    product_id: Uuid,
    quantity: i64,
    kind: String,
    source_type: String,
    source_id: Option<Uuid>,
    destination_type: String,
    destination_id: Option<Uuid>,
    actor_id: Uuid,
    shift: String,
    occurred_at: DateTime<Utc>,
    notes: Option<String>,
}

impl MovementRow {
    pub(crate) fn into_model(self) -> AppResult<MovementEvent> {
        let invalid = |e: &'static str| AppError::InternalError(anyhow::anyhow!(e));
        Ok(MovementEvent {
            id: self.id,
            product_id: self.product_id,
            quantity: self.quantity,
            kind: MovementKind::from_str(&self.kind).map_err(invalid)?,
            source: Location::from_parts(&self.source_type, self.source_id).map_err(invalid)?,
            destination: Location::from_parts(&self.destination_type, self.destination_id)
                .map_err(invalid)?,
            actor_id: self.actor_id,
            shift: Shift::from_str(&self.shift).map_err(invalid)?,
            timestamp: self.occurred_at,
            notes: self.notes,
        })
    }
}

pub(crate) const MOVEMENT_COLUMNS: &str = "id, product_id, quantity, kind, source_type, \
     source_id, destination_type, destination_id, actor_id, shift, occurred_at, notes";

impl LedgerService {
    pub fn new(db: PgPool, low_stock_threshold: i64) -> Self {
        Self {
            db,
            low_stock_threshold,
        }
    }

    /// Append a batch of movements atomically.
    ///
    /// Lines are validated up front, then applied in submission order inside
    /// one transaction: the product rows are locked first so the
    /// availability check and the append form a single atomic unit, and
    /// lines appended earlier in the batch count against later lines.
    /// Returns the created movement ids in submission order.
    pub async fn append_batch(
        &self,
        actor: &Actor,
        lines: &[MovementDraft],
    ) -> AppResult<Vec<Uuid>> {
        authorize(actor, StockAction::PostMovements)?;

        if lines.is_empty() {
            return Err(AppError::Validation("Movement batch is empty".to_string()));
        }

        for (index, line) in lines.iter().enumerate() {
            validate_quantity(line.quantity).map_err(|msg| AppError::InvalidQuantity {
                message: msg.to_string(),
                line: Some(index),
            })?;
            validate_endpoints(line.kind, line.source, line.destination)
                .map_err(|msg| AppError::Validation(format!("Line {}: {}", index, msg)))?;
        }

        let mut product_ids: Vec<Uuid> = lines.iter().map(|l| l.product_id).collect();
        product_ids.sort();
        product_ids.dedup();

        let mut tx = self.db.begin().await?;

        // Lock the product rows in id order; concurrent batches touching the
        // same products queue here instead of racing the availability check.
        let locked: Vec<Uuid> = sqlx::query_scalar(
            "SELECT id FROM products WHERE id = ANY($1) ORDER BY id FOR UPDATE",
        )
        .bind(&product_ids)
        .fetch_all(&mut *tx)
        .await?;

        if locked.len() != product_ids.len() {
            return Err(AppError::NotFound("Product".to_string()));
        }

        let mut created = Vec::with_capacity(lines.len());
        for (index, line) in lines.iter().enumerate() {
            if matches!(line.kind, MovementKind::Outbound | MovementKind::Transfer) {
                let available =
                    derived_quantity_on(&mut *tx, line.product_id, line.source).await?;
                if available < line.quantity {
                    return Err(AppError::InsufficientStock(format!(
                        "Line {}: {} available at {} for product {}, {} requested",
                        index,
                        available,
                        line.source.kind_str(),
                        line.product_id,
                        line.quantity
                    )));
                }
            }

            let delta = central_delta(line.kind, line.quantity);
            if delta < 0 {
                let central: i64 =
                    sqlx::query_scalar("SELECT central_quantity FROM products WHERE id = $1")
                        .bind(line.product_id)
                        .fetch_one(&mut *tx)
                        .await?;
                if central + delta < 0 {
                    return Err(AppError::InsufficientStock(format!(
                        "Line {}: central stock {} for product {}, {} requested",
                        index, central, line.product_id, line.quantity
                    )));
                }
            }

            let id: Uuid = sqlx::query_scalar(
                r#"
                INSERT INTO movements (
                    product_id, quantity, kind, source_type, source_id,
                    destination_type, destination_id, actor_id, shift, notes
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
                RETURNING id
                "#,
            )
            .bind(line.product_id)
            .bind(line.quantity)
            .bind(line.kind.as_str())
            .bind(line.source.kind_str())
            .bind(line.source.entity_id())
            .bind(line.destination.kind_str())
            .bind(line.destination.entity_id())
            .bind(actor.id)
            .bind(line.shift.as_str())
            .bind(line.notes.as_deref())
            .fetch_one(&mut *tx)
            .await?;
            created.push(id);

            if delta != 0 {
                sqlx::query(
                    "UPDATE products SET central_quantity = central_quantity + $2 WHERE id = $1",
                )
                .bind(line.product_id)
                .bind(delta)
                .execute(&mut *tx)
                .await?;
            }

            self.check_low_stock(&mut tx, line).await?;
        }

        tx.commit().await?;

        tracing::info!(
            actor_id = %actor.id,
            lines = lines.len(),
            "movement batch appended"
        );

        let notifications = NotificationService::new(self.db.clone());
        if let Err(err) = notifications.dispatch_pending(50).await {
            tracing::warn!(error = %err, "notification dispatch after append failed");
        }

        Ok(created)
    }

    /// Emit a low-stock alert when an outgoing line leaves its source at or
    /// below the threshold. Runs inside the batch transaction so the alert
    /// never survives a rolled-back batch.
    async fn check_low_stock(
        &self,
        tx: &mut sqlx::Transaction<'_, Postgres>,
        line: &MovementDraft,
    ) -> AppResult<()> {
        if !matches!(line.kind, MovementKind::Outbound | MovementKind::Transfer) {
            return Ok(());
        }

        let (recipient, location_name) = match line.source {
            Location::Branch { id } => {
                let name: Option<String> =
                    sqlx::query_scalar("SELECT name FROM branches WHERE id = $1")
                        .bind(id)
                        .fetch_optional(&mut **tx)
                        .await?;
                (
                    Recipient::Branch(id),
                    name.unwrap_or_else(|| "branch".to_string()),
                )
            }
            Location::Warehouse => (Recipient::Admins, "the warehouse".to_string()),
            _ => return Ok(()),
        };

        let remaining = derived_quantity_on(&mut **tx, line.product_id, line.source).await?;
        if remaining > self.low_stock_threshold {
            return Ok(());
        }

        let product_name: String = sqlx::query_scalar("SELECT name FROM products WHERE id = $1")
            .bind(line.product_id)
            .fetch_one(&mut **tx)
            .await?;

        NotificationService::enqueue(
            tx,
            low_stock_event(
                recipient,
                line.product_id,
                &product_name,
                &location_name,
                remaining,
            ),
        )
        .await?;

        Ok(())
    }

    /// Fetch one movement
    pub async fn get(&self, id: Uuid) -> AppResult<MovementEvent> {
        let row = sqlx::query_as::<_, MovementRow>(&format!(
            "SELECT {MOVEMENT_COLUMNS} FROM movements WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Movement".to_string()))?;

        row.into_model()
    }

    /// Audit/reporting query over the ledger, newest first
    pub async fn query(&self, filter: MovementFilter) -> AppResult<Vec<MovementEvent>> {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(format!(
            "SELECT {MOVEMENT_COLUMNS} FROM movements WHERE 1 = 1"
        ));

        if let Some(product_id) = filter.product_id {
            builder.push(" AND product_id = ").push_bind(product_id);
        }
        if let Some(kind) = filter.kind {
            builder.push(" AND kind = ").push_bind(kind.as_str());
        }
        if let Some(location) = filter.location {
            builder
                .push(" AND ((source_type = ")
                .push_bind(location.kind_str())
                .push(" AND source_id IS NOT DISTINCT FROM ")
                .push_bind(location.entity_id())
                .push(") OR (destination_type = ")
                .push_bind(location.kind_str())
                .push(" AND destination_id IS NOT DISTINCT FROM ")
                .push_bind(location.entity_id())
                .push("))");
        }
        if let Some(from) = filter.date_from {
            builder.push(" AND occurred_at >= ").push_bind(from);
        }
        if let Some(to) = filter.date_to {
            builder.push(" AND occurred_at <= ").push_bind(to);
        }
        if let Some(actor_id) = filter.actor_id {
            builder.push(" AND actor_id = ").push_bind(actor_id);
        }
        if let Some(shift) = filter.shift {
            builder.push(" AND shift = ").push_bind(shift.as_str());
        }
        if let Some(less_than) = filter.quantity_less_than {
            builder.push(" AND quantity < ").push_bind(less_than);
        }

        builder.push(" ORDER BY occurred_at DESC");
        builder
            .push(" LIMIT ")
            .push_bind(filter.limit.unwrap_or(200).clamp(1, 1000));
        builder
            .push(" OFFSET ")
            .push_bind(filter.offset.unwrap_or(0).max(0));

        let rows: Vec<MovementRow> = builder.build_query_as().fetch_all(&self.db).await?;
        rows.into_iter().map(MovementRow::into_model).collect()
    }
}
