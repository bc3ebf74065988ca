//! Reversal engine
//!
//! A movement can be deleted within its validity window, with the inverse
//! effect applied to the central counter in the same transaction. Derived
//! quantities self-correct because they are recomputed from the surviving
//! events. Any movement inside the window may be reversed, most recent at
//! its location or not.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use shared::{central_after_reversal, within_reversal_window, Actor, MovementEvent};

use crate::error::{AppError, AppResult};
use crate::services::authz::{authorize, StockAction};
use crate::services::ledger::{MovementRow, MOVEMENT_COLUMNS};

/// Reversal engine
#[derive(Clone)]
pub struct ReversalService {
    db: PgPool,
    window_hours: i64,
}

impl ReversalService {
    pub fn new(db: PgPool, window_hours: i64) -> Self {
        Self { db, window_hours }
    }

    /// Delete a movement and apply its inverse effect. Admin only; fails
    /// `StaleReversal` outside the window and `NotFound` for unknown ids.
    pub async fn reverse(
        &self,
        actor: &Actor,
        movement_id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<MovementEvent> {
        authorize(actor, StockAction::ReverseMovement)?;

        let mut tx = self.db.begin().await?;

        let row = sqlx::query_as::<_, MovementRow>(&format!(
            "SELECT {MOVEMENT_COLUMNS} FROM movements WHERE id = $1 FOR UPDATE"
        ))
        .bind(movement_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Movement".to_string()))?;
        let movement = row.into_model()?;

        if !within_reversal_window(movement.timestamp, now, self.window_hours) {
            return Err(AppError::StaleReversal(movement_id));
        }

        // Lock the product row so the counter adjustment serializes with
        // concurrent appends.
        let central: i64 =
            sqlx::query_scalar("SELECT central_quantity FROM products WHERE id = $1 FOR UPDATE")
                .bind(movement.product_id)
                .fetch_one(&mut *tx)
                .await?;

        sqlx::query("DELETE FROM movements WHERE id = $1")
            .bind(movement_id)
            .execute(&mut *tx)
            .await?;

        let adjusted = central_after_reversal(central, movement.kind, movement.quantity);
        if adjusted != central {
            sqlx::query("UPDATE products SET central_quantity = $2 WHERE id = $1")
                .bind(movement.product_id)
                .bind(adjusted)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        tracing::info!(
            movement_id = %movement_id,
            actor_id = %actor.id,
            kind = movement.kind.as_str(),
            quantity = movement.quantity,
            "movement reversed"
        );

        Ok(movement)
    }
}
