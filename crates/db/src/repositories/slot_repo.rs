//! Repository for the `slots` table.
//!
//! Pool-level methods serve reads and single-row writes; the
//! `Transaction`-taking methods are the building blocks of the engine's
//! multi-record critical sections and never commit on their own.

use slotswap_core::types::DbId;
use sqlx::{PgPool, Postgres, Transaction};

use crate::models::slot::{CreateSlot, Slot, SwappableSlot};
use crate::models::status::{SlotStatus, SwapRequestStatus};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, owner_id, title, start_time, end_time, status_id, created_at, updated_at";

/// CRUD and lock operations for slots.
pub struct SlotRepo;

impl SlotRepo {
    /// Insert a new slot for an owner. Status starts as BUSY.
    pub async fn create(
        pool: &PgPool,
        owner_id: DbId,
        input: &CreateSlot,
    ) -> Result<Slot, sqlx::Error> {
        let query = format!(
            "INSERT INTO slots (owner_id, title, start_time, end_time, status_id) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Slot>(&query)
            .bind(owner_id)
            .bind(&input.title)
            .bind(input.start_time)
            .bind(input.end_time)
            .bind(SlotStatus::Busy.id())
            .fetch_one(pool)
            .await
    }

    /// Find a slot by internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Slot>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM slots WHERE id = $1");
        sqlx::query_as::<_, Slot>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List one owner's slots, earliest start first.
    pub async fn list_by_owner(pool: &PgPool, owner_id: DbId) -> Result<Vec<Slot>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM slots \
             WHERE owner_id = $1 \
             ORDER BY start_time ASC"
        );
        sqlx::query_as::<_, Slot>(&query)
            .bind(owner_id)
            .fetch_all(pool)
            .await
    }

    /// Marketplace listing: all SWAPPABLE slots not owned by the caller,
    /// with owner summaries resolved.
    pub async fn list_swappable_excluding(
        pool: &PgPool,
        owner_id: DbId,
    ) -> Result<Vec<SwappableSlot>, sqlx::Error> {
        let query = "SELECT \
                s.id, s.owner_id, s.title, s.start_time, s.end_time, s.status_id, \
                u.name AS owner_name, \
                u.email AS owner_email \
             FROM slots s \
             JOIN users u ON u.id = s.owner_id \
             WHERE s.status_id = $1 AND s.owner_id <> $2 \
             ORDER BY s.start_time ASC";
        sqlx::query_as::<_, SwappableSlot>(query)
            .bind(SlotStatus::Swappable.id())
            .bind(owner_id)
            .fetch_all(pool)
            .await
    }

    /// Fetch a slot under `FOR UPDATE`, blocking concurrent writers to the
    /// same row until the surrounding transaction resolves.
    pub async fn lock_by_id(
        tx: &mut Transaction<'_, Postgres>,
        id: DbId,
    ) -> Result<Option<Slot>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM slots WHERE id = $1 FOR UPDATE");
        sqlx::query_as::<_, Slot>(&query)
            .bind(id)
            .fetch_optional(&mut **tx)
            .await
    }

    /// Set a slot's status inside the caller's transaction.
    pub async fn set_status(
        tx: &mut Transaction<'_, Postgres>,
        id: DbId,
        status: SlotStatus,
    ) -> Result<Slot, sqlx::Error> {
        let query = format!(
            "UPDATE slots SET status_id = $2 WHERE id = $1 RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Slot>(&query)
            .bind(id)
            .bind(status.id())
            .fetch_one(&mut **tx)
            .await
    }

    /// Reassign a slot to a new owner with a new status, inside the
    /// caller's transaction. Used by the accept path of a swap.
    pub async fn transfer(
        tx: &mut Transaction<'_, Postgres>,
        id: DbId,
        new_owner_id: DbId,
        status: SlotStatus,
    ) -> Result<Slot, sqlx::Error> {
        let query = format!(
            "UPDATE slots SET owner_id = $2, status_id = $3 \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Slot>(&query)
            .bind(id)
            .bind(new_owner_id)
            .bind(status.id())
            .fetch_one(&mut **tx)
            .await
    }

    /// Remove a slot inside the caller's transaction.
    pub async fn delete(tx: &mut Transaction<'_, Postgres>, id: DbId) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM slots WHERE id = $1")
            .bind(id)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }

    /// Return a cascade-released slot to the market, unless some other
    /// PENDING request still pins it.
    ///
    /// Idempotent: a slot that is not SWAP_PENDING (already freed by an
    /// earlier retry) is left untouched. Returns whether a row changed.
    pub async fn free_if_unpinned(
        tx: &mut Transaction<'_, Postgres>,
        id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE slots SET status_id = $2 \
             WHERE id = $1 \
               AND status_id = $3 \
               AND NOT EXISTS ( \
                   SELECT 1 FROM swap_requests \
                   WHERE status_id = $4 \
                     AND (requester_slot_id = $1 OR responder_slot_id = $1) \
               )",
        )
        .bind(id)
        .bind(SlotStatus::Swappable.id())
        .bind(SlotStatus::SwapPending.id())
        .bind(SwapRequestStatus::Pending.id())
        .execute(&mut **tx)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
