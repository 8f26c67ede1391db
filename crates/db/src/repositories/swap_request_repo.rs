//! Repository for the `swap_requests` table.

use slotswap_core::types::DbId;
use sqlx::{PgPool, Postgres, Transaction};

use crate::models::status::{StatusId, SwapRequestStatus};
use crate::models::swap_request::{CreateSwapRequest, SwapRequest, SwapRequestDetails};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, requester_id, responder_id, requester_slot_id, responder_slot_id, \
                       status_id, created_at, updated_at";

/// Detail-view column list for incoming/outgoing listings.
const DETAIL_COLUMNS: &str = "\
    sr.id, sr.requester_id, sr.responder_id, sr.status_id, \
    u.name AS counterparty_name, \
    rs.id AS requester_slot_id, rs.title AS requester_slot_title, \
    rs.start_time AS requester_slot_start_time, rs.end_time AS requester_slot_end_time, \
    os.id AS responder_slot_id, os.title AS responder_slot_title, \
    os.start_time AS responder_slot_start_time, os.end_time AS responder_slot_end_time, \
    sr.created_at";

/// CRUD, lock, and cascade operations for swap requests.
pub struct SwapRequestRepo;

impl SwapRequestRepo {
    /// Insert a new PENDING request inside the caller's transaction.
    pub async fn create(
        tx: &mut Transaction<'_, Postgres>,
        input: &CreateSwapRequest,
    ) -> Result<SwapRequest, sqlx::Error> {
        let query = format!(
            "INSERT INTO swap_requests \
                (requester_id, responder_id, requester_slot_id, responder_slot_id, status_id) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, SwapRequest>(&query)
            .bind(input.requester_id)
            .bind(input.responder_id)
            .bind(input.requester_slot_id)
            .bind(input.responder_slot_id)
            .bind(SwapRequestStatus::Pending.id())
            .fetch_one(&mut **tx)
            .await
    }

    /// Find a request by internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<SwapRequest>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM swap_requests WHERE id = $1");
        sqlx::query_as::<_, SwapRequest>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Fetch a request under `FOR UPDATE` so concurrent responders
    /// serialize on the same row.
    pub async fn lock_by_id(
        tx: &mut Transaction<'_, Postgres>,
        id: DbId,
    ) -> Result<Option<SwapRequest>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM swap_requests WHERE id = $1 FOR UPDATE");
        sqlx::query_as::<_, SwapRequest>(&query)
            .bind(id)
            .fetch_optional(&mut **tx)
            .await
    }

    /// Move a request to a new status inside the caller's transaction.
    pub async fn set_status(
        tx: &mut Transaction<'_, Postgres>,
        id: DbId,
        status: SwapRequestStatus,
    ) -> Result<SwapRequest, sqlx::Error> {
        let query = format!(
            "UPDATE swap_requests SET status_id = $2 WHERE id = $1 RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, SwapRequest>(&query)
            .bind(id)
            .bind(status.id())
            .fetch_one(&mut **tx)
            .await
    }

    /// Cascade step of an accepted swap: reject every *other* PENDING
    /// request that references either of the two reassigned slots, on
    /// either side, returning the rejected rows.
    ///
    /// Idempotent: requests already REJECTED by an earlier attempt no
    /// longer match the PENDING filter.
    pub async fn reject_pending_referencing(
        tx: &mut Transaction<'_, Postgres>,
        exclude_request_id: DbId,
        slot_a: DbId,
        slot_b: DbId,
    ) -> Result<Vec<SwapRequest>, sqlx::Error> {
        let query = format!(
            "UPDATE swap_requests SET status_id = $1 \
             WHERE status_id = $2 \
               AND id <> $3 \
               AND (requester_slot_id IN ($4, $5) OR responder_slot_id IN ($4, $5)) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, SwapRequest>(&query)
            .bind(SwapRequestStatus::Rejected.id())
            .bind(SwapRequestStatus::Pending.id())
            .bind(exclude_request_id)
            .bind(slot_a)
            .bind(slot_b)
            .fetch_all(&mut **tx)
            .await
    }

    /// Count PENDING requests referencing a slot on either side.
    pub async fn count_pending_for_slot(pool: &PgPool, slot_id: DbId) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM swap_requests \
             WHERE status_id = $1 \
               AND (requester_slot_id = $2 OR responder_slot_id = $2)",
        )
        .bind(SwapRequestStatus::Pending.id())
        .bind(slot_id)
        .fetch_one(pool)
        .await?;
        Ok(count)
    }

    /// PENDING requests awaiting a responder, with requester name and both
    /// slots resolved.
    pub async fn list_incoming(
        pool: &PgPool,
        responder_id: DbId,
    ) -> Result<Vec<SwapRequestDetails>, sqlx::Error> {
        let query = format!(
            "SELECT {DETAIL_COLUMNS} \
             FROM swap_requests sr \
             JOIN users u ON u.id = sr.requester_id \
             JOIN slots rs ON rs.id = sr.requester_slot_id \
             JOIN slots os ON os.id = sr.responder_slot_id \
             WHERE sr.responder_id = $1 AND sr.status_id = $2 \
             ORDER BY sr.created_at ASC"
        );
        Self::fetch_details(pool, &query, responder_id).await
    }

    /// PENDING requests a requester has open, with responder name and both
    /// slots resolved.
    pub async fn list_outgoing(
        pool: &PgPool,
        requester_id: DbId,
    ) -> Result<Vec<SwapRequestDetails>, sqlx::Error> {
        let query = format!(
            "SELECT {DETAIL_COLUMNS} \
             FROM swap_requests sr \
             JOIN users u ON u.id = sr.responder_id \
             JOIN slots rs ON rs.id = sr.requester_slot_id \
             JOIN slots os ON os.id = sr.responder_slot_id \
             WHERE sr.requester_id = $1 AND sr.status_id = $2 \
             ORDER BY sr.created_at ASC"
        );
        Self::fetch_details(pool, &query, requester_id).await
    }

    async fn fetch_details(
        pool: &PgPool,
        query: &str,
        user_id: DbId,
    ) -> Result<Vec<SwapRequestDetails>, sqlx::Error> {
        sqlx::query_as::<_, SwapRequestDetails>(query)
            .bind(user_id)
            .bind(StatusId::from(SwapRequestStatus::Pending))
            .fetch_all(pool)
            .await
    }
}
