//! Swap request entity model, DTOs, and listing views.

use serde::{Deserialize, Serialize};
use slotswap_core::types::{DbId, Timestamp};
use sqlx::FromRow;

use crate::models::status::StatusId;

/// A row from the `swap_requests` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SwapRequest {
    pub id: DbId,
    pub requester_id: DbId,
    pub responder_id: DbId,
    pub requester_slot_id: DbId,
    pub responder_slot_id: DbId,
    pub status_id: StatusId,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for inserting a new swap request. Status always starts as PENDING.
///
/// The responder is pinned at creation time to the offered-for slot's
/// current owner.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateSwapRequest {
    pub requester_id: DbId,
    pub responder_id: DbId,
    pub requester_slot_id: DbId,
    pub responder_slot_id: DbId,
}

/// Listing view: a pending request with the counterparty's name and both
/// slots' details resolved in one query.
///
/// For an incoming listing the counterparty is the requester; for an
/// outgoing listing it is the responder.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SwapRequestDetails {
    pub id: DbId,
    pub requester_id: DbId,
    pub responder_id: DbId,
    pub status_id: StatusId,
    pub counterparty_name: String,
    pub requester_slot_id: DbId,
    pub requester_slot_title: String,
    pub requester_slot_start_time: Timestamp,
    pub requester_slot_end_time: Timestamp,
    pub responder_slot_id: DbId,
    pub responder_slot_title: String,
    pub responder_slot_start_time: Timestamp,
    pub responder_slot_end_time: Timestamp,
    pub created_at: Timestamp,
}
