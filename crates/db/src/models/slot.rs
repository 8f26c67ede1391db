//! Slot entity model, DTOs, and marketplace view.

use serde::{Deserialize, Serialize};
use slotswap_core::types::{DbId, Timestamp};
use sqlx::FromRow;
use validator::Validate;

use crate::models::status::StatusId;

/// A row from the `slots` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Slot {
    pub id: DbId,
    pub owner_id: DbId,
    pub title: String,
    pub start_time: Timestamp,
    pub end_time: Timestamp,
    pub status_id: StatusId,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a new slot. Status always starts as BUSY.
///
/// The start/end ordering rule lives in `slotswap_core::swap`; the engine
/// applies both checks before any write.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateSlot {
    #[validate(length(min = 1, max = 200, message = "title must be 1-200 characters"))]
    pub title: String,
    pub start_time: Timestamp,
    pub end_time: Timestamp,
}

/// Marketplace view: a swappable slot with its owner's summary attached.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SwappableSlot {
    pub id: DbId,
    pub owner_id: DbId,
    pub title: String,
    pub start_time: Timestamp,
    pub end_time: Timestamp,
    pub status_id: StatusId,
    pub owner_name: String,
    pub owner_email: String,
}
