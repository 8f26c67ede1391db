//! User entity model and DTOs.

use serde::{Deserialize, Serialize};
use slotswap_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// A row from the `users` table.
///
/// Credentials live with the identity service; this table only mirrors
/// what listings display about an owner.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub id: DbId,
    pub name: String,
    pub email: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a new user.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateUser {
    pub name: String,
    pub email: String,
}
