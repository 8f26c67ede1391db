//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - A `Deserialize` create DTO for inserts
//! - Flattened view structs for JOIN projections where a listing resolves
//!   counterparty or slot details

pub mod slot;
pub mod status;
pub mod swap_request;
pub mod user;
