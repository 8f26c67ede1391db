//! Shared fixtures and invariant checks for engine integration tests.

use chrono::{Duration, Utc};
use slotswap_core::types::DbId;
use slotswap_db::models::slot::{CreateSlot, Slot};
use slotswap_db::models::status::SlotStatus;
use slotswap_db::models::user::{CreateUser, User};
use slotswap_db::repositories::UserRepo;
use slotswap_db::DbPool;
use slotswap_engine::SwapEngine;

/// Load `.env` (for local runs) and install a tracing subscriber once.
pub fn init() {
    dotenvy::dotenv().ok();
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "slotswap_engine=debug".into()),
        )
        .with_test_writer()
        .try_init();
}

/// Provision a user; the email is derived from the name.
pub async fn create_user(pool: &DbPool, name: &str) -> User {
    UserRepo::create(
        pool,
        &CreateUser {
            name: name.to_string(),
            email: format!("{name}@example.com"),
        },
    )
    .await
    .unwrap()
}

/// A one-hour slot starting `offset_hours` from now.
pub fn slot_input(title: &str, offset_hours: i64) -> CreateSlot {
    let start = Utc::now() + Duration::hours(offset_hours);
    CreateSlot {
        title: title.to_string(),
        start_time: start,
        end_time: start + Duration::hours(1),
    }
}

/// Create a slot and put it on the market.
pub async fn swappable_slot(
    engine: &SwapEngine,
    owner_id: DbId,
    title: &str,
    offset_hours: i64,
) -> Slot {
    let slot = engine
        .create_slot(owner_id, &slot_input(title, offset_hours))
        .await
        .unwrap();
    engine
        .set_slot_status(owner_id, slot.id, SlotStatus::Swappable)
        .await
        .unwrap()
}

/// Assert the store-wide pinning invariant: a slot is SWAP_PENDING if and
/// only if exactly one PENDING request references it.
pub async fn assert_pinning_invariant(pool: &DbPool) {
    let offenders: Vec<(DbId, i16, i64)> = sqlx::query_as(
        "SELECT s.id, s.status_id, COUNT(sr.id) AS pending_refs \
         FROM slots s \
         LEFT JOIN swap_requests sr \
             ON sr.status_id = 1 \
            AND (sr.requester_slot_id = s.id OR sr.responder_slot_id = s.id) \
         GROUP BY s.id, s.status_id \
         HAVING (s.status_id = 3 AND COUNT(sr.id) <> 1) \
             OR (s.status_id <> 3 AND COUNT(sr.id) > 0)",
    )
    .fetch_all(pool)
    .await
    .unwrap();

    assert!(
        offenders.is_empty(),
        "pinning invariant violated for (slot_id, status_id, pending_refs): {offenders:?}"
    );
}
