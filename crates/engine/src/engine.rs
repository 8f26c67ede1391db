//! The swap engine: slot lifecycle, the swap request protocol, and the
//! marketplace/request query projections.
//!
//! Every mutating operation is one transaction. Slot rows are always
//! locked in ascending id order (see `slotswap_core::swap::lock_order`),
//! and each transaction runs under a bounded `lock_timeout`, so no call
//! blocks indefinitely and concurrent callers cannot deadlock on a slot
//! pair.

use serde::Serialize;
use slotswap_core::error::SwapError;
use slotswap_core::swap::{freed_slot_ids, lock_order, validate_time_range, RequestSlots};
use slotswap_core::types::DbId;
use slotswap_db::models::slot::{CreateSlot, Slot, SwappableSlot};
use slotswap_db::models::status::{SlotStatus, SwapRequestStatus};
use slotswap_db::models::swap_request::{CreateSwapRequest, SwapRequest, SwapRequestDetails};
use slotswap_db::repositories::{SlotRepo, SwapRequestRepo};
use slotswap_db::DbPool;
use sqlx::{Postgres, Transaction};
use validator::Validate;

use crate::config::EngineConfig;
use crate::error::map_db_error;

/// Outcome summary of [`SwapEngine::respond_to_swap`].
///
/// Carries the resolved request plus everything the cascade touched, so
/// the presentation collaborator can report what changed without
/// re-querying.
#[derive(Debug, Clone, Serialize)]
pub struct SwapOutcome {
    /// The request in its terminal state.
    pub request: SwapRequest,
    /// Competing requests the cascade rejected (accept path only).
    pub cascaded_request_ids: Vec<DbId>,
    /// Slots returned to SWAPPABLE: both sides on a rejection, the
    /// cascade-released slots on an acceptance.
    pub freed_slot_ids: Vec<DbId>,
}

/// Stateless coordinator over the slot and swap-request stores.
///
/// Cheaply cloneable; all state lives in the database, so any number of
/// engine instances may run concurrently.
#[derive(Clone)]
pub struct SwapEngine {
    pool: DbPool,
    config: EngineConfig,
}

impl SwapEngine {
    /// Create an engine with the default configuration.
    pub fn new(pool: DbPool) -> Self {
        Self::with_config(pool, EngineConfig::default())
    }

    /// Create an engine with an explicit configuration.
    pub fn with_config(pool: DbPool, config: EngineConfig) -> Self {
        Self { pool, config }
    }

    /// Open a transaction with the configured bounded lock wait.
    async fn begin(&self) -> Result<Transaction<'static, Postgres>, SwapError> {
        let mut tx = self.pool.begin().await.map_err(map_db_error)?;
        // SET LOCAL takes no bind parameters; the value is a trusted u64.
        let stmt = format!("SET LOCAL lock_timeout = '{}ms'", self.config.lock_timeout_ms);
        sqlx::query(&stmt)
            .execute(&mut *tx)
            .await
            .map_err(map_db_error)?;
        Ok(tx)
    }

    // -----------------------------------------------------------------
    // Slot lifecycle
    // -----------------------------------------------------------------

    /// Create a slot for its owner. Initial status is always BUSY.
    pub async fn create_slot(&self, owner_id: DbId, input: &CreateSlot) -> Result<Slot, SwapError> {
        input
            .validate()
            .map_err(|e| SwapError::Validation(e.to_string()))?;
        validate_time_range(input.start_time, input.end_time).map_err(SwapError::Validation)?;

        let slot = SlotRepo::create(&self.pool, owner_id, input)
            .await
            .map_err(map_db_error)?;

        tracing::info!(owner_id, slot_id = slot.id, title = %slot.title, "Slot created");
        Ok(slot)
    }

    /// Toggle a slot between BUSY and SWAPPABLE.
    ///
    /// Holds the slot's row lock while checking, so a concurrent
    /// `request_swap` cannot pin the slot between the check and the write.
    pub async fn set_slot_status(
        &self,
        caller_id: DbId,
        slot_id: DbId,
        desired: SlotStatus,
    ) -> Result<Slot, SwapError> {
        if !desired.owner_settable() {
            return Err(SwapError::Validation(format!(
                "status '{desired:?}' cannot be set directly"
            )));
        }

        let mut tx = self.begin().await?;
        let slot = self.lock_owned_unpinned_slot(&mut tx, caller_id, slot_id).await?;
        let updated = SlotRepo::set_status(&mut tx, slot.id, desired)
            .await
            .map_err(map_db_error)?;
        tx.commit().await.map_err(map_db_error)?;

        tracing::info!(
            user_id = caller_id,
            slot_id,
            status = ?desired,
            "Slot status updated"
        );
        Ok(updated)
    }

    /// Delete a slot. Only its owner may, and only while it is not pinned
    /// by a pending swap.
    pub async fn delete_slot(&self, caller_id: DbId, slot_id: DbId) -> Result<(), SwapError> {
        let mut tx = self.begin().await?;
        let slot = self.lock_owned_unpinned_slot(&mut tx, caller_id, slot_id).await?;
        SlotRepo::delete(&mut tx, slot.id).await.map_err(map_db_error)?;
        tx.commit().await.map_err(map_db_error)?;

        tracing::info!(user_id = caller_id, slot_id, "Slot deleted");
        Ok(())
    }

    /// Lock a slot row and verify the caller may mutate it: the slot
    /// exists, the caller owns it, and no pending swap pins it.
    async fn lock_owned_unpinned_slot(
        &self,
        tx: &mut Transaction<'static, Postgres>,
        caller_id: DbId,
        slot_id: DbId,
    ) -> Result<Slot, SwapError> {
        let slot = SlotRepo::lock_by_id(tx, slot_id)
            .await
            .map_err(map_db_error)?
            .ok_or(SwapError::NotFound {
                entity: "Slot",
                id: slot_id,
            })?;

        if slot.owner_id != caller_id {
            return Err(SwapError::NotOwner {
                user_id: caller_id,
                slot_id,
            });
        }

        let status =
            SlotStatus::try_from(slot.status_id).map_err(|e| SwapError::Storage(e.to_string()))?;
        if status.is_pinned() {
            return Err(SwapError::InvalidTransition { slot_id });
        }

        Ok(slot)
    }

    // -----------------------------------------------------------------
    // Swap request protocol
    // -----------------------------------------------------------------

    /// Propose exchanging ownership of `my_slot_id` for `their_slot_id`.
    ///
    /// On success the new request is PENDING and both slots are pinned to
    /// SWAP_PENDING, all committed atomically.
    pub async fn request_swap(
        &self,
        caller_id: DbId,
        my_slot_id: DbId,
        their_slot_id: DbId,
    ) -> Result<SwapRequest, SwapError> {
        let mut tx = self.begin().await?;

        let (first_id, second_id) = lock_order(my_slot_id, their_slot_id);
        let first = SlotRepo::lock_by_id(&mut tx, first_id)
            .await
            .map_err(map_db_error)?;
        let second = if second_id == first_id {
            first.clone()
        } else {
            SlotRepo::lock_by_id(&mut tx, second_id)
                .await
                .map_err(map_db_error)?
        };
        let (my_slot, their_slot) = if first_id == my_slot_id {
            (first, second)
        } else {
            (second, first)
        };

        let my_slot = my_slot.ok_or(SwapError::NotFound {
            entity: "Slot",
            id: my_slot_id,
        })?;
        let their_slot = their_slot.ok_or(SwapError::NotFound {
            entity: "Slot",
            id: their_slot_id,
        })?;

        if my_slot.owner_id != caller_id {
            return Err(SwapError::NotOwner {
                user_id: caller_id,
                slot_id: my_slot.id,
            });
        }
        if their_slot.owner_id == caller_id {
            return Err(SwapError::SelfSwap {
                slot_id: their_slot.id,
            });
        }
        for slot in [&my_slot, &their_slot] {
            if slot.status_id != SlotStatus::Swappable.id() {
                return Err(SwapError::NotSwappable { slot_id: slot.id });
            }
        }

        let request = SwapRequestRepo::create(
            &mut tx,
            &CreateSwapRequest {
                requester_id: caller_id,
                responder_id: their_slot.owner_id,
                requester_slot_id: my_slot.id,
                responder_slot_id: their_slot.id,
            },
        )
        .await
        .map_err(map_db_error)?;

        SlotRepo::set_status(&mut tx, my_slot.id, SlotStatus::SwapPending)
            .await
            .map_err(map_db_error)?;
        SlotRepo::set_status(&mut tx, their_slot.id, SlotStatus::SwapPending)
            .await
            .map_err(map_db_error)?;

        tx.commit().await.map_err(map_db_error)?;

        tracing::info!(
            request_id = request.id,
            requester_id = caller_id,
            responder_id = request.responder_id,
            requester_slot_id = request.requester_slot_id,
            responder_slot_id = request.responder_slot_id,
            "Swap request created"
        );
        Ok(request)
    }

    /// Accept or reject a pending swap request.
    ///
    /// The whole resolution, cascade included, is one transaction: either
    /// everything below commits or nothing does, and a failed call can be
    /// retried safely.
    pub async fn respond_to_swap(
        &self,
        caller_id: DbId,
        request_id: DbId,
        accept: bool,
    ) -> Result<SwapOutcome, SwapError> {
        let mut tx = self.begin().await?;

        let request = SwapRequestRepo::lock_by_id(&mut tx, request_id)
            .await
            .map_err(map_db_error)?
            .ok_or(SwapError::NotFound {
                entity: "SwapRequest",
                id: request_id,
            })?;

        if request.responder_id != caller_id {
            return Err(SwapError::NotAuthorized {
                user_id: caller_id,
                request_id,
            });
        }

        let status = SwapRequestStatus::try_from(request.status_id)
            .map_err(|e| SwapError::Storage(e.to_string()))?;
        if status.is_terminal() {
            return Err(SwapError::AlreadyActioned { request_id });
        }

        // Pin both slot rows before touching anything. A pending request
        // always references two live slots (FKs), so absence here means
        // the store is corrupt, not that the caller erred.
        let (first_id, second_id) =
            lock_order(request.requester_slot_id, request.responder_slot_id);
        for slot_id in [first_id, second_id] {
            SlotRepo::lock_by_id(&mut tx, slot_id)
                .await
                .map_err(map_db_error)?
                .ok_or_else(|| {
                    SwapError::Storage(format!(
                        "slot {slot_id} missing for pending request {request_id}"
                    ))
                })?;
        }

        let outcome = if accept {
            self.apply_accept(&mut tx, &request).await?
        } else {
            self.apply_reject(&mut tx, &request).await?
        };

        tx.commit().await.map_err(map_db_error)?;

        tracing::info!(
            request_id,
            responder_id = caller_id,
            accepted = accept,
            cascaded = outcome.cascaded_request_ids.len(),
            freed = outcome.freed_slot_ids.len(),
            "Swap request resolved"
        );
        Ok(outcome)
    }

    /// Reject path: the request goes REJECTED and both slots return to
    /// the market. Never fails once the preconditions passed.
    async fn apply_reject(
        &self,
        tx: &mut Transaction<'static, Postgres>,
        request: &SwapRequest,
    ) -> Result<SwapOutcome, SwapError> {
        let rejected = SwapRequestRepo::set_status(tx, request.id, SwapRequestStatus::Rejected)
            .await
            .map_err(map_db_error)?;

        SlotRepo::set_status(tx, request.requester_slot_id, SlotStatus::Swappable)
            .await
            .map_err(map_db_error)?;
        SlotRepo::set_status(tx, request.responder_slot_id, SlotStatus::Swappable)
            .await
            .map_err(map_db_error)?;

        Ok(SwapOutcome {
            request: rejected,
            cascaded_request_ids: Vec::new(),
            freed_slot_ids: vec![request.requester_slot_id, request.responder_slot_id],
        })
    }

    /// Accept path: ownership crosses over, both slots go BUSY, and every
    /// other pending request over either slot is cascaded to REJECTED
    /// with its far-side slot returned to the market.
    async fn apply_accept(
        &self,
        tx: &mut Transaction<'static, Postgres>,
        request: &SwapRequest,
    ) -> Result<SwapOutcome, SwapError> {
        let accepted = SwapRequestRepo::set_status(tx, request.id, SwapRequestStatus::Accepted)
            .await
            .map_err(map_db_error)?;

        // The requester's slot now belongs to the responder and vice
        // versa; neither stays on the market.
        SlotRepo::transfer(
            tx,
            request.requester_slot_id,
            request.responder_id,
            SlotStatus::Busy,
        )
        .await
        .map_err(map_db_error)?;
        SlotRepo::transfer(
            tx,
            request.responder_slot_id,
            request.requester_id,
            SlotStatus::Busy,
        )
        .await
        .map_err(map_db_error)?;

        // Cascade: competing pending requests over either slot were
        // negotiating for a deal that no longer reflects reality.
        let cascaded = SwapRequestRepo::reject_pending_referencing(
            tx,
            request.id,
            request.requester_slot_id,
            request.responder_slot_id,
        )
        .await
        .map_err(map_db_error)?;

        let cascaded_slots: Vec<RequestSlots> = cascaded
            .iter()
            .map(|r| RequestSlots {
                requester_slot_id: r.requester_slot_id,
                responder_slot_id: r.responder_slot_id,
            })
            .collect();

        let mut freed = Vec::new();
        for slot_id in freed_slot_ids(
            &cascaded_slots,
            request.requester_slot_id,
            request.responder_slot_id,
        ) {
            if SlotRepo::free_if_unpinned(tx, slot_id)
                .await
                .map_err(map_db_error)?
            {
                freed.push(slot_id);
            }
        }

        Ok(SwapOutcome {
            request: accepted,
            cascaded_request_ids: cascaded.iter().map(|r| r.id).collect(),
            freed_slot_ids: freed,
        })
    }

    // -----------------------------------------------------------------
    // Query service
    // -----------------------------------------------------------------

    /// The caller's own slots, earliest start first.
    pub async fn list_own_slots(&self, owner_id: DbId) -> Result<Vec<Slot>, SwapError> {
        SlotRepo::list_by_owner(&self.pool, owner_id)
            .await
            .map_err(map_db_error)
    }

    /// Marketplace listing: everyone else's SWAPPABLE slots with owner
    /// summaries attached.
    pub async fn list_swappable_slots(
        &self,
        caller_id: DbId,
    ) -> Result<Vec<SwappableSlot>, SwapError> {
        SlotRepo::list_swappable_excluding(&self.pool, caller_id)
            .await
            .map_err(map_db_error)
    }

    /// Pending requests awaiting the caller's response.
    pub async fn list_incoming(
        &self,
        caller_id: DbId,
    ) -> Result<Vec<SwapRequestDetails>, SwapError> {
        SwapRequestRepo::list_incoming(&self.pool, caller_id)
            .await
            .map_err(map_db_error)
    }

    /// Pending requests the caller has open with other users.
    pub async fn list_outgoing(
        &self,
        caller_id: DbId,
    ) -> Result<Vec<SwapRequestDetails>, SwapError> {
        SwapRequestRepo::list_outgoing(&self.pool, caller_id)
            .await
            .map_err(map_db_error)
    }
}
