use crate::types::DbId;

/// Domain error taxonomy for slot and swap-request operations.
///
/// Every validation failure is detected before any mutation, so a caller
/// that receives one of the terminal variants can assume nothing changed.
/// [`SwapError::is_retryable`] partitions the taxonomy: only
/// `ConcurrencyConflict` and `Storage` are worth retrying with the same
/// arguments.
#[derive(Debug, thiserror::Error)]
pub enum SwapError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("User {user_id} does not own slot {slot_id}")]
    NotOwner { user_id: DbId, slot_id: DbId },

    #[error("User {user_id} is not the responder of swap request {request_id}")]
    NotAuthorized { user_id: DbId, request_id: DbId },

    #[error("Slot {slot_id} already belongs to the requester")]
    SelfSwap { slot_id: DbId },

    #[error("Slot {slot_id} is not open for swapping")]
    NotSwappable { slot_id: DbId },

    #[error("Slot {slot_id} has a pending swap and cannot be changed")]
    InvalidTransition { slot_id: DbId },

    #[error("Swap request {request_id} has already been actioned")]
    AlreadyActioned { request_id: DbId },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Concurrent update conflict: {0}")]
    ConcurrencyConflict(String),

    #[error("Storage failure: {0}")]
    Storage(String),
}

impl SwapError {
    /// Whether the caller may retry the same call unchanged.
    ///
    /// Conflicts and storage outages are transient; every other variant
    /// requires the caller to change arguments or state first.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SwapError::ConcurrencyConflict(_) | SwapError::Storage(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_variants() {
        assert!(SwapError::ConcurrencyConflict("lock timeout".into()).is_retryable());
        assert!(SwapError::Storage("connection reset".into()).is_retryable());
    }

    #[test]
    fn test_terminal_variants_are_not_retryable() {
        let terminal = [
            SwapError::NotFound {
                entity: "Slot",
                id: 1,
            },
            SwapError::NotOwner {
                user_id: 1,
                slot_id: 2,
            },
            SwapError::NotAuthorized {
                user_id: 1,
                request_id: 2,
            },
            SwapError::SelfSwap { slot_id: 1 },
            SwapError::NotSwappable { slot_id: 1 },
            SwapError::InvalidTransition { slot_id: 1 },
            SwapError::AlreadyActioned { request_id: 1 },
            SwapError::Validation("title must not be empty".into()),
        ];
        for err in terminal {
            assert!(!err.is_retryable(), "{err} should be terminal");
        }
    }

    #[test]
    fn test_not_found_message_names_entity() {
        let err = SwapError::NotFound {
            entity: "SwapRequest",
            id: 42,
        };
        assert_eq!(
            err.to_string(),
            "Entity not found: SwapRequest with id 42"
        );
    }
}
