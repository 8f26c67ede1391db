//! Status helper enums mapping to SMALLINT lookup tables.
//!
//! Each enum variant's discriminant matches the seed data (1-based) in the
//! corresponding `*_statuses` database table.

/// Status ID type matching SMALLINT in the database.
pub type StatusId = i16;

/// Raised when a row carries a status id with no enum counterpart.
#[derive(Debug, thiserror::Error)]
#[error("Unknown status id {0}")]
pub struct UnknownStatus(pub StatusId);

macro_rules! define_status_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident = $val:expr ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[repr(i16)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum $name {
            $( $(#[$vmeta])* $variant = $val ),+
        }

        impl $name {
            /// Return the database status ID.
            pub fn id(self) -> StatusId {
                self as StatusId
            }
        }

        impl From<$name> for StatusId {
            fn from(value: $name) -> Self {
                value as StatusId
            }
        }

        impl TryFrom<StatusId> for $name {
            type Error = UnknownStatus;

            fn try_from(value: StatusId) -> Result<Self, Self::Error> {
                $(
                    if value == $val {
                        return Ok($name::$variant);
                    }
                )+
                Err(UnknownStatus(value))
            }
        }
    };
}

define_status_enum! {
    /// Slot lifecycle status.
    SlotStatus {
        /// Owned and not offered for trade.
        Busy = 1,
        /// Offered on the marketplace.
        Swappable = 2,
        /// Pinned by exactly one pending swap request.
        SwapPending = 3,
    }
}

define_status_enum! {
    /// Swap request lifecycle status. Accepted and Rejected are terminal.
    SwapRequestStatus {
        Pending = 1,
        Accepted = 2,
        Rejected = 3,
    }
}

impl SlotStatus {
    /// Whether an owner may set this status directly.
    ///
    /// `SwapPending` is only ever entered and left as a side effect of
    /// swap-request creation and resolution.
    pub fn owner_settable(self) -> bool {
        matches!(self, SlotStatus::Busy | SlotStatus::Swappable)
    }

    /// Whether the slot is frozen by a pending negotiation.
    pub fn is_pinned(self) -> bool {
        self == SlotStatus::SwapPending
    }
}

impl SwapRequestStatus {
    /// Terminal requests are immutable.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            SwapRequestStatus::Accepted | SwapRequestStatus::Rejected
        )
    }
}
