//! # Economy Error Types
//!
//! All errors that can occur in the progression and reward economy.
//!
//! Callers must be able to tell user-facing refusals (`ItemNotOwned`,
//! `SameItem`, `InsufficientBalance`, ...) apart from programmer errors
//! (`InvalidState`, `InvalidConfig`, `ArithmeticOverflow`).
//! See [`EconomyError::is_user_recoverable`].

use thiserror::Error;

use crate::catalog::{ItemId, PoolId};
use crate::engine::OwnerId;

/// Errors that can occur in the economy engine.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EconomyError {
    /// A precondition was violated by the caller.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// The owner does not hold the item.
    #[error("item {item_id} is not owned by {owner_id}")]
    ItemNotOwned {
        /// The owner that was checked.
        owner_id: OwnerId,
        /// The missing item.
        item_id: ItemId,
    },

    /// Synthesis was asked to combine an item with itself.
    #[error("cannot synthesize item {0} with itself")]
    SameItem(ItemId),

    /// Currency debit larger than the balance.
    #[error("insufficient balance: need {required}, have {available}")]
    InsufficientBalance {
        /// Amount requested.
        required: u64,
        /// Current balance.
        available: u64,
    },

    /// Every equip slot is already taken.
    #[error("all {capacity} equip slots are in use")]
    EquipSlotsFull {
        /// Maximum number of equipped items.
        capacity: usize,
    },

    /// Pool not found in the catalog.
    #[error("pool not found: {0}")]
    UnknownPool(PoolId),

    /// Item template not found in the catalog.
    #[error("item not found: {0}")]
    UnknownItem(ItemId),

    /// Invalid configuration file.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Arithmetic overflow in a balance, experience or stack count.
    #[error("arithmetic overflow in economic calculation")]
    ArithmeticOverflow,
}

impl EconomyError {
    /// Returns true for refusals the UI should simply report to the user.
    ///
    /// Programmer errors (`InvalidState`, `InvalidConfig`,
    /// `ArithmeticOverflow`) return false and should be treated as fatal
    /// in development.
    #[must_use]
    pub const fn is_user_recoverable(&self) -> bool {
        match self {
            Self::ItemNotOwned { .. }
            | Self::SameItem(_)
            | Self::InsufficientBalance { .. }
            | Self::EquipSlotsFull { .. }
            | Self::UnknownPool(_)
            | Self::UnknownItem(_) => true,
            Self::InvalidState(_) | Self::InvalidConfig(_) | Self::ArithmeticOverflow => false,
        }
    }
}

/// Result type for economy operations.
pub type EconomyResult<T> = Result<T, EconomyError>;
