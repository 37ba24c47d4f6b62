//! # Market Exchange
//!
//! Sells owned items for Goodwill Coin at the fixed price of their tier.
//! The only place items turn into currency, so the total credited by a
//! run of sales always equals the sum of tier prices of the items sold.

use std::sync::Arc;

use crate::catalog::{Catalog, ItemId};
use crate::error::EconomyResult;
use crate::inventory::Inventory;
use crate::progression::ProgressionState;
use crate::rarity::{RarityTable, RarityTier};

/// Result of a sale.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Sale {
    /// The item sold.
    pub item_id: ItemId,
    /// Its tier.
    pub tier: RarityTier,
    /// Goodwill Coin credited.
    pub price: u64,
    /// True if the sale removed an equipped item.
    pub unequipped: bool,
    /// Balance after the credit.
    pub balance: u64,
}

/// Converts items into currency.
#[derive(Clone, Debug)]
pub struct MarketExchange {
    catalog: Arc<Catalog>,
    rarity: Arc<RarityTable>,
}

impl MarketExchange {
    /// Creates a market over shared catalog data.
    #[must_use]
    pub fn new(catalog: Arc<Catalog>, rarity: Arc<RarityTable>) -> Self {
        Self { catalog, rarity }
    }

    /// Sell price of an item without selling it.
    ///
    /// # Errors
    ///
    /// Returns `EconomyError::UnknownItem` if the item is not in the catalog.
    pub fn quote(&self, item_id: ItemId) -> EconomyResult<u64> {
        let tier = self.catalog.item(item_id)?.rarity;
        Ok(self.rarity.price_for(tier))
    }

    /// Removes one copy of `item_id` and credits its price.
    ///
    /// # Errors
    ///
    /// Returns `EconomyError::ItemNotOwned` if the item is absent, or
    /// `EconomyError::ArithmeticOverflow` if the balance would overflow.
    /// Neither ledger changes on error.
    pub fn sell(
        &self,
        inventory: &mut Inventory,
        progression: &mut ProgressionState,
        item_id: ItemId,
    ) -> EconomyResult<Sale> {
        inventory.require(item_id)?;
        let tier = self.catalog.item(item_id)?.rarity;
        let price = self.rarity.price_for(tier);

        let snapshot = inventory.snapshot();
        let was_equipped = inventory.is_equipped(item_id);
        inventory.remove(item_id)?;
        let balance = match progression.credit_currency(price) {
            Ok(balance) => balance,
            Err(err) => {
                inventory.restore(snapshot);
                return Err(err);
            }
        };

        let sale = Sale {
            item_id,
            tier,
            price,
            unequipped: was_equipped && !inventory.is_equipped(item_id),
            balance,
        };
        tracing::debug!(
            owner_id = inventory.owner_id(),
            item_id,
            tier = %tier,
            price,
            balance,
            "item sold"
        );
        Ok(sale)
    }
}
