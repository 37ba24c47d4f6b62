//! # Inventory Ledger
//!
//! Owned and equipped items for a single owner.
//!
//! ## Invariants
//!
//! - An item is equipped only while the owner holds at least one copy.
//! - Removing the last copy of an equipped item unequips it in the same call.
//! - At most `max_equipped` distinct items are equipped.
//!
//! Multi-owner bookkeeping and locking live in [`crate::engine`]; every
//! method here acts on one owner's ledger and either completes or leaves it
//! untouched.

use std::collections::{BTreeMap, BTreeSet};

use crate::catalog::ItemId;
use crate::engine::OwnerId;
use crate::error::{EconomyError, EconomyResult};

/// Default number of equip slots.
pub const DEFAULT_MAX_EQUIPPED: usize = 3;

/// One owned item as shown to the presentation layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InventorySlot {
    /// The item template.
    pub item_id: ItemId,
    /// Number of copies held (always > 0).
    pub quantity: u32,
    /// Whether the item is equipped.
    pub equipped: bool,
}

/// One owner's collection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Inventory {
    owner_id: OwnerId,
    owned: BTreeMap<ItemId, u32>,
    equipped: BTreeSet<ItemId>,
    max_equipped: usize,
}

impl Inventory {
    /// Creates an empty inventory.
    #[must_use]
    pub fn new(owner_id: OwnerId, max_equipped: usize) -> Self {
        Self {
            owner_id,
            owned: BTreeMap::new(),
            equipped: BTreeSet::new(),
            max_equipped,
        }
    }

    /// The owner of this inventory.
    #[inline]
    #[must_use]
    pub const fn owner_id(&self) -> OwnerId {
        self.owner_id
    }

    /// Copies held of an item (0 if absent).
    #[inline]
    #[must_use]
    pub fn quantity(&self, item_id: ItemId) -> u32 {
        self.owned.get(&item_id).copied().unwrap_or(0)
    }

    /// Returns true if at least one copy is held.
    #[inline]
    #[must_use]
    pub fn owns(&self, item_id: ItemId) -> bool {
        self.owned.contains_key(&item_id)
    }

    /// Returns true if the item is equipped.
    #[inline]
    #[must_use]
    pub fn is_equipped(&self, item_id: ItemId) -> bool {
        self.equipped.contains(&item_id)
    }

    /// Total copies across all items.
    #[must_use]
    pub fn total_items(&self) -> u64 {
        self.owned.values().map(|q| u64::from(*q)).sum()
    }

    /// Fails with `ItemNotOwned` unless the item is held.
    ///
    /// # Errors
    ///
    /// Returns `EconomyError::ItemNotOwned` if the owner holds no copy.
    pub fn require(&self, item_id: ItemId) -> EconomyResult<()> {
        if self.owns(item_id) {
            Ok(())
        } else {
            Err(self.not_owned(item_id))
        }
    }

    /// Adds one copy of an item. Returns the new quantity.
    ///
    /// # Errors
    ///
    /// Returns `EconomyError::ArithmeticOverflow` if the count would
    /// overflow; the inventory is unchanged in that case.
    pub fn add(&mut self, item_id: ItemId) -> EconomyResult<u32> {
        let next = self
            .quantity(item_id)
            .checked_add(1)
            .ok_or(EconomyError::ArithmeticOverflow)?;
        self.owned.insert(item_id, next);
        Ok(next)
    }

    /// Removes one copy of an item. Returns the remaining quantity.
    ///
    /// Removing the last copy of an equipped item unequips it.
    ///
    /// # Errors
    ///
    /// Returns `EconomyError::ItemNotOwned` if no copy is held.
    pub fn remove(&mut self, item_id: ItemId) -> EconomyResult<u32> {
        let current = self.quantity(item_id);
        if current == 0 {
            return Err(self.not_owned(item_id));
        }

        let remaining = current - 1;
        if remaining == 0 {
            self.equipped.remove(&item_id);
            self.owned.remove(&item_id);
        } else {
            self.owned.insert(item_id, remaining);
        }
        Ok(remaining)
    }

    /// Equips an owned item. Equipping twice is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `EconomyError::ItemNotOwned` if the item is not held, or
    /// `EconomyError::EquipSlotsFull` if every slot is taken.
    pub fn equip(&mut self, item_id: ItemId) -> EconomyResult<()> {
        self.require(item_id)?;
        if self.equipped.contains(&item_id) {
            return Ok(());
        }
        if self.equipped.len() >= self.max_equipped {
            return Err(EconomyError::EquipSlotsFull {
                capacity: self.max_equipped,
            });
        }
        self.equipped.insert(item_id);
        Ok(())
    }

    /// Unequips an item. Returns true if it was equipped.
    pub fn unequip(&mut self, item_id: ItemId) -> bool {
        self.equipped.remove(&item_id)
    }

    /// All owned items in id order.
    #[must_use]
    pub fn list_owned(&self) -> Vec<InventorySlot> {
        self.owned
            .iter()
            .map(|(item_id, quantity)| InventorySlot {
                item_id: *item_id,
                quantity: *quantity,
                equipped: self.equipped.contains(item_id),
            })
            .collect()
    }

    /// Equipped item ids in id order.
    #[must_use]
    pub fn list_equipped(&self) -> Vec<ItemId> {
        self.equipped.iter().copied().collect()
    }

    /// Creates a snapshot of the inventory for rollback.
    #[must_use]
    pub fn snapshot(&self) -> InventorySnapshot {
        InventorySnapshot {
            owned: self.owned.clone(),
            equipped: self.equipped.clone(),
        }
    }

    /// Restores inventory from a snapshot (rollback).
    pub fn restore(&mut self, snapshot: InventorySnapshot) {
        self.owned = snapshot.owned;
        self.equipped = snapshot.equipped;
    }

    fn not_owned(&self, item_id: ItemId) -> EconomyError {
        EconomyError::ItemNotOwned {
            owner_id: self.owner_id,
            item_id,
        }
    }
}

/// Snapshot of inventory state for transactional rollback.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InventorySnapshot {
    owned: BTreeMap<ItemId, u32>,
    equipped: BTreeSet<ItemId>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_and_list() {
        let mut inv = Inventory::new(1, DEFAULT_MAX_EQUIPPED);
        assert_eq!(inv.add(5).unwrap(), 1);
        assert_eq!(inv.add(5).unwrap(), 2);
        inv.add(2).unwrap();

        let owned = inv.list_owned();
        assert_eq!(owned.len(), 2);
        assert_eq!(owned[0], InventorySlot { item_id: 2, quantity: 1, equipped: false });
        assert_eq!(owned[1].quantity, 2);
        assert_eq!(inv.total_items(), 3);
    }

    #[test]
    fn test_remove_missing_item() {
        let mut inv = Inventory::new(9, DEFAULT_MAX_EQUIPPED);
        assert_eq!(
            inv.remove(4),
            Err(EconomyError::ItemNotOwned { owner_id: 9, item_id: 4 })
        );
    }

    #[test]
    fn test_equip_requires_ownership() {
        let mut inv = Inventory::new(1, DEFAULT_MAX_EQUIPPED);
        assert!(matches!(inv.equip(3), Err(EconomyError::ItemNotOwned { .. })));
        inv.add(3).unwrap();
        inv.equip(3).unwrap();
        inv.equip(3).unwrap();
        assert_eq!(inv.list_equipped(), vec![3]);
    }

    #[test]
    fn test_remove_last_copy_unequips() {
        let mut inv = Inventory::new(1, DEFAULT_MAX_EQUIPPED);
        inv.add(3).unwrap();
        inv.equip(3).unwrap();
        inv.remove(3).unwrap();
        assert!(!inv.is_equipped(3));
        assert!(inv.list_equipped().is_empty());
    }

    #[test]
    fn test_remove_one_of_many_keeps_equip() {
        let mut inv = Inventory::new(1, DEFAULT_MAX_EQUIPPED);
        inv.add(3).unwrap();
        inv.add(3).unwrap();
        inv.equip(3).unwrap();
        assert_eq!(inv.remove(3).unwrap(), 1);
        assert!(inv.is_equipped(3));
    }

    #[test]
    fn test_equip_slots_are_bounded() {
        let mut inv = Inventory::new(1, 2);
        for id in 1..=3 {
            inv.add(id).unwrap();
        }
        inv.equip(1).unwrap();
        inv.equip(2).unwrap();
        assert_eq!(inv.equip(3), Err(EconomyError::EquipSlotsFull { capacity: 2 }));
        assert!(inv.unequip(1));
        inv.equip(3).unwrap();
        assert!(!inv.unequip(1));
    }

    #[test]
    fn test_add_then_remove_round_trips() {
        let mut inv = Inventory::new(1, DEFAULT_MAX_EQUIPPED);
        inv.add(7).unwrap();
        inv.equip(7).unwrap();
        let before = inv.clone();

        inv.add(8).unwrap();
        inv.remove(8).unwrap();
        assert_eq!(inv, before);

        inv.add(7).unwrap();
        inv.remove(7).unwrap();
        assert_eq!(inv, before);
    }

    #[test]
    fn test_snapshot_restore() {
        let mut inv = Inventory::new(1, DEFAULT_MAX_EQUIPPED);
        inv.add(1).unwrap();
        let snapshot = inv.snapshot();

        inv.add(2).unwrap();
        inv.equip(1).unwrap();
        inv.remove(1).unwrap();

        inv.restore(snapshot);
        assert_eq!(inv.quantity(1), 1);
        assert_eq!(inv.quantity(2), 0);
        assert!(inv.list_equipped().is_empty());
    }
}
