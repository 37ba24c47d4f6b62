//! End-to-end scenarios against the built-in balance data.

use goodwill_economy::{
    EconomyEngine, EconomyError, EconomyEvent, FixedRolls, QuestReward, RarityTier, RollSource,
    SeededRolls,
};

const PLAYER: u64 = 7;

fn engine() -> EconomyEngine {
    EconomyEngine::builtin().unwrap()
}

#[test]
fn test_fifteen_low_rolls_give_fifteen_commons() {
    let engine = engine();
    let mut rolls = FixedRolls::new(vec![0.10, 0.0]).unwrap();

    let opening = engine.open_pack(PLAYER, 1, 15, &mut rolls).unwrap();
    assert_eq!(opening.tier_counts(), [15, 0, 0, 0]);
    assert!((opening.luck_factor - 1.0).abs() < f64::EPSILON);

    let owned = engine.list_owned(PLAYER);
    assert_eq!(owned.len(), 1);
    assert_eq!(owned[0].item_id, 1);
    assert_eq!(owned[0].quantity, 15);
}

#[test]
fn test_legendary_sells_for_two_thousand() {
    let engine = engine();
    engine.add_item(PLAYER, 301).unwrap();
    assert_eq!(engine.quote(301).unwrap(), 2000);

    let sale = engine.sell(PLAYER, 301).unwrap();
    assert_eq!(sale.price, 2000);
    assert_eq!(sale.tier, RarityTier::Legendary);
    assert_eq!(sale.balance, 2000);
    assert!(engine.list_owned(PLAYER).is_empty());
}

#[test]
fn test_same_item_synthesis_changes_nothing() {
    let engine = engine();
    engine.add_item(PLAYER, 1).unwrap();
    engine.add_item(PLAYER, 1).unwrap();
    let before = engine.view(PLAYER).unwrap();
    let mut rolls = FixedRolls::new(vec![0.0]).unwrap();

    let result = engine.synthesize(PLAYER, 1, 1, &mut rolls);
    assert!(matches!(result, Err(EconomyError::SameItem(1))));
    assert_eq!(engine.view(PLAYER).unwrap(), before);
    assert_eq!(rolls.consumed(), 0);
}

#[test]
fn test_failed_operations_leave_ledgers_unchanged() {
    let engine = engine();
    engine.add_item(PLAYER, 101).unwrap();
    engine.equip(PLAYER, 101).unwrap();
    engine.credit_currency(PLAYER, 120).unwrap();
    engine.adjust_goodwill(PLAYER, 250.0).unwrap();
    let before = engine.view(PLAYER).unwrap();
    engine.drain_events(PLAYER);

    let mut rolls = SeededRolls::new(5);
    assert!(engine.sell(PLAYER, 302).is_err());
    assert!(engine.synthesize(PLAYER, 101, 2, &mut rolls).is_err());
    assert!(engine.remove_item(PLAYER, 3).is_err());
    assert!(engine.equip(PLAYER, 4).is_err());
    assert!(engine.purchase_pack(PLAYER, 1, 2, &mut rolls).is_err());
    assert!(engine.open_pack(PLAYER, 99, 1, &mut rolls).is_err());
    assert!(engine.debit_currency(PLAYER, 121).is_err());
    assert!(engine.grant_experience(PLAYER, 0).is_err());
    assert!(engine.adjust_goodwill(PLAYER, f64::NAN).is_err());
    assert!(engine
        .complete_quest(
            PLAYER,
            QuestReward {
                experience: 10,
                goodwill: f64::INFINITY,
                currency: 5,
            }
        )
        .is_err());

    assert_eq!(engine.view(PLAYER).unwrap(), before);
    assert!(engine.drain_events(PLAYER).is_empty());
}

#[test]
fn test_failed_first_operations_create_no_account() {
    let engine = engine();
    let mut rolls = SeededRolls::new(11);

    assert!(engine.debit_currency(42, 5).is_err());
    assert!(engine.open_pack(43, 999, 1, &mut rolls).is_err());
    assert!(engine.purchase_pack(44, 1, 1, &mut rolls).is_err());
    assert!(engine.grant_experience(45, 0).is_err());
    assert!(engine.adjust_goodwill(46, f64::NAN).is_err());
    assert!(engine
        .complete_quest(
            47,
            QuestReward {
                experience: 10,
                goodwill: f64::INFINITY,
                currency: 0,
            }
        )
        .is_err());
    assert!(engine.add_item(48, 9999).is_err());
    assert!(engine.sell(49, 1).is_err());
    assert!(engine.synthesize(50, 1, 2, &mut rolls).is_err());

    assert_eq!(engine.owner_count(), 0);
    for owner_id in 42..=50 {
        assert_eq!(engine.view(owner_id).unwrap(), None);
        assert!(engine.drain_events(owner_id).is_empty());
    }

    // The first successful call still creates the account.
    engine.credit_currency(42, 5).unwrap();
    assert_eq!(engine.owner_count(), 1);
    assert_eq!(engine.view(42).unwrap().map(|view| view.currency_balance), Some(5));
}

#[test]
fn test_goodwill_never_goes_negative() {
    let engine = engine();
    engine.adjust_goodwill(PLAYER, 40.0).unwrap();
    assert!(engine.adjust_goodwill(PLAYER, -100.0).unwrap().abs() < f64::EPSILON);

    let modifiers = engine.modifiers(PLAYER).unwrap();
    assert!((modifiers.exp_multiplier - 1.0).abs() < f64::EPSILON);
    assert!((modifiers.luck_factor - 1.0).abs() < f64::EPSILON);
}

#[test]
fn test_modifiers_track_goodwill() {
    let engine = engine();
    engine.adjust_goodwill(PLAYER, 1000.0).unwrap();
    let modifiers = engine.modifiers(PLAYER).unwrap();

    assert!((modifiers.exp_multiplier - 2.0).abs() < 1e-12);
    assert!((modifiers.luck_factor - 1.5).abs() < 1e-12);
    assert!(modifiers.exp_multiplier > modifiers.luck_factor);
}

#[test]
fn test_upgrade_chance_is_capped_for_huge_luck() {
    let engine = engine();
    engine.adjust_goodwill(PLAYER, 1.0e9).unwrap();
    engine.add_item(PLAYER, 1).unwrap();
    engine.add_item(PLAYER, 2).unwrap();

    // Above the cap: no upgrade, however lucky.
    let mut rolls = FixedRolls::new(vec![0.80, 0.0]).unwrap();
    let outcome = engine.synthesize(PLAYER, 1, 2, &mut rolls).unwrap();
    assert!((outcome.upgrade_chance - 0.75).abs() < f64::EPSILON);
    assert!(!outcome.upgraded());
    assert_eq!(outcome.item.rarity, RarityTier::Common);

    // Below the cap: upgrade to Rare.
    engine.add_item(PLAYER, 2).unwrap();
    let mut rolls = FixedRolls::new(vec![0.74, 0.0]).unwrap();
    let outcome = engine.synthesize(PLAYER, outcome.item.id, 2, &mut rolls).unwrap();
    assert!(outcome.upgraded());
    assert_eq!(outcome.item.rarity, RarityTier::Rare);
    assert_eq!(engine.list_owned(PLAYER).len(), 1);
}

#[test]
fn test_huge_luck_keeps_tiers_ordered() {
    let engine = engine();
    let thresholds = engine.rarity().effective_thresholds(1.0e6).unwrap();
    assert!(thresholds.windows(2).all(|pair| pair[0] < pair[1]));
    assert!(thresholds[1] >= 0.5 - 1e-9);

    let distribution = engine.rarity().distribution(1.0e6).unwrap();
    assert!((distribution.iter().sum::<f64>() - 1.0).abs() < 1e-9);
    assert!(distribution.iter().all(|p| *p > 0.0));
}

#[test]
fn test_purchase_without_funds_rolls_nothing() {
    let engine = engine();
    let mut rolls = FixedRolls::new(vec![0.5]).unwrap();

    let result = engine.purchase_pack(PLAYER, 2, 1, &mut rolls);
    assert_eq!(
        result.map(|purchase| purchase.cost),
        Err(EconomyError::InsufficientBalance {
            required: 150,
            available: 0
        })
    );
    assert_eq!(rolls.consumed(), 0);
    assert!(engine.list_owned(PLAYER).is_empty());
}

#[test]
fn test_currency_is_conserved_across_a_session() {
    let engine = engine();
    let mut rolls = SeededRolls::new(2024);
    let mut credited = 5_000u64;
    let mut spent = 0u64;
    engine.credit_currency(PLAYER, credited).unwrap();

    for round in 0..20u32 {
        if let Ok(purchase) = engine.purchase_pack(PLAYER, 1 + round % 3, 3, &mut rolls) {
            spent += purchase.cost;
        }
        for slot in engine.list_owned(PLAYER).into_iter().take(2) {
            credited += engine.sell(PLAYER, slot.item_id).unwrap().price;
        }
    }

    let view = engine.view(PLAYER).unwrap().unwrap();
    assert_eq!(view.currency_balance, credited - spent);
}

#[test]
fn test_quest_levels_and_events() {
    let engine = engine();
    engine.adjust_goodwill(PLAYER, 1000.0).unwrap();

    let outcome = engine
        .complete_quest(
            PLAYER,
            QuestReward {
                experience: 150,
                goodwill: 20.0,
                currency: 75,
            },
        )
        .unwrap();
    // 150 * 2.0 = 300 experience -> level 4
    assert_eq!(outcome.experience_granted, 300);
    assert_eq!(outcome.level_up.map(|up| (up.from, up.to)), Some((1, 4)));

    let view = engine.view(PLAYER).unwrap().unwrap();
    assert_eq!(view.level, 4);
    assert_eq!(view.currency_balance, 75);
    assert!((view.goodwill_value - 1020.0).abs() < 1e-9);

    let events = engine.drain_events(PLAYER);
    assert!(matches!(events[0], EconomyEvent::QuestCompleted { .. }));
    assert!(matches!(events[1], EconomyEvent::LevelUp(_)));
}

#[test]
fn test_luck_shifts_pack_results() {
    let unlucky = engine();
    let lucky = engine();
    lucky.adjust_goodwill(PLAYER, 8000.0).unwrap();

    let count_commons = |engine: &EconomyEngine| {
        let mut rolls = SeededRolls::new(99);
        let opening = engine.open_pack(PLAYER, 1, 5_000, &mut rolls).unwrap();
        opening.tier_counts()[RarityTier::Common.index()]
    };
    assert!(count_commons(&lucky) < count_commons(&unlucky));
}

#[test]
fn test_custom_config_round_trip() {
    let source = r#"
        [inventory]
        max_equipped = 1

        [[items]]
        id = 1
        title = "Seedling"
        attribute = "environment"
        rarity = "common"

        [[items]]
        id = 2
        title = "Sapling"
        attribute = "environment"
        rarity = "common"

        [[pools]]
        id = 1
        name = "Tiny"
        price = 10
        items = [1, 2]
    "#;
    let config = goodwill_economy::EconomyConfig::from_toml_str(source).unwrap();
    let engine = EconomyEngine::new(config).unwrap();

    engine.add_item(PLAYER, 1).unwrap();
    engine.add_item(PLAYER, 2).unwrap();
    engine.equip(PLAYER, 1).unwrap();
    assert_eq!(
        engine.equip(PLAYER, 2),
        Err(EconomyError::EquipSlotsFull { capacity: 1 })
    );
}

#[test]
fn test_roll_source_by_reference() {
    fn take_three(mut source: impl RollSource) -> Vec<f64> {
        (0..3).map(|_| source.next_roll()).collect()
    }
    let mut rolls = FixedRolls::new(vec![0.25, 0.5]).unwrap();
    let taken = take_three(&mut rolls);
    assert!(taken.iter().zip([0.25, 0.5, 0.25]).all(|(a, b)| (a - b).abs() < f64::EPSILON));
    assert_eq!(rolls.consumed(), 3);
}
