mod common;

use common::*;
use gearforge::character::{CharacterContext, Path, DUAL_WIELD_SKILL};
use gearforge::config::MaximizerPrefs;
use gearforge::data::{FamiliarRole, FamiliarSpecial, GameData, ItemId, ItemTag};
use gearforge::modifiers::{Axis, BitmapAxis, Flag, Stat};
use gearforge::optimizer::{maximize, MaximizerResult};
use gearforge::slots::{EquipSlot, ItemKind, ACCESSORY_SLOTS};
use gearforge::GearForgeError;
use rstest::rstest;
use std::collections::BTreeSet;

fn run(expr: &str, data: &GameData, ctx: &CharacterContext) -> MaximizerResult {
    maximize(expr, data, ctx, &MaximizerPrefs::default()).expect("maximize should succeed")
}

fn accessories(result: &MaximizerResult) -> BTreeSet<ItemId> {
    ACCESSORY_SLOTS
        .iter()
        .filter_map(|s| result.item_in(*s))
        .collect()
}

fn ids(raw: &[u32]) -> BTreeSet<ItemId> {
    raw.iter().map(|i| ItemId(*i)).collect()
}

#[test]
fn test_picks_better_hat() {
    let data = DataBuilder::new()
        .item(hat(1, "cheap hat").modifier(Axis::ItemDrop, 5.0))
        .item(hat(2, "lucky hat").modifier(Axis::ItemDrop, 10.0))
        .build();
    let result = run("item", &data, &clubber(&[1, 2]));

    assert_eq!(result.item_in(EquipSlot::Hat), Some(ItemId(2)));
    assert!(approx(result.score, 110.0));
    assert_eq!(result.changes, 1);
    assert!(result.evaluated > 0);
}

#[test]
fn test_fills_all_three_accessories() {
    let data = DataBuilder::new()
        .item(accessory(1, "ring").modifier(Axis::ItemDrop, 5.0))
        .item(accessory(2, "bracelet").modifier(Axis::ItemDrop, 3.0))
        .item(accessory(3, "belt").modifier(Axis::ItemDrop, 15.0))
        .item(accessory(4, "earring").modifier(Axis::ItemDrop, 5.0))
        .build();
    let result = run("item", &data, &clubber(&[1, 2, 3, 4]));

    assert_eq!(accessories(&result), ids(&[1, 3, 4]));
    assert!(approx(result.score, 125.0));
}

#[test]
fn test_single_equip_worn_once() {
    let data = DataBuilder::new()
        .item(accessory(1, "special ring").modifier(Axis::ItemDrop, 10.0).flag(Flag::Single))
        .item(accessory(2, "plain ring").modifier(Axis::ItemDrop, 1.0))
        .build();
    let mut ctx = clubber(&[2]);
    ctx.inventory.insert(ItemId(1), 2);
    let result = run("item", &data, &ctx);

    let worn: Vec<ItemId> = ACCESSORY_SLOTS.iter().filter_map(|s| result.item_in(*s)).collect();
    assert_eq!(worn.iter().filter(|id| **id == ItemId(1)).count(), 1);
    assert!(approx(result.score, 111.0));
}

#[test]
fn test_min_bound_trades_score_for_feasibility() {
    let data = DataBuilder::new()
        .item(hat(1, "meat hat").modifier(Axis::MeatDrop, 20.0))
        .item(hat(2, "sturdy hat").modifier(Axis::MaximumHp, 30.0).modifier(Axis::MeatDrop, 5.0))
        .build();
    let ctx = clubber(&[1, 2]);

    assert_eq!(run("meat", &data, &ctx).item_in(EquipSlot::Hat), Some(ItemId(1)));

    let result = run("min 50 hp, 1 meat", &data, &ctx);
    assert_eq!(result.item_in(EquipSlot::Hat), Some(ItemId(2)));
    let hp = result
        .highlights
        .iter()
        .find(|h| h.axis == "Maximum HP")
        .expect("bounded axis is highlighted");
    assert!(hp.value >= 50.0);
}

#[test]
fn test_unreachable_min_is_unsatisfiable() {
    let data = DataBuilder::new()
        .item(hat(1, "lucky hat").modifier(Axis::ItemDrop, 10.0))
        .build();
    let err = maximize("min 200 item", &data, &clubber(&[1]), &MaximizerPrefs::default()).unwrap_err();
    assert!(matches!(err, GearForgeError::Unsatisfiable { .. }));
}

#[test]
fn test_equip_pins_item() {
    let data = DataBuilder::new()
        .item(hat(1, "meat hat").modifier(Axis::MeatDrop, 20.0))
        .item(hat(2, "plain hat").modifier(Axis::Muscle, 1.0))
        .build();
    let result = run("meat, equip plain hat", &data, &clubber(&[1, 2]));
    assert_eq!(result.item_in(EquipSlot::Hat), Some(ItemId(2)));
}

#[test]
fn test_negative_equip_excludes_item() {
    let data = DataBuilder::new()
        .item(hat(1, "cheap hat").modifier(Axis::ItemDrop, 5.0))
        .item(hat(2, "lucky hat").modifier(Axis::ItemDrop, 10.0))
        .build();
    let result = run("item, -equip lucky hat", &data, &clubber(&[1, 2]));
    assert_eq!(result.item_in(EquipSlot::Hat), Some(ItemId(1)));
}

#[test]
fn test_clownosity_shortfall_fails() {
    let data = DataBuilder::new()
        .item(hat(1, "clown wig").bitmap(BitmapAxis::Clownosity, 0b01))
        .item(accessory(2, "clown shoes").bitmap(BitmapAxis::Clownosity, 0b10))
        .build();
    let ctx = clubber(&[1, 2]);

    let err = maximize("clownosity", &data, &ctx, &MaximizerPrefs::default()).unwrap_err();
    assert!(matches!(err, GearForgeError::Unsatisfiable { .. }));

    let result = run("2 clownosity", &data, &ctx);
    assert_eq!(result.item_in(EquipSlot::Hat), Some(ItemId(1)));
    assert!(accessories(&result).contains(&ItemId(2)));
}

#[test]
fn test_requested_flag_forces_item() {
    let data = DataBuilder::new()
        .item(accessory(1, "grippy glove").flag(Flag::NeverFumble))
        .items((2..=4).map(|i| accessory(i, &format!("ring {}", i)).modifier(Axis::ItemDrop, 5.0)))
        .build();
    let result = run("item, never fumble", &data, &clubber(&[1, 2, 3, 4]));

    assert!(accessories(&result).contains(&ItemId(1)));
    assert!(approx(result.score, 110.0));
}

#[rstest]
#[case::hammer_wins(10.0, ItemId(1), None)]
#[case::club_and_buckler_win(14.0, ItemId(2), Some(ItemId(3)))]
fn test_two_handed_weapon_blocks_offhand(
    #[case] buckler_damage: f64,
    #[case] weapon: ItemId,
    #[case] offhand: Option<ItemId>,
) {
    let data = DataBuilder::new()
        .item(
            ItemBuilder::new(1, "war hammer", ItemKind::Weapon)
                .hands(2)
                .modifier(Axis::WeaponDamage, 15.0),
        )
        .item(ItemBuilder::new(2, "club", ItemKind::Weapon).modifier(Axis::WeaponDamage, 3.0))
        .item(
            ItemBuilder::new(3, "buckler", ItemKind::Offhand)
                .tag(ItemTag::Shield)
                .modifier(Axis::WeaponDamage, buckler_damage),
        )
        .build();
    let result = run("weapon damage", &data, &clubber(&[1, 2, 3]));

    assert_eq!(result.item_in(EquipSlot::Weapon), Some(weapon));
    assert_eq!(result.item_in(EquipSlot::Offhand), offhand);
}

#[test]
fn test_dual_wield_uses_second_weapon() {
    let data = DataBuilder::new()
        .item(ItemBuilder::new(1, "small club", ItemKind::Weapon).modifier(Axis::WeaponDamage, 3.0))
        .item(ItemBuilder::new(2, "big club", ItemKind::Weapon).modifier(Axis::WeaponDamage, 6.0))
        .build();
    let mut ctx = clubber(&[1, 2]);
    ctx.skills.insert(DUAL_WIELD_SKILL.to_string());
    let result = run("weapon damage", &data, &ctx);

    let worn = ids(&[1, 2]);
    assert!(result.item_in(EquipSlot::Weapon).is_some_and(|w| worn.contains(&w)));
    assert!(result.item_in(EquipSlot::Offhand).is_some_and(|o| worn.contains(&o)));
    assert_ne!(result.item_in(EquipSlot::Weapon), result.item_in(EquipSlot::Offhand));
    assert!(approx(result.score, 9.0));
}

#[rstest]
#[case("item, type sword", ItemId(2))]
#[case("item, club", ItemId(1))]
fn test_weapon_type_filters(#[case] expr: &str, #[case] expected: ItemId) {
    let data = DataBuilder::new()
        .item(
            ItemBuilder::new(1, "spiked club", ItemKind::Weapon)
                .weapon_type("club")
                .modifier(Axis::ItemDrop, 5.0),
        )
        .item(
            ItemBuilder::new(2, "rusty sword", ItemKind::Weapon)
                .weapon_type("sword")
                .modifier(Axis::ItemDrop, 3.0),
        )
        .build();
    let result = run(expr, &data, &clubber(&[1, 2]));
    assert_eq!(result.item_in(EquipSlot::Weapon), Some(expected));
}

#[test]
fn test_stat_requirement_excludes_item() {
    let data = DataBuilder::new()
        .item(hat(1, "heavy helm").modifier(Axis::ItemDrop, 50.0).requires(Stat::Muscle, 100))
        .item(hat(2, "lucky hat").modifier(Axis::ItemDrop, 10.0))
        .build();
    let result = run("item", &data, &clubber(&[1, 2]));
    assert_eq!(result.item_in(EquipSlot::Hat), Some(ItemId(2)));
}

fn bugbear(fancy_hat: f64) -> GameData {
    DataBuilder::new()
        .item(hat(1, "fancy hat").modifier(Axis::ItemDrop, fancy_hat))
        .item(hat(2, "bugbear beanie").modifier(Axis::ItemDrop, 1.0))
        .item(ItemBuilder::new(3, "bugbear bungguard", ItemKind::Pants).modifier(Axis::ItemDrop, 1.0))
        .outfit(1, "Bugbear Costume", &[2, 3], mods().with(Axis::ItemDrop, 20.0))
        .build()
}

#[test]
fn test_outfit_bonus_beats_single_piece() {
    let result = run("item", &bugbear(8.0), &clubber(&[1, 2, 3]));

    assert_eq!(result.outfit.as_deref(), Some("Bugbear Costume"));
    assert_eq!(result.item_in(EquipSlot::Hat), Some(ItemId(2)));
    assert_eq!(result.item_in(EquipSlot::Pants), Some(ItemId(3)));
    assert!(approx(result.score, 122.0));
}

#[test]
fn test_forbidden_outfit_is_never_completed() {
    let result = run("item, -outfit bugbear", &bugbear(8.0), &clubber(&[1, 2, 3]));

    assert_eq!(result.outfit, None);
    assert_eq!(result.item_in(EquipSlot::Hat), Some(ItemId(1)));
}

#[test]
fn test_pinned_outfit_is_worn_even_when_worse() {
    let result = run("item, outfit bugbear", &bugbear(40.0), &clubber(&[1, 2, 3]));

    assert_eq!(result.outfit.as_deref(), Some("Bugbear Costume"));
    assert_eq!(result.item_in(EquipSlot::Hat), Some(ItemId(2)));
}

fn synergy_world(bonus: f64) -> GameData {
    DataBuilder::new()
        .item(accessory(1, "left brimstone bracelet").modifier(Axis::ItemDrop, 1.0))
        .item(accessory(2, "right brimstone bracelet").modifier(Axis::ItemDrop, 1.0))
        .items((3..=5).map(|i| accessory(i, &format!("ring {}", i)).modifier(Axis::ItemDrop, 10.0)))
        .synergy("Bracelet Pair", &[1, 2], mods().with(Axis::ItemDrop, bonus))
        .build()
}

#[rstest]
#[case::synergy_wins(30.0, &[1, 2, 3], 142.0)]
#[case::synergy_loses(5.0, &[3, 4, 5], 130.0)]
fn test_synergy_against_alternatives(
    #[case] bonus: f64,
    #[case] expected: &[u32],
    #[case] score: f64,
) {
    let result = run("item", &synergy_world(bonus), &clubber(&[1, 2, 3, 4, 5]));

    assert_eq!(accessories(&result), ids(expected));
    assert!(approx(result.score, score));
}

#[test]
fn test_carried_familiar_fills_crown() {
    let data = DataBuilder::new()
        .item(hat(1, "Crown of Thrones").tag(ItemTag::CarrierHat))
        .item(hat(2, "lucky hat").modifier(Axis::ItemDrop, 5.0))
        .familiar(carrying(familiar(1, "Baby Gravy Fairy"), mods().with(Axis::ItemDrop, 10.0)))
        .build();
    let mut ctx = clubber(&[1, 2]);
    ctx.familiars = vec![owned_familiar(1, 5)];
    let result = run("item", &data, &ctx);

    assert_eq!(result.item_in(EquipSlot::Hat), Some(ItemId(1)));
    assert_eq!(result.enthroned.as_deref(), Some("Baby Gravy Fairy"));
    assert!(approx(result.score, 110.0));
}

#[test]
fn test_switch_familiar_uses_role_bonus() {
    let data = DataBuilder::new()
        .familiar(with_role(familiar(1, "Leprechaun"), FamiliarRole::Leprechaun))
        .familiar(with_role(familiar(2, "Baby Gravy Fairy"), FamiliarRole::Fairy))
        .build();
    let ctx = CharacterContext::builder()
        .class(gearforge::character::CharacterClass::SealClubber)
        .familiar(Some(owned_familiar(1, 10)))
        .familiars(vec![owned_familiar(2, 10)])
        .build();

    assert_eq!(run("item", &data, &ctx).familiar.as_deref(), Some("Leprechaun"));

    let result = run("item, switch baby gravy fairy", &data, &ctx);
    assert_eq!(result.familiar.as_deref(), Some("Baby Gravy Fairy"));
    let expected = 100.0 + (550.0f64).sqrt() + 7.0;
    assert!((result.score - expected).abs() < 1e-3);
}

#[test]
fn test_familiar_item_goes_in_familiar_slot() {
    let data = DataBuilder::new()
        .item(ItemBuilder::new(1, "lead necklace", ItemKind::Familiar).modifier(Axis::FamiliarWeight, 3.0))
        .familiar(familiar(1, "Leprechaun"))
        .build();
    let mut ctx = clubber(&[1]);
    ctx.familiar = Some(owned_familiar(1, 10));
    let result = run("familiar weight", &data, &ctx);

    assert_eq!(result.item_in(EquipSlot::Familiar), Some(ItemId(1)));
}

#[rstest]
#[case::one_copy(1, None)]
#[case::two_copies(2, Some(ItemId(1)))]
fn test_hatrack_wears_hat(#[case] copies: u32, #[case] on_head: Option<ItemId>) {
    let data = DataBuilder::new()
        .item(
            hat(1, "party hat")
                .modifier(Axis::MeatDrop, 5.0)
                .familiar_modifier(Axis::MeatDrop, 12.0),
        )
        .familiar(with_special(familiar(1, "Mad Hatrack"), FamiliarSpecial::Hatrack))
        .build();
    let mut ctx = clubber(&[]);
    ctx.inventory.insert(ItemId(1), copies);
    ctx.familiar = Some(owned_familiar(1, 5));
    let result = run("meat", &data, &ctx);

    assert_eq!(result.item_in(EquipSlot::Familiar), Some(ItemId(1)));
    assert_eq!(result.item_in(EquipSlot::Hat), on_head);
}

#[test]
fn test_bee_budget() {
    let data = DataBuilder::new()
        .item(hat(1, "bubble hat").modifier(Axis::ItemDrop, 20.0))
        .item(hat(2, "lucky hat").modifier(Axis::ItemDrop, 5.0))
        .build();
    let mut ctx = clubber(&[1, 2]);
    ctx.path = Path::BeesHateYou;

    assert_eq!(run("item", &data, &ctx).item_in(EquipSlot::Hat), Some(ItemId(2)));
    assert_eq!(run("item, 3 beeosity", &data, &ctx).item_in(EquipSlot::Hat), Some(ItemId(1)));
}

#[test]
fn test_bees_ignored_off_path() {
    let data = DataBuilder::new()
        .item(hat(1, "bubble hat").modifier(Axis::ItemDrop, 20.0))
        .build();
    assert_eq!(run("item", &data, &clubber(&[1])).item_in(EquipSlot::Hat), Some(ItemId(1)));
}

#[test]
fn test_current_keeps_unhelpful_gear() {
    let data = DataBuilder::new()
        .item(hat(1, "helmet turtle").modifier(Axis::DamageAbsorption, 5.0))
        .build();
    let mut ctx = clubber(&[]);
    ctx.equipment = wearing(&[(EquipSlot::Hat, 1)]);
    let result = run("meat, current", &data, &ctx);

    assert_eq!(result.item_in(EquipSlot::Hat), Some(ItemId(1)));
    assert_eq!(result.changes, 0);
}

#[test]
fn test_named_slot_limits_search() {
    let data = DataBuilder::new()
        .item(hat(1, "lucky hat").modifier(Axis::ItemDrop, 10.0))
        .item(accessory(2, "ring").modifier(Axis::ItemDrop, 5.0))
        .item(ItemBuilder::new(3, "old sweatpants", ItemKind::Pants).modifier(Axis::MaximumHp, 10.0))
        .build();
    let mut ctx = clubber(&[1, 2]);
    ctx.equipment = wearing(&[(EquipSlot::Pants, 3)]);
    let result = run("item, hat", &data, &ctx);

    assert_eq!(result.item_in(EquipSlot::Hat), Some(ItemId(1)));
    assert!(accessories(&result).is_empty());
    assert_eq!(result.item_in(EquipSlot::Pants), Some(ItemId(3)));
}

#[test]
fn test_negative_slot_is_left_alone() {
    let data = DataBuilder::new()
        .item(hat(1, "helmet turtle"))
        .item(hat(2, "lucky hat").modifier(Axis::ItemDrop, 10.0))
        .build();
    let mut ctx = clubber(&[2]);
    ctx.equipment = wearing(&[(EquipSlot::Hat, 1)]);
    let result = run("item, -hat", &data, &ctx);

    assert_eq!(result.item_in(EquipSlot::Hat), Some(ItemId(1)));
}

#[test]
fn test_total_max_stops_search() {
    let data = DataBuilder::new()
        .item(hat(1, "lucky hat").modifier(Axis::ItemDrop, 10.0))
        .build();
    let result = run("100 max, item", &data, &clubber(&[1]));
    assert!(result.exceeded);
}

#[test]
fn test_option_item_picks_best_setting() {
    let data = DataBuilder::new()
        .item(
            hat(1, "adjustable hat")
                .option("meat", mods().with(Axis::MeatDrop, 10.0))
                .option("item", mods().with(Axis::ItemDrop, 10.0)),
        )
        .build();
    let result = run("item", &data, &clubber(&[1]));

    assert_eq!(result.item_in(EquipSlot::Hat), Some(ItemId(1)));
    assert_eq!(result.item_options.get("adjustable hat").map(String::as_str), Some("item"));
    assert!(approx(result.score, 110.0));
}

#[test]
fn test_folded_sibling_counts_as_available() {
    let data = DataBuilder::new()
        .item(hat(1, "origami hat").fold_group("paper").modifier(Axis::ItemDrop, 10.0))
        .item(accessory(2, "origami ring").fold_group("paper"))
        .build();
    let ctx = clubber(&[2]);

    let result = run("item, hat", &data, &ctx);
    assert_eq!(result.item_in(EquipSlot::Hat), Some(ItemId(1)));

    let prefs = MaximizerPrefs {
        allow_foldables: false,
        ..Default::default()
    };
    let result = maximize("item, hat", &data, &ctx, &prefs).unwrap();
    assert_eq!(result.item_in(EquipSlot::Hat), None);
}

#[rstest]
#[case(1, None, 110.0)]
#[case(2, Some(ItemId(2)), 115.0)]
fn test_fold_group_shares_owned_copies(
    #[case] copies: u32,
    #[case] ring: Option<ItemId>,
    #[case] score: f64,
) {
    let data = DataBuilder::new()
        .item(hat(1, "paper hat").fold_group("paper").modifier(Axis::ItemDrop, 10.0))
        .item(accessory(2, "paper ring").fold_group("paper").modifier(Axis::ItemDrop, 5.0))
        .build();
    let mut ctx = clubber(&[]);
    ctx.inventory.insert(ItemId(1), copies);
    let result = run("item", &data, &ctx);

    assert_eq!(result.item_in(EquipSlot::Hat), Some(ItemId(1)));
    assert_eq!(accessories(&result).into_iter().next(), ring);
    assert!(approx(result.score, score));
}

#[test]
fn test_equal_worn_accessories_stay_put() {
    let data = DataBuilder::new()
        .items((1..=4).map(|id| accessory(id, &format!("ring {}", id)).modifier(Axis::ItemDrop, 6.0)))
        .build();
    let mut ctx = clubber(&[1]);
    ctx.equipment = wearing(&[(EquipSlot::Acc1, 4), (EquipSlot::Acc2, 3), (EquipSlot::Acc3, 2)]);
    let result = run("item", &data, &ctx);

    assert!(approx(result.score, 118.0));
    assert_eq!(result.changes, 0);
    assert_eq!(result.item_in(EquipSlot::Acc1), Some(ItemId(4)));
    assert_eq!(result.item_in(EquipSlot::Acc3), Some(ItemId(2)));
}

#[test]
fn test_result_serializes_camel_case() {
    let data = DataBuilder::new()
        .item(hat(1, "lucky hat").modifier(Axis::ItemDrop, 10.0))
        .build();
    let result = run("item", &data, &clubber(&[1]));
    let json = serde_json::to_value(&result).unwrap();

    assert_eq!(json["expression"], "item");
    assert!(json["itemOptions"].is_object());
    assert_eq!(json["equipment"]["hat"], 1);
    let hat = json["slots"]
        .as_array()
        .and_then(|slots| slots.iter().find(|s| s["slot"] == "hat"))
        .expect("hat slot reported");
    assert_eq!(hat["item"], "lucky hat");
    assert_eq!(hat["changed"], true);
}
