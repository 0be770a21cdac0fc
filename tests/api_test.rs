mod common;

use common::*;
use gearforge::api::{describe_expression, load_dataset, maximize, set_character, GearForgeState};
use gearforge::modifiers::Axis;
use gearforge::slots::EquipSlot;
use std::fs;

fn loaded_state() -> (GearForgeState, tempfile::TempDir) {
    let data = DataBuilder::new()
        .item(hat(1, "lucky hat").modifier(Axis::ItemDrop, 10.0))
        .item(hat(2, "luckier hat").modifier(Axis::ItemDrop, 20.0))
        .item(accessory(3, "ring").modifier(Axis::MaximumHp, 25.0))
        .build();
    let mut ctx = clubber(&[2, 3]);
    ctx.equipment = wearing(&[(EquipSlot::Hat, 1)]);

    let dir = tempfile::tempdir().unwrap();
    let data_path = dir.path().join("game.json");
    let char_path = dir.path().join("character.json");
    fs::write(&data_path, serde_json::to_string(&data).unwrap()).unwrap();
    fs::write(&char_path, serde_json::to_string(&ctx).unwrap()).unwrap();

    let state = GearForgeState::default();
    let summary = load_dataset(
        &state,
        data_path.to_str().unwrap(),
        char_path.to_str().unwrap(),
        &None,
    )
    .unwrap();
    assert!(summary.contains("3 items"), "{}", summary);
    (state, dir)
}

#[test]
fn test_calls_before_load_fail() {
    let state = GearForgeState::default();
    let err = maximize(&state, "item", None).unwrap_err();
    assert!(err.contains("Dataset not loaded"));
    let err = describe_expression(&state, "item", None).unwrap_err();
    assert!(err.contains("Dataset not loaded"));
}

#[test]
fn test_missing_files_are_reported() {
    let state = GearForgeState::default();
    assert!(load_dataset(&state, "/no/such/game.json", "/no/such/char.json", &None).is_err());
    assert!(state.data.lock().unwrap().is_none());
}

#[test]
fn test_describe_expression() {
    let (state, _dir) = loaded_state();
    let summary = describe_expression(&state, "2 item, min 40 hp, equip ring", None).unwrap();

    let item = summary.weights.iter().find(|w| w.axis == "Item Drop").unwrap();
    assert_eq!(item.weight, 2.0);
    assert_eq!(item.min, None);
    let hp = summary.weights.iter().find(|w| w.axis == "Maximum HP").unwrap();
    assert_eq!(hp.min, Some(40.0));
    assert_eq!(summary.pinned_items, vec!["ring".to_string()]);
    assert_eq!(summary.null_score, 200.0);
}

#[test]
fn test_describe_rejects_bad_expression() {
    let (state, _dir) = loaded_state();
    assert!(describe_expression(&state, "10 charisma", None).is_err());
}

#[test]
fn test_maximize_through_state() {
    let (state, _dir) = loaded_state();
    let result = maximize(&state, "item", None).unwrap();
    assert_eq!(result.item_in(EquipSlot::Hat).map(|i| i.0), Some(2));
    assert!(approx(result.score, 120.0));
}

#[test]
fn test_set_character_replaces_snapshot() {
    let (state, _dir) = loaded_state();
    set_character(&state, clubber(&[1])).unwrap();
    let result = maximize(&state, "item", None).unwrap();
    assert_eq!(result.item_in(EquipSlot::Hat).map(|i| i.0), Some(1));
    assert!(approx(result.score, 110.0));
}
