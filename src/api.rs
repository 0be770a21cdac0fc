use crate::character::CharacterContext;
use crate::config::MaximizerPrefs;
use crate::data::loader::load_inventory_file;
use crate::data::{GameData, ItemId};
use crate::optimizer::{Maximizer, MaximizerResult};
use crate::scorer::Evaluator;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Mutex;
use tracing::info;

/// State shared by every service call.
#[derive(Default)]
pub struct GearForgeState {
    pub data: Mutex<Option<GameData>>,
    pub character: Mutex<Option<CharacterContext>>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AxisWeight {
    pub axis: String,
    pub weight: f64,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

/// What an expression asks for, without running a search.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExpressionSummary {
    pub expression: String,
    pub weights: Vec<AxisWeight>,
    pub pinned_items: Vec<String>,
    pub forbidden_items: Vec<String>,
    pub pinned_outfits: Vec<String>,
    pub switch_familiars: Vec<String>,
    pub current: bool,
    pub null_score: f64,
}

/// Service: load the game data and the character, optionally replacing the
/// character's inventory with a TSV listing.
pub fn load_dataset(
    state: &GearForgeState,
    data_path: &str,
    character_path: &str,
    inventory_path: &Option<String>,
) -> Result<String, String> {
    let data = GameData::load_from_file(data_path).map_err(|e| e.to_string())?;
    let mut character = CharacterContext::load_from_file(character_path).map_err(|e| e.to_string())?;

    if let Some(path) = inventory_path {
        character.inventory = load_inventory_file(path, &data).map_err(|e| e.to_string())?;
        info!("Inventory replaced from {}", path);
    }

    let summary = format!(
        "Loaded {} items, {} outfits and {} familiars",
        data.items.len(),
        data.outfits.len(),
        data.familiars.len()
    );

    let mut d_guard = state.data.lock().map_err(|e| e.to_string())?;
    *d_guard = Some(data);

    let mut c_guard = state.character.lock().map_err(|e| e.to_string())?;
    *c_guard = Some(character);

    Ok(summary)
}

/// Service: swap in a new character snapshot, keeping the loaded data.
pub fn set_character(state: &GearForgeState, character: CharacterContext) -> Result<(), String> {
    let mut guard = state.character.lock().map_err(|e| e.to_string())?;
    *guard = Some(character);
    Ok(())
}

/// Service: parse an expression and report its weights and constraints.
pub fn describe_expression(
    state: &GearForgeState,
    expr: &str,
    prefs: Option<MaximizerPrefs>,
) -> Result<ExpressionSummary, String> {
    let d_guard = state.data.lock().map_err(|e| e.to_string())?;
    let data = d_guard.as_ref().ok_or("Dataset not loaded. Load dataset first.")?;
    let c_guard = state.character.lock().map_err(|e| e.to_string())?;
    let ctx = c_guard.as_ref().ok_or("Character not loaded. Load dataset first.")?;
    let prefs = prefs.unwrap_or_default();

    let ev = Evaluator::parse(expr, data, ctx, &prefs).map_err(|e| e.to_string())?;

    let bound = |v: f64| v.is_finite().then_some(v);
    let weights = ev
        .active_axes()
        .iter()
        .map(|&axis| AxisWeight {
            axis: axis.to_string(),
            weight: ev.weight[axis],
            min: bound(ev.min[axis]),
            max: bound(ev.max[axis]),
        })
        .collect();

    Ok(ExpressionSummary {
        expression: expr.to_string(),
        weights,
        pinned_items: item_names(data, &ev.pos_equip),
        forbidden_items: item_names(data, &ev.neg_equip),
        pinned_outfits: ev
            .pos_outfits
            .iter()
            .filter_map(|o| data.outfit(*o))
            .map(|o| o.name.clone())
            .collect(),
        switch_familiars: ev
            .familiars
            .iter()
            .filter_map(|f| data.familiar(f.id))
            .map(|f| f.race.clone())
            .collect(),
        current: ev.current,
        null_score: ev.null_score(ctx),
    })
}

fn item_names(data: &GameData, ids: &BTreeSet<ItemId>) -> Vec<String> {
    ids.iter()
        .filter_map(|id| data.item(*id))
        .map(|i| i.name.clone())
        .collect()
}

/// Service: run the maximizer against the loaded state.
pub fn maximize(
    state: &GearForgeState,
    expr: &str,
    prefs: Option<MaximizerPrefs>,
) -> Result<MaximizerResult, String> {
    let d_guard = state.data.lock().map_err(|e| e.to_string())?;
    let data = d_guard.as_ref().ok_or("Dataset not loaded. Load dataset first.")?;
    let c_guard = state.character.lock().map_err(|e| e.to_string())?;
    let ctx = c_guard.as_ref().ok_or("Character not loaded. Load dataset first.")?;
    let prefs = prefs.unwrap_or_default();

    Maximizer::new(data, ctx, &prefs)
        .maximize(expr)
        .map_err(|e| e.to_string())
}
