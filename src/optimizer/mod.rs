pub mod candidates;
pub mod options;
pub mod runner;
pub mod shortlist;
pub mod speculation;

use self::options::InnerChoices;
use self::runner::{Search, SearchOutcome, SearchSpace};
use self::shortlist::Ranker;
use crate::character::CharacterContext;
use crate::config::MaximizerPrefs;
use crate::data::{GameData, ItemId};
use crate::error::{GearForgeError, GfResult};
use crate::scorer::Evaluator;
use crate::slots::{EquipSlot, Equipment};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Instant;
use tracing::info;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SlotAssignment {
    pub slot: EquipSlot,
    pub item: Option<String>,
    pub item_id: Option<ItemId>,
    /// Differs from what is worn now.
    pub changed: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Highlight {
    pub axis: String,
    pub value: f64,
}

/// The chosen loadout and how it scored.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct MaximizerResult {
    pub expression: String,
    pub score: f64,
    pub tiebreaker: f64,
    pub exceeded: bool,
    pub equipment: Equipment,
    pub slots: Vec<SlotAssignment>,
    pub familiar: Option<String>,
    pub enthroned: Option<String>,
    pub bjorned: Option<String>,
    pub card: Option<String>,
    /// Item name to chosen option.
    pub item_options: BTreeMap<String, String>,
    pub outfit: Option<String>,
    /// Derived values of every axis the expression weights or bounds.
    pub highlights: Vec<Highlight>,
    pub changes: u32,
    pub evaluated: u64,
}

impl MaximizerResult {
    pub fn item_in(&self, slot: EquipSlot) -> Option<ItemId> {
        self.equipment[slot]
    }
}

pub struct Maximizer<'a> {
    data: &'a GameData,
    ctx: &'a CharacterContext,
    prefs: &'a MaximizerPrefs,
}

impl<'a> Maximizer<'a> {
    pub fn new(data: &'a GameData, ctx: &'a CharacterContext, prefs: &'a MaximizerPrefs) -> Self {
        Self { data, ctx, prefs }
    }

    pub fn maximize(&self, expr: &str) -> GfResult<MaximizerResult> {
        let ev = Evaluator::parse(expr, self.data, self.ctx, self.prefs)?;
        self.run(&ev, expr)
    }

    /// Searches with an already parsed expression.
    pub fn run(&self, ev: &Evaluator, expr: &str) -> GfResult<MaximizerResult> {
        let start = Instant::now();
        let (data, ctx, prefs) = (self.data, self.ctx, self.prefs);

        let mut pool = candidates::enumerate(ev, data, ctx, prefs);
        let inner = InnerChoices::choose(ev, data, ctx, &pool);
        let ranker = Ranker {
            ev,
            data,
            ctx,
            prefs,
            inner: &inner,
        };
        let lists = shortlist::build(&ranker, &mut pool);

        let space = SearchSpace::new(ev, data, ctx, &pool, &lists, &inner);
        let outcome = Search::new(&space)
            .run()
            .ok_or(GearForgeError::Unsatisfiable {
                score: f64::NEG_INFINITY,
            })?;

        info!(
            "Maximized '{}' to {:.2} after {} configurations in {:.2?}",
            expr,
            outcome.eval.score.value,
            outcome.evaluated,
            start.elapsed()
        );

        if outcome.eval.score.failed {
            return Err(GearForgeError::Unsatisfiable {
                score: outcome.eval.score.value,
            });
        }
        Ok(self.describe(ev, expr, &outcome))
    }

    fn describe(&self, ev: &Evaluator, expr: &str, outcome: &SearchOutcome) -> MaximizerResult {
        let data = self.data;
        let best = &outcome.best;
        let item_name = |id: ItemId| data.item(id).map_or_else(|| id.to_string(), |i| i.name.clone());
        let familiar_name = |id| data.familiar(id).map(|f| f.race.clone());

        let slots = EquipSlot::core()
            .map(|slot| SlotAssignment {
                slot,
                item: best.equipment[slot].map(item_name),
                item_id: best.equipment[slot],
                changed: best.equipment[slot] != self.ctx.equipment[slot],
            })
            .collect();

        let mods = best.combined(data, self.ctx).mods;
        let highlights = ev
            .active_axes()
            .iter()
            .map(|&axis| Highlight {
                axis: axis.to_string(),
                value: ev.derived_value(axis, &mods, self.ctx),
            })
            .collect();

        MaximizerResult {
            expression: expr.to_string(),
            score: outcome.eval.score.value,
            tiebreaker: outcome.eval.tiebreaker,
            exceeded: outcome.eval.score.exceeded,
            equipment: best.equipment.clone(),
            slots,
            familiar: best.familiar.and_then(|f| familiar_name(f.id)),
            enthroned: best.enthroned.and_then(familiar_name),
            bjorned: best.bjorned.and_then(familiar_name),
            card: best.card.map(item_name),
            item_options: best
                .options
                .iter()
                .filter(|(id, _)| best.equipment.contains(**id))
                .map(|(id, choice)| (item_name(*id), choice.clone()))
                .collect(),
            outfit: outcome
                .eval
                .outfit
                .and_then(|o| data.outfit(o))
                .map(|o| o.name.clone()),
            highlights,
            changes: outcome.eval.changes,
            evaluated: outcome.evaluated,
        }
    }
}

/// Parses `expr` and returns the best loadout for it.
pub fn maximize(
    expr: &str,
    data: &GameData,
    ctx: &CharacterContext,
    prefs: &MaximizerPrefs,
) -> GfResult<MaximizerResult> {
    Maximizer::new(data, ctx, prefs).maximize(expr)
}
