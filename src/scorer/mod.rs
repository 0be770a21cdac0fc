pub mod engine;
pub mod expression;
pub mod types;

pub use types::{Constraint, Score};

use crate::character::{CharacterContext, OwnedFamiliar};
use crate::config::MaximizerPrefs;
use crate::data::{GameData, ItemId, OutfitId};
use crate::error::GfResult;
use crate::modifiers::{Axis, AxisArray, FlagSet, Stat};
use crate::slots::EquipSlot;
use std::collections::BTreeSet;
use strum::EnumCount;

/// A parsed maximizer expression: per-axis weights and bounds plus every
/// hard constraint and search knob the expression can set. Immutable once
/// [`Evaluator::parse`] returns.
#[derive(Debug, Clone)]
pub struct Evaluator {
    pub weight: AxisArray<f64>,
    pub min: AxisArray<f64>,
    pub max: AxisArray<f64>,
    pub total_min: f64,
    pub total_max: f64,

    pub flag_mask: FlagSet,
    pub flag_value: FlagSet,

    pub clownosity: u32,
    pub raveosity: u32,
    pub beeosity: u32,

    /// Required hand count for the main weapon; 0 means any.
    pub hands: u8,
    /// Positive requires melee, negative requires ranged.
    pub melee: i32,
    pub weapon_type: Option<String>,
    pub require_club: bool,
    pub require_shield: bool,
    pub require_utensil: bool,
    pub require_knife: bool,
    pub require_accordion: bool,
    pub effective: bool,

    pub current: bool,
    pub no_tiebreaker: bool,
    pub dump: u8,

    pub pos_outfits: BTreeSet<OutfitId>,
    pub neg_outfits: BTreeSet<OutfitId>,
    pub pos_equip: BTreeSet<ItemId>,
    pub neg_equip: BTreeSet<ItemId>,
    /// Extra familiars to try, from `switch`.
    pub familiars: Vec<OwnedFamiliar>,
    /// Per-slot enable counters, indexed by `EquipSlot as usize`.
    pub slots: [i32; EquipSlot::COUNT],
    /// Option names every option item must use when it offers them.
    pub forced_options: BTreeSet<String>,

    pub(crate) active: Vec<Axis>,
    pub(crate) prime: Stat,
    pub(crate) tiebreaker: Option<Box<Evaluator>>,
}

impl Evaluator {
    fn blank(ctx: &CharacterContext, prefs: &MaximizerPrefs) -> Self {
        Self {
            weight: AxisArray::filled(0.0),
            min: AxisArray::filled(f64::NEG_INFINITY),
            max: AxisArray::filled(f64::INFINITY),
            total_min: f64::NEG_INFINITY,
            total_max: f64::INFINITY,
            flag_mask: FlagSet::EMPTY,
            flag_value: FlagSet::EMPTY,
            clownosity: 0,
            raveosity: 0,
            beeosity: 2,
            hands: 0,
            melee: 0,
            weapon_type: None,
            require_club: false,
            require_shield: false,
            require_utensil: false,
            require_knife: false,
            require_accordion: false,
            effective: false,
            current: !ctx.can_interact || prefs.always_current,
            no_tiebreaker: false,
            dump: 0,
            pos_outfits: BTreeSet::new(),
            neg_outfits: BTreeSet::new(),
            pos_equip: BTreeSet::new(),
            neg_equip: BTreeSet::new(),
            familiars: Vec::new(),
            slots: [0; EquipSlot::COUNT],
            forced_options: BTreeSet::new(),
            active: Vec::new(),
            prime: ctx.prime_stat(),
            tiebreaker: None,
        }
    }

    /// Parses `expr` against the given data and character. The built-in
    /// tiebreaker from `prefs` is parsed first and its bounds seed the
    /// user's bounds.
    pub fn parse(
        expr: &str,
        data: &GameData,
        ctx: &CharacterContext,
        prefs: &MaximizerPrefs,
    ) -> GfResult<Self> {
        prefs.validate()?;

        let mut tiebreaker = Evaluator::blank(ctx, prefs);
        tiebreaker.apply_expression(&prefs.tiebreaker, data, ctx)?;
        tiebreaker.refresh_active();

        let mut ev = Evaluator::blank(ctx, prefs);
        ev.min = tiebreaker.min.clone();
        ev.max = tiebreaker.max.clone();
        ev.apply_expression(expr, data, ctx)?;
        ev.dump = ev.dump.max(prefs.verbose_dump);
        ev.refresh_active();
        ev.tiebreaker = Some(Box::new(tiebreaker));
        Ok(ev)
    }

    fn refresh_active(&mut self) {
        self.active = self
            .weight
            .iter()
            .filter(|(axis, w)| *w != 0.0 || self.min[*axis] > f64::NEG_INFINITY)
            .map(|(axis, _)| axis)
            .collect();
    }

    /// Axes that contribute to the score or carry a lower bound.
    pub fn active_axes(&self) -> &[Axis] {
        &self.active
    }

    pub fn slot_counter(&self, slot: EquipSlot) -> i32 {
        self.slots[slot as usize]
    }

    /// Whether `axis` carries any weight in the user's expression.
    pub fn weights(&self, axis: Axis) -> bool {
        self.weight[axis] != 0.0
    }
}
