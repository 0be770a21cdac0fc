use super::{Axis, Flag, ModifierVector, Stat};
use crate::character::CharacterContext;

/// Buffed stat: base plus percent bonus (floored) plus flat bonus, never below 1.
pub fn buffed_stat(mods: &ModifierVector, ctx: &CharacterContext, stat: Stat) -> f64 {
    let base = ctx.base_stats.get(stat) as f64;
    let pct = mods.get(stat.percent_axis());
    let flat = mods.get(stat.axis());
    (base + (base * pct / 100.0).floor() + flat).max(1.0)
}

/// Predicted buffed values derived from a combined vector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Predicted {
    pub muscle: f64,
    pub mysticality: f64,
    pub moxie: f64,
    pub hp: f64,
    pub mp: f64,
}

impl Predicted {
    pub fn compute(mods: &ModifierVector, ctx: &CharacterContext) -> Self {
        let muscle = buffed_stat(mods, ctx, Stat::Muscle);
        let mysticality = buffed_stat(mods, ctx, Stat::Mysticality);
        let moxie = buffed_stat(mods, ctx, Stat::Moxie);

        let hp_class = if ctx.prime_stat() == Stat::Muscle { 1.5 } else { 1.0 };
        let hp_base = (muscle + 3.0) * hp_class;
        let hp = (hp_base * (1.0 + mods.get(Axis::MaximumHpPercent) / 100.0)).ceil()
            + mods.get(Axis::MaximumHp);

        let mp_stat = if mods.has_flag(Flag::MoxieControlsMp) {
            moxie.max(mysticality)
        } else {
            mysticality
        };
        let mp_class = if ctx.prime_stat() == Stat::Mysticality { 1.5 } else { 1.0 };
        let mp = (mp_stat * mp_class * (1.0 + mods.get(Axis::MaximumMpPercent) / 100.0)).ceil()
            + mods.get(Axis::MaximumMp);

        Self {
            muscle,
            mysticality,
            moxie,
            hp: hp.max(1.0),
            mp: mp.max(0.0),
        }
    }

    pub fn stat(&self, stat: Stat) -> f64 {
        match stat {
            Stat::Muscle => self.muscle,
            Stat::Mysticality => self.mysticality,
            Stat::Moxie => self.moxie,
        }
    }
}
