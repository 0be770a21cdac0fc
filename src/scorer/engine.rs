use super::types::{Constraint, Score};
use super::Evaluator;
use crate::character::CharacterContext;
use crate::data::{GameData, OutfitId};
use crate::modifiers::{Axis, AxisArray, BitmapAxis, Element, ModifierVector, Predicted, Stat};
use crate::slots::Equipment;
use std::sync::OnceLock;

/// Inputs available to a per-axis derivation.
pub struct DeriveInput<'a> {
    pub mods: &'a ModifierVector,
    pub predicted: &'a Predicted,
    pub prime: Stat,
}

/// Maps the raw axis value to the value that is actually scored.
pub type Derivation = fn(&DeriveInput, f64) -> f64;

fn derivations() -> &'static AxisArray<Option<Derivation>> {
    static TABLE: OnceLock<AxisArray<Option<Derivation>>> = OnceLock::new();
    TABLE.get_or_init(|| {
        let mut t: AxisArray<Option<Derivation>> = AxisArray::filled(None);
        t[Axis::Muscle] = Some(|d, _| d.predicted.muscle);
        t[Axis::Mysticality] = Some(|d, _| d.predicted.mysticality);
        t[Axis::Moxie] = Some(|d, _| d.predicted.moxie);
        t[Axis::MaximumHp] = Some(|d, _| d.predicted.hp);
        t[Axis::MaximumMp] = Some(|d, _| d.predicted.mp);
        t[Axis::FamiliarWeight] = Some(|d, v| {
            let v = v + d.mods.get(Axis::HiddenFamiliarWeight);
            if d.mods.get(Axis::FamiliarWeightPercent) < 0.0 {
                v * 0.5
            } else {
                v
            }
        });
        t[Axis::ManaCost] = Some(|d, v| v + d.mods.get(Axis::StackableManaCost));
        t[Axis::Initiative] = Some(|d, v| v + d.mods.get(Axis::InitiativePenalty).min(0.0));
        t[Axis::MeatDrop] = Some(|d, v| {
            v + 100.0
                + d.mods.get(Axis::MeatDropPenalty).min(0.0)
                + d.mods.get(Axis::SporadicMeatDrop)
                + d.mods.get(Axis::MeatBonus) / 10000.0
        });
        t[Axis::ItemDrop] = Some(|d, v| {
            v + 100.0 + d.mods.get(Axis::ItemDropPenalty).min(0.0) + d.mods.get(Axis::SporadicItemDrop)
        });
        t[Axis::WeaponDamage] = Some(|d, v| v + d.mods.get(Axis::WeaponDamagePercent));
        t[Axis::RangedDamage] = Some(|d, v| v + d.mods.get(Axis::RangedDamagePercent));
        t[Axis::SpellDamage] = Some(|d, v| v + d.mods.get(Axis::SpellDamagePercent));
        // Experience is scored as the prime stat's experience: the generic
        // value plus the class-specific axis.
        t[Axis::Experience] = Some(|d, v| v + d.mods.get(d.prime.experience_axis()));
        t[Axis::ColdResistance] = Some(|d, v| resistance(d, v, Element::Cold));
        t[Axis::HotResistance] = Some(|d, v| resistance(d, v, Element::Hot));
        t[Axis::SleazeResistance] = Some(|d, v| resistance(d, v, Element::Sleaze));
        t[Axis::SpookyResistance] = Some(|d, v| resistance(d, v, Element::Spooky));
        t[Axis::StenchResistance] = Some(|d, v| resistance(d, v, Element::Stench));
        t
    })
}

fn resistance(d: &DeriveInput, v: f64, element: Element) -> f64 {
    if d.mods.has_flag(element.immunity()) {
        100.0
    } else if d.mods.has_flag(element.vulnerability()) {
        v - 100.0
    } else {
        v
    }
}

impl Evaluator {
    /// Value of `axis` after derivation, as the scorer sees it.
    pub fn derived_value(&self, axis: Axis, mods: &ModifierVector, ctx: &CharacterContext) -> f64 {
        let predicted = Predicted::compute(mods, ctx);
        let input = DeriveInput {
            mods,
            predicted: &predicted,
            prime: self.prime,
        };
        derive(axis, &input)
    }

    /// Scores a combined vector against this expression.
    pub fn score(&self, mods: &ModifierVector, ctx: &CharacterContext) -> Score {
        let predicted = Predicted::compute(mods, ctx);
        let input = DeriveInput {
            mods,
            predicted: &predicted,
            prime: self.prime,
        };

        let mut failed = false;
        let mut exceeded = false;
        let mut score = 0.0;

        for &axis in &self.active {
            let val = derive(axis, &input);
            if val < self.min[axis] {
                failed = true;
            }
            score += self.weight[axis] * val.min(self.max[axis]);
        }

        if mods.rollover_effect().is_some_and(|e| !e.is_empty()) {
            score += 0.01;
        }
        if score < self.total_min {
            failed = true;
        }
        if score >= self.total_max {
            exceeded = true;
        }

        if self.clownosity > 0 {
            let osity = mods.bitmap_count(BitmapAxis::Clownosity);
            score += osity.min(self.clownosity) as f64;
            if osity < self.clownosity {
                failed = true;
            }
        }
        if self.raveosity > 0 {
            let osity = mods.bitmap_count(BitmapAxis::Raveosity);
            score += osity.min(self.raveosity) as f64;
            if osity < self.raveosity {
                failed = true;
            }
        }

        if !failed
            && !self.flag_mask.is_empty()
            && mods.flags().intersection(self.flag_mask) != self.flag_value
        {
            failed = true;
        }

        Score {
            value: score,
            failed,
            exceeded,
        }
    }

    /// Secondary objective; zero when disabled.
    pub fn tiebreaker_score(&self, mods: &ModifierVector, ctx: &CharacterContext) -> f64 {
        if self.no_tiebreaker {
            return 0.0;
        }
        self.tiebreaker
            .as_ref()
            .map_or(0.0, |tb| tb.score(mods, ctx).value)
    }

    /// Applies the equipment-level constraints to an already computed score:
    /// pinned items, pinned and forbidden outfits, and the bee budget.
    pub fn check_equipment(
        &self,
        mut score: Score,
        outfit: Option<OutfitId>,
        equipment: &Equipment,
        beeosity: u32,
    ) -> Score {
        if !score.failed && !self.pos_equip.iter().all(|id| equipment.contains(*id)) {
            score.failed = true;
        }
        if !score.failed {
            if outfit.is_some_and(|o| self.neg_outfits.contains(&o)) {
                score.failed = true;
            } else if !self.pos_outfits.is_empty()
                && !outfit.is_some_and(|o| self.pos_outfits.contains(&o))
            {
                score.failed = true;
            }
        }
        if beeosity > self.beeosity {
            score.failed = true;
        }
        score
    }

    /// Classifies a single item's flags against the requested booleans.
    pub fn check_constraints(&self, mods: &ModifierVector) -> Constraint {
        let bits = mods.flags().intersection(self.flag_mask);
        if bits.is_empty() {
            return Constraint::Irrelevant;
        }
        if bits.bits() & !self.flag_value.bits() != 0 {
            Constraint::Violates
        } else {
            Constraint::Meets
        }
    }

    /// Score of the character with nothing extra worn.
    pub fn null_score(&self, ctx: &CharacterContext) -> f64 {
        self.score(&ctx.modifiers, ctx).value
    }

    /// The outfit worn in full by `equipment`, if any, in outfit-id order.
    pub fn worn_outfit(data: &GameData, equipment: &Equipment) -> Option<OutfitId> {
        data.outfits
            .iter()
            .find(|o| o.pieces.iter().all(|p| equipment.contains(*p)))
            .map(|o| o.id)
    }
}

fn derive(axis: Axis, input: &DeriveInput) -> f64 {
    let raw = input.mods.get(axis);
    match derivations()[axis] {
        Some(f) => f(input, raw),
        None => raw,
    }
}
