use crate::character::{CharacterContext, OwnedFamiliar};
use crate::data::{FamiliarId, FamiliarRole, GameData, ItemId, ItemTag, OutfitId, SetBonus};
use crate::modifiers::{Axis, BitmapAxis, Flag, ModifierVector};
use crate::scorer::{Evaluator, Score};
use crate::slots::{EquipSlot, Equipment};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use strum::IntoEnumIterator;

/// A complete hypothetical loadout.
#[derive(Debug, Clone, PartialEq)]
pub struct Speculation {
    pub equipment: Equipment,
    pub familiar: Option<OwnedFamiliar>,
    pub enthroned: Option<FamiliarId>,
    pub bjorned: Option<FamiliarId>,
    pub card: Option<ItemId>,
    pub options: BTreeMap<ItemId, String>,
}

/// Everything the comparison order looks at, computed once per loadout.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Evaluation {
    pub score: Score,
    pub tiebreaker: f64,
    /// Slots and riders that differ from what is worn now.
    pub changes: u32,
    pub beeosity: u32,
    /// Worn copies that only exist after folding a sibling.
    pub folded: u32,
    pub outfit: Option<OutfitId>,
}

/// The combined vector of a loadout plus facts found while building it.
#[derive(Debug, Clone)]
pub struct Combined {
    pub mods: ModifierVector,
    pub outfit: Option<OutfitId>,
    /// Two worn items share a mutex bit.
    pub conflict: bool,
}

impl Speculation {
    pub fn from_current(ctx: &CharacterContext) -> Self {
        Self {
            equipment: ctx.equipment.clone(),
            familiar: ctx.familiar,
            enthroned: ctx.enthroned,
            bjorned: ctx.bjorned,
            card: ctx.card,
            options: ctx.item_options.clone(),
        }
    }

    pub fn wears(&self, data: &GameData, tag: ItemTag) -> bool {
        self.equipment
            .items()
            .filter(|(slot, _)| *slot != EquipSlot::Familiar)
            .filter_map(|(_, id)| data.item(id))
            .any(|item| item.has_tag(tag))
    }

    pub fn combined(&self, data: &GameData, ctx: &CharacterContext) -> Combined {
        let mut total = ctx.modifiers.clone();
        let armed = self.equipment[EquipSlot::Weapon].is_some();
        let familiar = self.familiar.and_then(|f| data.familiar(f.id));
        let mut mutex_seen = 0u64;
        let mut conflict = false;

        for (slot, id) in self.equipment.items() {
            let Some(item) = data.item(id) else {
                continue;
            };

            if slot == EquipSlot::Familiar {
                if let Some(fam) = familiar {
                    total = total.combine(fam.worn_modifiers(item));
                }
                continue;
            }

            let mods = &item.modifiers;
            if mods.has_flag(Flag::Unarmed) && armed {
                continue;
            }
            let mutex = mods.raw_bitmap(BitmapAxis::Mutex);
            if mutex & mutex_seen != 0 {
                conflict = true;
            }
            mutex_seen |= mutex;

            total = total.combine(mods);
            if let Some(effect) = mods.intrinsic_effect().and_then(|e| data.effect(e)) {
                total = total.combine(effect);
            }
            if let Some(option) = self.options.get(&id).and_then(|o| item.option(o)) {
                total = total.combine(&option.modifiers);
            }
            if item.has_tag(ItemTag::CarrierHat) {
                if let Some(rider) = self.enthroned.and_then(|f| data.familiar(f)) {
                    total = total.combine(&rider.carried_modifiers);
                }
            }
            if item.has_tag(ItemTag::CarrierBack) {
                if let Some(rider) = self.bjorned.and_then(|f| data.familiar(f)) {
                    total = total.combine(&rider.carried_modifiers);
                }
            }
            if item.has_tag(ItemTag::CardSleeve) {
                if let Some(card) = self.card.and_then(|c| data.item(c)) {
                    total = total.combine(&card.modifiers);
                }
            }
        }

        let outfit = Evaluator::worn_outfit(data, &self.equipment);
        if let Some(record) = outfit.and_then(|o| data.outfit(o)) {
            total = total
                .combine(&record.modifiers)
                .with_outfit(record.name.clone());
        }

        for synergy in &data.synergies {
            if synergy.members.iter().all(|m| self.equipment.contains(*m)) {
                total = total.combine(&synergy.modifiers);
            }
        }

        for bonus in SetBonus::iter() {
            let Some(per_unit) = data.set_bonus(bonus) else {
                continue;
            };
            let units = bonus.units(&total);
            if units > 0.0 {
                total = total.combine(&per_unit.scaled(units));
            }
        }

        if let (Some(owned), Some(fam)) = (self.familiar, familiar) {
            total = total.combine(&fam.modifiers);
            if fam.underwater {
                total = total.with_flag(Flag::UnderwaterFamiliar);
            }
            let roles = role_bonus(owned.weight, fam.roles.iter().copied(), &total);
            total = total.combine(&roles);
        }

        Combined {
            mods: total,
            outfit,
            conflict,
        }
    }

    pub fn evaluate(&self, ev: &Evaluator, data: &GameData, ctx: &CharacterContext) -> Evaluation {
        let combined = self.combined(data, ctx);
        let mut score = ev.score(&combined.mods, ctx);
        if combined.conflict {
            score.failed = true;
        }
        let beeosity = self.beeosity(data, ctx);
        let score = ev.check_equipment(score, combined.outfit, &self.equipment, beeosity);

        Evaluation {
            score,
            tiebreaker: ev.tiebreaker_score(&combined.mods, ctx),
            changes: self.changes(ctx),
            beeosity,
            folded: self.folded(ctx),
            outfit: combined.outfit,
        }
    }

    fn changes(&self, ctx: &CharacterContext) -> u32 {
        let riders = [
            self.familiar.map(|f| f.id) != ctx.familiar.map(|f| f.id),
            self.enthroned != ctx.enthroned,
            self.bjorned != ctx.bjorned,
            self.card != ctx.card,
        ];
        self.equipment.differences(&ctx.equipment) + riders.iter().filter(|c| **c).count() as u32
    }

    fn beeosity(&self, data: &GameData, ctx: &CharacterContext) -> u32 {
        if !ctx.in_beecore() {
            return 0;
        }
        self.equipment
            .items()
            .filter(|(slot, _)| *slot != EquipSlot::Familiar)
            .filter_map(|(_, id)| data.item(id))
            .map(|item| item.beeosity())
            .sum()
    }

    fn folded(&self, ctx: &CharacterContext) -> u32 {
        let mut seen: BTreeMap<ItemId, u32> = BTreeMap::new();
        for (_, id) in self.equipment.items() {
            *seen.entry(id).or_default() += 1;
        }
        seen.into_iter()
            .map(|(id, worn)| worn.saturating_sub(ctx.owned_count(id)))
            .sum()
    }
}

/// Effective familiar weight for a role, after flat and percent modifiers.
fn effective_weight(base: u32, mods: &ModifierVector, role_weight: Axis) -> f64 {
    let flat = base as f64
        + mods.get(Axis::FamiliarWeight)
        + mods.get(Axis::HiddenFamiliarWeight)
        + mods.get(role_weight);
    let pct = mods.get(Axis::FamiliarWeightPercent);
    (flat * (1.0 + pct / 100.0)).max(0.0)
}

fn fairy_curve(weight: f64) -> f64 {
    if weight <= 0.0 {
        return 0.0;
    }
    ((55.0 * weight).sqrt() + weight - 3.0).max(0.0)
}

/// What the active familiar's roles add to the combined vector.
fn role_bonus(
    base: u32,
    roles: impl Iterator<Item = FamiliarRole>,
    mods: &ModifierVector,
) -> ModifierVector {
    let mut out = ModifierVector::new();
    for role in roles {
        out = match role {
            FamiliarRole::Fairy => {
                let w = effective_weight(base, mods, Axis::FairyWeight);
                let eff = 1.0 + mods.get(Axis::FairyEffectiveness) / 100.0;
                let bonus = fairy_curve(w) * eff;
                out.with(Axis::ItemDrop, bonus)
            }
            FamiliarRole::Leprechaun => {
                let w = effective_weight(base, mods, Axis::LeprechaunWeight);
                let eff = 1.0 + mods.get(Axis::LeprechaunEffectiveness) / 100.0;
                let bonus = 2.0 * fairy_curve(w) * eff;
                out.with(Axis::MeatDrop, bonus)
            }
            FamiliarRole::Volleyball => {
                let w = effective_weight(base, mods, Axis::VolleyballWeight);
                let eff = 1.0 + mods.get(Axis::VolleyballEffectiveness) / 100.0;
                let bonus = out.get(Axis::Experience) + w.sqrt() * eff;
                out.with(Axis::Experience, bonus)
            }
            FamiliarRole::Sombrero => {
                let w = effective_weight(base, mods, Axis::SombreroWeight);
                let eff = 1.0 + mods.get(Axis::SombreroEffectiveness) / 100.0;
                let bonus = out.get(Axis::Experience)
                    + (w.sqrt() + mods.get(Axis::SombreroBonus)) * eff;
                out.with(Axis::Experience, bonus)
            }
        };
    }
    out
}

/// Orders two evaluations; `Greater` means `a` is the better loadout.
pub fn compare(a: &Evaluation, b: &Evaluation) -> Ordering {
    b.score
        .failed
        .cmp(&a.score.failed)
        .then_with(|| a.score.value.total_cmp(&b.score.value))
        .then_with(|| a.tiebreaker.total_cmp(&b.tiebreaker))
        .then_with(|| b.changes.cmp(&a.changes))
        .then_with(|| b.beeosity.cmp(&a.beeosity))
        .then_with(|| b.folded.cmp(&a.folded))
}
