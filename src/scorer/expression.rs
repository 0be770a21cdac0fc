use super::types::BoundKind;
use super::Evaluator;
use crate::character::{CharacterContext, OwnedFamiliar};
use crate::data::GameData;
use crate::error::{GearForgeError, GfResult};
use crate::modifiers::{Axis, Element, Flag};
use crate::slots::EquipSlot;
use strum::IntoEnumIterator;
use tracing::debug;

/// One `sign? weight? keyword` term.
#[derive(Debug, Clone, PartialEq)]
pub struct Term {
    pub weight: f64,
    /// The weight was written out rather than defaulted to 1.
    pub explicit: bool,
    pub keyword: String,
    /// A comma or the end of input closed the term.
    pub closed: bool,
}

fn is_numeric_start(c: char) -> bool {
    matches!(c, '-' | '+') || c.is_ascii_digit()
}

/// Splits an expression into terms. Input is trimmed and lower-cased. A
/// keyword runs until a comma, or until a sign or digit that follows a space.
///
/// A bare `min` or `max` that is not closed by a comma is a prefix bound and
/// applies to the weighted term after it (`min 50 hp`). Closed by a comma it
/// bounds the axis before it (`1 hp, max`), or the total when there is none.
pub fn tokenize(expr: &str) -> GfResult<Vec<Term>> {
    let lowered = expr.trim().to_lowercase();
    let chars: Vec<char> = lowered.chars().collect();
    let len = chars.len();
    let mut terms = Vec::new();
    let mut pos = 0;

    let rest = |from: usize| chars[from..].iter().collect::<String>();

    while pos < len {
        let start = pos;
        while pos < len && chars[pos].is_whitespace() {
            pos += 1;
        }
        if pos >= len {
            break;
        }

        let mut sign = String::new();
        if chars[pos] == '+' || chars[pos] == '-' {
            sign.push(chars[pos]);
            pos += 1;
        }

        let weight_start = pos;
        while pos < len && (chars[pos].is_ascii_digit() || chars[pos] == '.') {
            pos += 1;
        }
        let weight_text: String = chars[weight_start..pos].iter().collect();

        while pos < len && chars[pos].is_whitespace() {
            pos += 1;
        }

        let keyword: String = if pos < len && chars[pos] == '"' {
            let close = chars[pos + 1..].iter().position(|c| *c == '"');
            match close {
                Some(offset) if offset > 0 => {
                    let inner: String = chars[pos + 1..pos + 1 + offset].iter().collect();
                    pos += offset + 2;
                    inner
                }
                _ => return Err(GearForgeError::Interpret(rest(start))),
            }
        } else {
            let kw_start = pos;
            while pos < len {
                let c = chars[pos];
                if c == ',' {
                    break;
                }
                if is_numeric_start(c) && pos > 0 && chars[pos - 1] == ' ' {
                    break;
                }
                pos += 1;
            }
            chars[kw_start..pos].iter().collect()
        };

        let keyword = keyword.trim().to_string();
        if keyword.is_empty() {
            return Err(GearForgeError::Interpret(rest(start)));
        }

        let closed = pos >= len || chars[pos] == ',';
        if pos < len && chars[pos] == ',' {
            pos += 1;
        }

        let explicit = !weight_text.is_empty();
        let weight = if explicit {
            format!("{}{}", sign, weight_text)
                .parse::<f64>()
                .map_err(|_| GearForgeError::MalformedWeight {
                    weight: format!("{}{}", sign, weight_text),
                    keyword: keyword.clone(),
                })?
        } else if sign == "-" {
            -1.0
        } else {
            1.0
        };

        terms.push(Term {
            weight,
            explicit,
            keyword,
            closed,
        });
    }
    Ok(terms)
}

/// Rewrites the generic abbreviations (`res`, `dmg`, `exp` and the stat
/// prefixes). Returns `None` when no rule applies.
fn expand_abbreviation(keyword: &str) -> Option<String> {
    let mut out = keyword.to_string();
    if let Some(stem) = keyword.strip_suffix(" res") {
        out = format!("{} resistance", stem);
    } else if let Some(stem) = keyword.strip_suffix(" dmg") {
        out = format!("{} damage", stem);
    } else if let Some(stem) = keyword.strip_suffix(" dmg percent") {
        out = format!("{} damage percent", stem);
    } else if let Some(stem) = keyword.strip_suffix(" exp") {
        out = format!("{} experience", stem);
    }
    if Axis::find_name(&out).is_none() {
        for (short, long) in [("mus ", "muscle "), ("mys ", "mysticality "), ("mox ", "moxie ")] {
            if let Some(tail) = out.strip_prefix(short) {
                let candidate = format!("{}{}", long, tail);
                if Axis::find_name(&candidate).is_some() {
                    out = candidate;
                    break;
                }
            }
        }
    }
    (out != keyword).then_some(out)
}

impl Evaluator {
    pub(crate) fn apply_expression(
        &mut self,
        expr: &str,
        data: &GameData,
        ctx: &CharacterContext,
    ) -> GfResult<()> {
        let terms = tokenize(expr)?;

        let mut index: Option<Axis> = None;
        let mut pending: Option<BoundKind> = None;
        let mut had_familiar = false;
        let mut force_current = false;
        let mut equip_bees = 0u32;
        let mut outfit_bees = 0u32;

        for (i, term) in terms.iter().enumerate() {
            let weight = term.weight;
            let keyword = term.keyword.as_str();

            if keyword == "min" || keyword == "max" {
                let kind = if keyword == "min" {
                    BoundKind::Min
                } else {
                    BoundKind::Max
                };
                // `min 50 hp`: a bare bound followed by a weighted term binds to that term.
                let prefix = !term.explicit
                    && !term.closed
                    && terms.get(i + 1).is_some_and(|next| next.explicit);
                if prefix {
                    pending = Some(kind);
                } else {
                    self.set_bound(kind, index, weight);
                }
                continue;
            }

            if let Some(kind) = pending.take() {
                if let Some(axis) = self.single_axis(keyword, ctx) {
                    match kind {
                        BoundKind::Min => self.min[axis] = weight,
                        BoundKind::Max => self.max[axis] = weight,
                    }
                    index = Some(axis);
                    continue;
                }
                self.set_bound(kind, index, 1.0);
            }

            if keyword == "dump" {
                self.dump = weight.max(0.0) as u8;
                continue;
            } else if keyword.starts_with("hand") {
                self.hands = weight.max(0.0) as u8;
                continue;
            } else if keyword.starts_with("tie") {
                self.no_tiebreaker = weight < 0.0;
                continue;
            } else if keyword.starts_with("current") {
                self.current = weight > 0.0;
                force_current = true;
                continue;
            } else if let Some(ty) = keyword.strip_prefix("type ") {
                self.weapon_type = Some(ty.trim().to_string());
                continue;
            } else if keyword == "club" {
                self.require_club = weight > 0.0;
                continue;
            } else if keyword == "shield" {
                self.require_shield = weight > 0.0;
                self.hands = 1;
                continue;
            } else if keyword == "utensil" {
                self.require_utensil = weight > 0.0;
                continue;
            } else if keyword == "knife" {
                self.require_knife = weight > 0.0;
                continue;
            } else if keyword == "accordion" {
                self.require_accordion = weight > 0.0;
                continue;
            } else if keyword == "melee" {
                self.melee = (weight * 2.0) as i32;
                continue;
            } else if keyword == "effective" {
                self.effective = weight > 0.0;
                continue;
            } else if keyword == "empty" {
                for slot in EquipSlot::iter() {
                    let empty = match slot {
                        EquipSlot::CrownOfThrones => ctx.enthroned.is_none(),
                        EquipSlot::BuddyBjorn => ctx.bjorned.is_none(),
                        EquipSlot::CardSleeve => ctx.card.is_none(),
                        s => ctx.equipment[s].is_none(),
                    };
                    let delta = weight as i32 * if empty { 1 } else { -1 };
                    self.slots[slot as usize] += delta;
                }
                continue;
            } else if keyword == "clownosity" {
                self.clownosity = if term.explicit { weight.max(0.0) as u32 } else { 4 };
                continue;
            } else if keyword == "raveosity" {
                self.raveosity = if term.explicit { weight.max(0.0) as u32 } else { 7 };
                continue;
            } else if keyword == "beeosity" {
                self.beeosity = weight.max(0.0) as u32;
                continue;
            } else if keyword == "sea" {
                for flag in [Flag::AdventureUnderwater, Flag::UnderwaterFamiliar] {
                    self.flag_mask.insert(flag);
                    self.flag_value.insert(flag);
                }
                self.forced_options.insert("fish".to_string());
                index = None;
                continue;
            } else if let Some(name) = keyword.strip_prefix("equip ") {
                let item = data
                    .find_item(name)
                    .ok_or_else(|| GearForgeError::UnknownItem(name.trim().to_string()))?;
                if weight > 0.0 {
                    self.pos_equip.insert(item.id);
                    equip_bees += item.beeosity();
                } else {
                    self.neg_equip.insert(item.id);
                }
                continue;
            } else if let Some(name) = keyword.strip_prefix("outfit") {
                let name = name.trim();
                let outfit = if name.is_empty() {
                    data.outfits
                        .iter()
                        .find(|o| o.pieces.iter().all(|p| ctx.is_equipped(*p)))
                } else {
                    data.find_outfit(name)
                }
                .ok_or_else(|| GearForgeError::UnknownOutfit(name.to_string()))?;
                if weight > 0.0 {
                    self.pos_outfits.insert(outfit.id);
                    outfit_bees = outfit_bees.max(data.outfit_beeosity(outfit));
                } else {
                    self.neg_outfits.insert(outfit.id);
                }
                continue;
            } else if let Some(race) = keyword.strip_prefix("switch ") {
                let race = race.trim();
                let record = data
                    .find_familiar(race)
                    .ok_or_else(|| GearForgeError::UnknownFamiliar(race.to_string()))?;
                if had_familiar && weight < 0.0 {
                    continue;
                }
                let fam = ctx.owns_familiar(record.id).or_else(|| {
                    (weight > 1.0).then_some(OwnedFamiliar {
                        id: record.id,
                        weight: weight as u32,
                    })
                });
                had_familiar = fam.is_some();
                if let Some(fam) = fam {
                    let is_current = ctx.familiar.is_some_and(|c| c.id == fam.id);
                    if !is_current
                        && record.can_equip
                        && !self.familiars.iter().any(|f| f.id == fam.id)
                    {
                        self.familiars.push(fam);
                    }
                }
                continue;
            }

            if let Some(slot) = EquipSlot::from_keyword(keyword) {
                self.slots[slot as usize] += weight as i32;
                continue;
            }

            let expanded = match Axis::find_name(keyword) {
                Some(_) => keyword.to_string(),
                None => expand_abbreviation(keyword).unwrap_or_else(|| keyword.to_string()),
            };
            let keyword = expanded.as_str();

            if let Some(axis) = Axis::find_name(keyword) {
                self.weight[axis] = weight;
                index = Some(axis);
                continue;
            }

            index = None;
            match keyword {
                "all resistance" => {
                    for e in Element::iter() {
                        self.weight[e.resistance()] = weight;
                    }
                    continue;
                }
                "elemental damage" => {
                    for e in Element::iter() {
                        self.weight[e.damage()] = weight;
                    }
                    continue;
                }
                "hp regen" => {
                    self.weight[Axis::HpRegenMin] = weight / 2.0;
                    self.weight[Axis::HpRegenMax] = weight / 2.0;
                    continue;
                }
                "mp regen" => {
                    self.weight[Axis::MpRegenMin] = weight / 2.0;
                    self.weight[Axis::MpRegenMax] = weight / 2.0;
                    continue;
                }
                _ => {}
            }

            if let Some(axis) = self.short_axis(keyword, weight, ctx) {
                self.weight[axis] = weight;
                index = Some(axis);
                continue;
            }

            if let Some(flag) = Flag::find_name(keyword) {
                self.flag_mask.insert(flag);
                if weight > 0.0 {
                    self.flag_value.insert(flag);
                }
                continue;
            }

            return Err(GearForgeError::UnrecognizedKeyword(keyword.to_string()));
        }

        if let Some(kind) = pending {
            self.set_bound(kind, index, 1.0);
        }

        if !force_current && self.no_tiebreaker {
            self.current = true;
        }

        self.beeosity = self.beeosity.max(equip_bees).max(outfit_bees);
        self.propagate_fudge();

        debug!(
            "Parsed '{}': {} weighted axes, {} pinned items, {} switch familiars",
            expr,
            self.weight.iter().filter(|(_, w)| *w != 0.0).count(),
            self.pos_equip.len(),
            self.familiars.len()
        );
        Ok(())
    }

    fn set_bound(&mut self, kind: BoundKind, index: Option<Axis>, value: f64) {
        match (kind, index) {
            (BoundKind::Min, Some(axis)) => self.min[axis] = value,
            (BoundKind::Max, Some(axis)) => self.max[axis] = value,
            (BoundKind::Min, None) => self.total_min = value,
            (BoundKind::Max, None) => self.total_max = value,
        }
    }

    /// Resolves a keyword to exactly one numeric axis, without side effects.
    fn single_axis(&self, keyword: &str, ctx: &CharacterContext) -> Option<Axis> {
        if let Some(axis) = Axis::find_name(keyword) {
            return Some(axis);
        }
        if let Some(axis) = expand_abbreviation(keyword).and_then(|k| Axis::find_name(&k)) {
            return Some(axis);
        }
        short_axis_name(keyword, ctx)
    }

    /// Short keywords and prefixes, including the ones with side effects.
    fn short_axis(&mut self, keyword: &str, weight: f64, ctx: &CharacterContext) -> Option<Axis> {
        let axis = short_axis_name(keyword, ctx)?;
        match axis {
            Axis::CombatRate if ctx.in_sea() => {
                self.weight[Axis::UnderwaterCombatRate] = weight;
            }
            Axis::Adventures | Axis::PvpFights => self.beeosity = 999,
            Axis::RandomMonsterModifiers => {
                self.no_tiebreaker = true;
                self.beeosity = 999;
            }
            _ => {}
        }
        Some(axis)
    }

    fn propagate_fudge(&mut self) {
        let fudge = self.weight[Axis::Experience] * 0.0001;
        for axis in [
            Axis::MonsterLevel,
            Axis::MuscleExperience,
            Axis::MysticalityExperience,
            Axis::MoxieExperience,
            Axis::MuscleExperiencePercent,
            Axis::MysticalityExperiencePercent,
            Axis::MoxieExperiencePercent,
            Axis::VolleyballWeight,
            Axis::SombreroWeight,
            Axis::VolleyballEffectiveness,
            Axis::SombreroEffectiveness,
            Axis::SombreroBonus,
        ] {
            self.weight[axis] += fudge;
        }

        let fudge = self.weight[Axis::ItemDrop] * 0.0001;
        for axis in [
            Axis::FoodDrop,
            Axis::BoozeDrop,
            Axis::HatDrop,
            Axis::WeaponDrop,
            Axis::OffhandDrop,
            Axis::ShirtDrop,
            Axis::PantsDrop,
            Axis::AccessoryDrop,
            Axis::CandyDrop,
            Axis::GearDrop,
            Axis::FairyWeight,
            Axis::FairyEffectiveness,
            Axis::SporadicItemDrop,
            Axis::PickpocketChance,
        ] {
            self.weight[axis] += fudge;
        }

        let fudge = self.weight[Axis::MeatDrop] * 0.0001;
        for axis in [
            Axis::LeprechaunWeight,
            Axis::LeprechaunEffectiveness,
            Axis::SporadicMeatDrop,
            Axis::MeatBonus,
        ] {
            self.weight[axis] += fudge;
        }
    }
}

fn short_axis_name(keyword: &str, ctx: &CharacterContext) -> Option<Axis> {
    let axis = match keyword {
        "init" => Axis::Initiative,
        "hp" => Axis::MaximumHp,
        "mp" => Axis::MaximumMp,
        "da" => Axis::DamageAbsorption,
        "dr" => Axis::DamageReduction,
        "ml" => Axis::MonsterLevel,
        k if k.starts_with("mus") => Axis::Muscle,
        k if k.starts_with("mys") => Axis::Mysticality,
        k if k.starts_with("mox") => Axis::Moxie,
        k if k.starts_with("main") => ctx.prime_stat().axis(),
        k if k.starts_with("com") => Axis::CombatRate,
        k if k.starts_with("item") => Axis::ItemDrop,
        k if k.starts_with("meat") => Axis::MeatDrop,
        k if k.starts_with("adv") => Axis::Adventures,
        k if k.starts_with("fites") => Axis::PvpFights,
        k if k.starts_with("exp") => Axis::Experience,
        k if k.starts_with("crit") => Axis::CriticalHitPercent,
        k if k.starts_with("spell crit") => Axis::SpellCriticalPercent,
        k if k.starts_with("sprinkle") => Axis::SprinkleDrop,
        "ocrs" => Axis::RandomMonsterModifiers,
        _ => return None,
    };
    Some(axis)
}
