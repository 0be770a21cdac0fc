use crate::character::{CharacterClass, CharacterContext, CHEFSTAFF_SKILL, CLUB_SKILL, KNIFE_SKILL};
use crate::config::MaximizerPrefs;
use crate::data::{GameData, ItemId, ItemRecord, ItemTag, OutfitId, SetBonus};
use crate::modifiers::{Axis, BitmapAxis, Flag, ModifierVector, Stat};
use crate::scorer::{Constraint, Evaluator};
use crate::slots::{EquipSlot, ItemKind, SlotKind};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::debug;

/// Why an item bypasses the per-slot quota. Several may apply at once.
pub const AUTO_CURRENT: u16 = 1 << 0;
pub const AUTO_PINNED: u16 = 1 << 1;
pub const AUTO_CONSTRAINT: u16 = 1 << 2;
pub const AUTO_SET_BONUS: u16 = 1 << 3;
pub const AUTO_SYNERGY: u16 = 1 << 4;
pub const AUTO_FAMILIAR: u16 = 1 << 5;
pub const AUTO_CHARGED: u16 = 1 << 6;
pub const AUTO_SPECIAL: u16 = 1 << 7;
pub const AUTO_OPTION: u16 = 1 << 8;

/// An item the search may place, with its availability and filter flags.
#[derive(Debug, Clone)]
pub struct CheckedItem {
    pub id: ItemId,
    /// Copies available, folding included when allowed.
    pub count: u32,
    /// Copies owned without folding.
    pub initial: u32,
    pub auto: u16,
    pub required: bool,
    /// Only contributes in some configurations (unarmed, mutex).
    pub conditional: bool,
}

impl CheckedItem {
    fn new(id: ItemId, count: u32, initial: u32) -> Self {
        Self {
            id,
            count,
            initial,
            auto: 0,
            required: false,
            conditional: false,
        }
    }

    pub fn automatic(&self) -> bool {
        self.auto != 0
    }
}

/// Output of candidate enumeration: the item pool and one unsorted
/// candidate list per ranking bucket.
#[derive(Debug, Clone, Default)]
pub struct CandidatePool {
    pub items: Vec<CheckedItem>,
    index: HashMap<ItemId, usize>,
    pub lists: BTreeMap<SlotKind, Vec<usize>>,
    pub useful_outfits: Vec<OutfitId>,
    /// Indices into `GameData::synergies` whose bonus scores positively.
    pub useful_synergies: Vec<usize>,
    /// Usable outfit pieces and their available copies, whether or not
    /// they made any slot list on their own.
    pub outfit_pieces: BTreeMap<ItemId, u32>,
    /// Carrier items found (hat and back), so the rider search runs.
    pub carriers: u8,
    pub wants_card: bool,
    pub option_items: Vec<ItemId>,
}

impl CandidatePool {
    pub fn get(&self, id: ItemId) -> Option<&CheckedItem> {
        self.index.get(&id).map(|&i| &self.items[i])
    }

    pub fn count_of(&self, id: ItemId) -> u32 {
        self.get(id)
            .map(|c| c.count)
            .or_else(|| self.outfit_pieces.get(&id).copied())
            .unwrap_or(0)
    }

    fn slot_for(&mut self, id: ItemId, count: u32, initial: u32) -> usize {
        if let Some(&i) = self.index.get(&id) {
            return i;
        }
        self.items.push(CheckedItem::new(id, count, initial));
        let i = self.items.len() - 1;
        self.index.insert(id, i);
        i
    }

    fn push(&mut self, kind: SlotKind, idx: usize) {
        let list = self.lists.entry(kind).or_default();
        if !list.contains(&idx) {
            list.push(idx);
        }
    }

    pub fn list(&self, kind: SlotKind) -> &[usize] {
        self.lists.get(&kind).map_or(&[], |l| l.as_slice())
    }
}

/// Scores modifier vectors against the character's gear-less baseline.
struct DeltaScorer<'a> {
    ev: &'a Evaluator,
    ctx: &'a CharacterContext,
    null: f64,
}

impl<'a> DeltaScorer<'a> {
    fn new(ev: &'a Evaluator, ctx: &'a CharacterContext) -> Self {
        Self {
            ev,
            ctx,
            null: ev.null_score(ctx),
        }
    }

    fn delta(&self, mods: &ModifierVector) -> f64 {
        let combined = self.ctx.modifiers.combine(mods);
        self.ev.score(&combined, self.ctx).value - self.null
    }
}

struct SetUsefulness {
    bonuses: BTreeSet<SetBonus>,
    synergy_bits: u64,
}

impl SetUsefulness {
    fn contributes(&self, mods: &ModifierVector, ev: &Evaluator, ctx: &CharacterContext) -> bool {
        let wrong_class = mods.class().is_some_and(|c| !ctx.class.matches(c));
        let has = |bonus: SetBonus| self.bonuses.contains(&bonus);

        (has(SetBonus::HoboPower) && mods.get(Axis::HoboPower) > 0.0)
            || (has(SetBonus::Smithsness) && mods.get(Axis::Smithsness) > 0.0 && !wrong_class)
            || (has(SetBonus::Brimstone) && mods.raw_bitmap(BitmapAxis::Brimstone) != 0)
            || (has(SetBonus::Cloathing) && mods.raw_bitmap(BitmapAxis::Cloathing) != 0)
            || (has(SetBonus::SlimeHate) && mods.get(Axis::SlimeHatesIt) > 0.0)
            || (ev.clownosity > 0 && mods.raw_bitmap(BitmapAxis::Clownosity) != 0)
            || (ev.raveosity > 0 && mods.raw_bitmap(BitmapAxis::Raveosity) != 0)
    }
}

/// Walks the item database once and sorts every usable item into the
/// ranking buckets it can fill.
pub fn enumerate(
    ev: &Evaluator,
    data: &GameData,
    ctx: &CharacterContext,
    prefs: &MaximizerPrefs,
) -> CandidatePool {
    let scorer = DeltaScorer::new(ev, ctx);
    let mut pool = CandidatePool::default();

    for outfit in &data.outfits {
        if ev.neg_outfits.contains(&outfit.id) {
            continue;
        }
        let useful = ev.pos_outfits.contains(&outfit.id)
            || ev.check_constraints(&outfit.modifiers) == Constraint::Meets
            || scorer.delta(&outfit.modifiers) > 0.0;
        if useful {
            pool.useful_outfits.push(outfit.id);
        }
    }

    let mut synergy_bits = 0u64;
    for (i, synergy) in data.synergies.iter().enumerate() {
        if scorer.delta(&synergy.modifiers) > 0.0 {
            pool.useful_synergies.push(i);
            synergy_bits |= 1 << i;
        }
    }

    let sets = SetUsefulness {
        bonuses: data
            .set_bonuses
            .iter()
            .filter(|(_, per_unit)| scorer.delta(per_unit) > 0.0)
            .map(|(bonus, _)| *bonus)
            .collect(),
        synergy_bits,
    };

    let mut familiars = vec![ctx.familiar];
    familiars.extend(ev.familiars.iter().copied().map(Some));

    let glove_available = data
        .items
        .iter()
        .any(|i| i.has_tag(ItemTag::SauceGlove) && ctx.owned_count(i.id) > 0);

    for item in &data.items {
        let id = item.id;
        if ev.neg_equip.contains(&id) {
            continue;
        }
        if ctx.in_beecore() && item.beeosity() > ev.beeosity {
            continue;
        }
        if ctx.hardcore && item.path.is_some_and(|p| p != ctx.path) {
            continue;
        }

        let initial = ctx.owned_count(id);
        let mut count = initial;
        if prefs.allow_foldables {
            count += ctx.foldable_count(id, data);
        }
        if item.modifiers.has_flag(Flag::Single) {
            count = count.min(1);
        }
        if count == 0 {
            continue;
        }

        for (n, owned) in familiars.iter().enumerate() {
            let Some(fam) = owned.and_then(|f| data.familiar(f.id)) else {
                continue;
            };
            if (n == 0 && item.kind == ItemKind::Familiar) || !fam.can_wear(item) {
                continue;
            }
            let worn = fam.worn_modifiers(item);
            let constraint = ev.check_constraints(worn);
            if constraint == Constraint::Violates {
                continue;
            }
            let auto = constraint == Constraint::Meets;
            if auto || scorer.delta(worn) > 0.0 {
                let idx = pool.slot_for(id, count, initial);
                if auto {
                    pool.items[idx].auto |= AUTO_FAMILIAR;
                }
                let kind = if n == 0 {
                    SlotKind::Familiar
                } else {
                    SlotKind::OtherFamiliar(n - 1)
                };
                pool.push(kind, idx);
            }
        }

        if let Some(req) = item.requirement {
            if ctx.base_stats.get(req.stat) < req.amount {
                continue;
            }
        }

        if let Some((kinds, auto, required)) =
            classify(item, count, ev, data, ctx, &scorer, &sets, glove_available, &mut pool)
        {
            let idx = pool.slot_for(id, count, initial);
            let entry = &mut pool.items[idx];
            entry.auto |= auto;
            entry.required |= required;
            entry.conditional = item.modifiers.has_flag(Flag::Unarmed)
                || item.modifiers.raw_bitmap(BitmapAxis::Mutex) != 0;
            for kind in kinds {
                pool.push(kind, idx);
            }
        }
    }

    debug!(
        "Enumerated {} candidates, {} useful outfits, {} useful synergies",
        pool.items.len(),
        pool.useful_outfits.len(),
        pool.useful_synergies.len()
    );
    pool
}

/// Decides whether `item` is a main-slot candidate. Returns its buckets,
/// the automatic reasons and whether it is required.
#[allow(clippy::too_many_arguments)]
fn classify(
    item: &ItemRecord,
    count: u32,
    ev: &Evaluator,
    data: &GameData,
    ctx: &CharacterContext,
    scorer: &DeltaScorer,
    sets: &SetUsefulness,
    glove_available: bool,
    pool: &mut CandidatePool,
) -> Option<(Vec<SlotKind>, u16, bool)> {
    let id = item.id;
    let mut kinds = vec![SlotKind::for_item(item.kind)];
    let mut auto = 0u16;

    match item.kind {
        ItemKind::Familiar => {
            let fam = ctx.familiar.and_then(|f| data.familiar(f.id))?;
            if !fam.can_wear(item) {
                return None;
            }
        }
        ItemKind::Weapon => {
            if !weapon_allowed(item, ev, ctx, glove_available) {
                return None;
            }
            if item.hands == 1 {
                kinds[0] = SlotKind::Weapon1H;
                if !ev.require_shield && !item.has_tag(ItemTag::MainhandOnly) {
                    kinds.push(if item.is_melee() {
                        SlotKind::OffhandMelee
                    } else {
                        SlotKind::OffhandRanged
                    });
                }
            }
            if item.has_tag(ItemTag::ChargedItemDrop)
                && ctx.charges(id) > 0
                && ev.weights(Axis::ItemDrop)
            {
                return Some((kinds, AUTO_CHARGED, true));
            }
        }
        ItemKind::Offhand => {
            if ev.require_shield && !item.has_tag(ItemTag::Shield) {
                return None;
            }
            if item.has_tag(ItemTag::HoboFocus) && sets.bonuses.contains(&SetBonus::HoboPower) {
                return Some((kinds, AUTO_SPECIAL, false));
            }
        }
        ItemKind::Accessory => {
            if item.has_tag(ItemTag::SauceGlove)
                && ctx.class == CharacterClass::Sauceror
                && !ctx.has_skill(CHEFSTAFF_SKILL)
            {
                return Some((kinds, AUTO_SPECIAL, false));
            }
        }
        ItemKind::Shirt => {
            if item.has_tag(ItemTag::ChargedExperience)
                && ctx.charges(id) > 0
                && ev.weights(Axis::Experience)
            {
                return Some((kinds, AUTO_CHARGED, true));
            }
        }
        _ => {}
    }

    if data.outfit_of(id).is_some() {
        pool.outfit_pieces.insert(id, count);
    }
    if ctx.is_equipped(id) && ev.current {
        auto |= AUTO_CURRENT;
    }

    let mut mods = item.modifiers.clone();
    if mods.has_flag(Flag::NonstackableWatch) {
        kinds[0] = SlotKind::Watch;
    }

    let carries = ctx.can_carry_familiars()
        && ((item.has_tag(ItemTag::CarrierHat) && ev.slot_counter(EquipSlot::CrownOfThrones) >= 0)
            || (item.has_tag(ItemTag::CarrierBack)
                && ev.slot_counter(EquipSlot::BuddyBjorn) >= 0));
    if carries {
        pool.carriers += 1;
    }
    let sleeve = item.has_tag(ItemTag::CardSleeve);
    if sleeve {
        pool.wants_card = true;
    }
    let has_options = !item.options.is_empty();
    if has_options {
        pool.option_items.push(id);
        if item.options.iter().any(|o| ev.forced_options.contains(&o.name.to_lowercase())) {
            auto |= AUTO_OPTION;
        }
    }

    if ev.pos_equip.contains(&id) {
        return Some((kinds, auto | AUTO_PINNED, true));
    }

    match ev.check_constraints(&mods) {
        Constraint::Violates => return None,
        Constraint::Meets => return Some((kinds, auto | AUTO_CONSTRAINT, false)),
        Constraint::Irrelevant => {}
    }

    if sets.contributes(&mods, ev, ctx) {
        return Some((kinds, auto | AUTO_SET_BONUS, false));
    }
    if mods.raw_bitmap(BitmapAxis::Synergetic) & sets.synergy_bits != 0 {
        return Some((kinds, auto | AUTO_SYNERGY, false));
    }
    if carries || sleeve || has_options {
        return Some((kinds, auto, false));
    }

    if let Some(effect) = mods.intrinsic_effect().and_then(|e| data.effect(e)) {
        mods = mods.combine(effect);
    }

    let delta = scorer.delta(&mods);
    if delta < 0.0 || (delta == 0.0 && auto & AUTO_CURRENT == 0) {
        return None;
    }
    Some((kinds, auto, false))
}

fn weapon_allowed(
    item: &ItemRecord,
    ev: &Evaluator,
    ctx: &CharacterContext,
    glove_available: bool,
) -> bool {
    if (ev.hands == 1 && item.hands != 1) || (ev.hands > 1 && item.hands < ev.hands) {
        return false;
    }
    if (ev.melee > 0 && !item.is_melee()) || (ev.melee < 0 && item.is_melee()) {
        return false;
    }
    if ev.require_club
        && !(item.weapon_type_is("club") || (ctx.has_skill(CLUB_SKILL) && item.weapon_type_is("sword")))
    {
        return false;
    }
    if ev.require_utensil && !item.weapon_type_is("utensil") {
        return false;
    }
    if ev.require_knife && !item.weapon_type_is("knife") {
        return false;
    }
    if ev.require_accordion && !item.weapon_type_is("accordion") {
        return false;
    }
    if ev.effective {
        let moxie_wins = ctx.buffed_stat(Stat::Moxie) > ctx.buffed_stat(Stat::Muscle);
        let knife_ok = ctx.has_skill(KNIFE_SKILL) && item.weapon_type_is("knife");
        if moxie_wins && item.is_melee() && !knife_ok {
            return false;
        }
        if !moxie_wins && !item.is_melee() {
            return false;
        }
    }
    if let Some(ty) = &ev.weapon_type {
        if !item
            .weapon_type
            .as_deref()
            .is_some_and(|t| t.to_lowercase().contains(&ty.to_lowercase()))
        {
            return false;
        }
    }
    if item.has_tag(ItemTag::Chefstaff) {
        let allowed = ctx.has_skill(CHEFSTAFF_SKILL)
            || ctx.class == CharacterClass::AvatarOfJarlsberg
            || (ctx.class == CharacterClass::Sauceror && glove_available);
        if !allowed {
            return false;
        }
    }
    true
}
