use super::candidates::CandidatePool;
use super::options::InnerChoices;
use super::shortlist::Shortlists;
use super::speculation::{compare, Evaluation, Speculation};
use crate::character::{CharacterContext, DUAL_WIELD_SKILL};
use crate::data::{GameData, ItemId, OutfitId};
use crate::modifiers::Flag;
use crate::scorer::Evaluator;
use crate::slots::{EquipSlot, ItemKind, SlotKind, ACCESSORY_SLOTS, CORE_SLOTS};
use itertools::Itertools;
use std::cmp::Ordering;
use tracing::debug;

type SlotMask = [bool; CORE_SLOTS];

#[derive(Debug, Clone, Copy)]
enum Step {
    Slot(EquipSlot, SlotKind),
    Weapon,
    Offhand,
    Accessories,
    FamiliarItem,
}

const STEPS: [Step; 8] = [
    Step::Slot(EquipSlot::Hat, SlotKind::Hat),
    Step::Slot(EquipSlot::Container, SlotKind::Container),
    Step::Slot(EquipSlot::Shirt, SlotKind::Shirt),
    Step::Slot(EquipSlot::Pants, SlotKind::Pants),
    Step::Weapon,
    Step::Offhand,
    Step::Accessories,
    Step::FamiliarItem,
];

/// Slots the search may change. If any core slot was asked for by name,
/// only those; otherwise every slot not switched off.
pub fn changeable_slots(ev: &Evaluator) -> SlotMask {
    let named = EquipSlot::core().any(|s| ev.slot_counter(s) >= 1);
    let mut mask = [false; CORE_SLOTS];
    for slot in EquipSlot::core() {
        let counter = ev.slot_counter(slot);
        mask[slot as usize] = if named { counter >= 1 } else { counter >= 0 };
    }
    mask
}

/// Read-only inputs to the search.
pub struct SearchSpace<'a> {
    pub ev: &'a Evaluator,
    pub data: &'a GameData,
    pub ctx: &'a CharacterContext,
    pub pool: &'a CandidatePool,
    pub lists: &'a Shortlists,
    pub inner: &'a InnerChoices,
    changeable: SlotMask,
}

impl<'a> SearchSpace<'a> {
    pub fn new(
        ev: &'a Evaluator,
        data: &'a GameData,
        ctx: &'a CharacterContext,
        pool: &'a CandidatePool,
        lists: &'a Shortlists,
        inner: &'a InnerChoices,
    ) -> Self {
        Self {
            ev,
            data,
            ctx,
            pool,
            lists,
            inner,
            changeable: changeable_slots(ev),
        }
    }

    fn open(&self, slot: EquipSlot, pinned: &SlotMask) -> bool {
        self.changeable[slot as usize] && !pinned[slot as usize]
    }

    /// Whether one more copy of `id` can be worn. Folded copies come out of
    /// the same physical items, so a fold group shares one owned total.
    fn fits(&self, loadout: &Speculation, id: ItemId) -> bool {
        if loadout.equipment.count_of(id) >= self.pool.count_of(id) {
            return false;
        }
        let Some(record) = self.data.item(id).filter(|r| r.fold_group.is_some()) else {
            return true;
        };
        let siblings = self.data.fold_siblings(record);
        let worn: u32 = siblings
            .iter()
            .map(|s| loadout.equipment.count_of(s.id))
            .sum();
        let owned: u32 = siblings.iter().map(|s| self.ctx.owned_count(s.id)).sum();
        worn < owned
    }

    /// Puts picked accessories back in the slot they are worn in now, then
    /// fills the remaining open slots in order.
    fn seat_accessories(
        &self,
        open: &[EquipSlot],
        picked: Vec<ItemId>,
    ) -> Vec<(EquipSlot, ItemId)> {
        let mut free = open.to_vec();
        let mut seated = Vec::with_capacity(picked.len());
        let mut rest = Vec::new();
        for id in picked {
            match free.iter().position(|&s| self.ctx.equipment[s] == Some(id)) {
                Some(p) => seated.push((free.remove(p), id)),
                None => rest.push(id),
            }
        }
        seated.extend(free.into_iter().zip(rest));
        seated
    }

    fn two_handed(&self, id: Option<ItemId>) -> bool {
        id.and_then(|i| self.data.item(i))
            .is_some_and(|item| item.is_two_handed())
    }

    /// The current loadout with every changeable slot emptied.
    fn base(&self) -> Speculation {
        let mut loadout = Speculation::from_current(self.ctx);
        for slot in EquipSlot::core() {
            if self.changeable[slot as usize] {
                loadout.equipment[slot] = None;
            }
        }
        loadout
    }

    /// Places every piece of `outfit` in a free slot and pins those slots.
    fn wear_outfit(&self, loadout: &Speculation, outfit: OutfitId) -> Option<(Speculation, SlotMask)> {
        let outfit = self.data.outfit(outfit)?;
        let mut loadout = loadout.clone();
        let mut pinned = [false; CORE_SLOTS];

        for &piece in &outfit.pieces {
            let item = self.data.item(piece)?;
            let targets: Vec<EquipSlot> = match item.kind {
                ItemKind::Accessory => ACCESSORY_SLOTS.to_vec(),
                kind => vec![kind.home_slot()],
            };
            if targets
                .iter()
                .any(|&s| !self.changeable[s as usize] && loadout.equipment[s] == Some(piece))
            {
                continue;
            }
            let slot = targets.into_iter().find(|&s| self.open(s, &pinned))?;
            if !self.fits(&loadout, piece) {
                return None;
            }
            loadout.equipment[slot] = Some(piece);
            pinned[slot as usize] = true;

            if item.is_two_handed() {
                if !self.open(EquipSlot::Offhand, &pinned) {
                    return None;
                }
                loadout.equipment[EquipSlot::Offhand] = None;
                pinned[EquipSlot::Offhand as usize] = true;
            }
        }
        Some((loadout, pinned))
    }

    fn watches(&self, loadout: &Speculation) -> usize {
        ACCESSORY_SLOTS
            .iter()
            .filter_map(|&s| loadout.equipment[s])
            .filter_map(|id| self.data.item(id))
            .filter(|item| item.modifiers.has_flag(Flag::NonstackableWatch))
            .count()
    }
}

/// The best loadout found and how many loadouts were scored.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub best: Speculation,
    pub eval: Evaluation,
    pub evaluated: u64,
}

/// Depth-first walk over familiar, outfit and then each slot in turn.
pub struct Search<'a> {
    space: &'a SearchSpace<'a>,
    best: Option<(Speculation, Evaluation)>,
    evaluated: u64,
    done: bool,
}

impl<'a> Search<'a> {
    pub fn new(space: &'a SearchSpace<'a>) -> Self {
        Self {
            space,
            best: None,
            evaluated: 0,
            done: false,
        }
    }

    pub fn run(mut self) -> Option<SearchOutcome> {
        let space = self.space;

        if !space.changeable.iter().any(|c| *c) {
            let current = Speculation::from_current(space.ctx);
            let eval = current.evaluate(space.ev, space.data, space.ctx);
            return Some(SearchOutcome {
                best: current,
                eval,
                evaluated: 1,
            });
        }

        let base = space.base();
        let mut familiars = vec![(base.familiar, SlotKind::Familiar)];
        for (n, f) in space.ev.familiars.iter().enumerate() {
            familiars.push((Some(*f), SlotKind::OtherFamiliar(n)));
        }

        for (familiar, kind) in familiars {
            let mut loadout = base.clone();
            if familiar.map(|f| f.id) != base.familiar.map(|f| f.id) {
                loadout.familiar = familiar;
                let keeps_item = loadout.equipment[EquipSlot::Familiar]
                    .and_then(|id| space.data.item(id))
                    .zip(familiar.and_then(|f| space.data.familiar(f.id)))
                    .is_some_and(|(item, fam)| fam.can_wear(item));
                if !keeps_item {
                    loadout.equipment[EquipSlot::Familiar] = None;
                }
            }
            self.try_outfits(loadout, kind);
            if self.done {
                break;
            }
        }

        debug!("Search scored {} configurations", self.evaluated);
        let evaluated = self.evaluated;
        self.best.map(|(best, eval)| SearchOutcome {
            best,
            eval,
            evaluated,
        })
    }

    fn try_outfits(&mut self, loadout: Speculation, familiar_kind: SlotKind) {
        let space = self.space;
        self.fill(loadout.clone(), [false; CORE_SLOTS], familiar_kind, 0);
        for &outfit in &space.lists.outfits {
            if self.done {
                return;
            }
            if let Some((worn, pinned)) = space.wear_outfit(&loadout, outfit) {
                self.fill(worn, pinned, familiar_kind, 0);
            }
        }
    }

    fn fill(&mut self, loadout: Speculation, pinned: SlotMask, familiar_kind: SlotKind, step: usize) {
        if self.done {
            return;
        }
        let space = self.space;
        let Some(&current) = STEPS.get(step) else {
            self.consider(loadout);
            return;
        };

        match current {
            Step::Slot(slot, kind) => {
                self.fill_slot(loadout, pinned, familiar_kind, step, slot, space.lists.list(kind));
            }
            Step::Weapon => {
                if !space.open(EquipSlot::Weapon, &pinned) {
                    return self.fill(loadout, pinned, familiar_kind, step + 1);
                }
                let offhand_fixed = !space.open(EquipSlot::Offhand, &pinned)
                    && loadout.equipment[EquipSlot::Offhand].is_some();
                let choices = space.lists.list(SlotKind::Weapon).iter().map(Some).chain([None]);
                for choice in choices {
                    let mut s = loadout.clone();
                    if let Some(&idx) = choice {
                        let id = space.pool.items[idx].id;
                        let two_handed = space.two_handed(Some(id));
                        if !space.fits(&s, id) || (two_handed && offhand_fixed) {
                            continue;
                        }
                        s.equipment[EquipSlot::Weapon] = Some(id);
                        if two_handed {
                            s.equipment[EquipSlot::Offhand] = None;
                        }
                    }
                    self.fill(s, pinned, familiar_kind, step + 1);
                    if self.done {
                        return;
                    }
                }
            }
            Step::Offhand => {
                let weapon = loadout.equipment[EquipSlot::Weapon];
                if !space.open(EquipSlot::Offhand, &pinned) || space.two_handed(weapon) {
                    return self.fill(loadout, pinned, familiar_kind, step + 1);
                }
                let kind = match weapon.and_then(|id| space.data.item(id)) {
                    Some(w) if w.hands == 1 && space.ctx.has_skill(DUAL_WIELD_SKILL) => {
                        if w.is_melee() {
                            SlotKind::OffhandMelee
                        } else {
                            SlotKind::OffhandRanged
                        }
                    }
                    _ => SlotKind::Offhand,
                };
                self.fill_slot(loadout, pinned, familiar_kind, step, EquipSlot::Offhand, space.lists.list(kind));
            }
            Step::Accessories => {
                let open: Vec<EquipSlot> = ACCESSORY_SLOTS
                    .into_iter()
                    .filter(|&s| space.open(s, &pinned))
                    .collect();
                if open.is_empty() {
                    return self.fill(loadout, pinned, familiar_kind, step + 1);
                }
                let choices: Vec<Option<usize>> = space
                    .lists
                    .list(SlotKind::Accessory)
                    .iter()
                    .copied()
                    .map(Some)
                    .chain([None])
                    .collect();
                for combo in choices.into_iter().combinations_with_replacement(open.len()) {
                    let mut s = loadout.clone();
                    let picked = combo
                        .into_iter()
                        .flatten()
                        .map(|idx| space.pool.items[idx].id)
                        .collect();
                    let placed = space
                        .seat_accessories(&open, picked)
                        .into_iter()
                        .all(|(slot, id)| {
                            let fits = space.fits(&s, id);
                            if fits {
                                s.equipment[slot] = Some(id);
                            }
                            fits
                        });
                    if !placed || space.watches(&s) > 1 {
                        continue;
                    }
                    self.fill(s, pinned, familiar_kind, step + 1);
                    if self.done {
                        return;
                    }
                }
            }
            Step::FamiliarItem => {
                if loadout.familiar.is_none() {
                    return self.fill(loadout, pinned, familiar_kind, step + 1);
                }
                let list = space.lists.list(familiar_kind);
                self.fill_slot(loadout, pinned, familiar_kind, step, EquipSlot::Familiar, list);
            }
        }
    }

    fn fill_slot(
        &mut self,
        loadout: Speculation,
        pinned: SlotMask,
        familiar_kind: SlotKind,
        step: usize,
        slot: EquipSlot,
        list: &[usize],
    ) {
        let space = self.space;
        if !space.open(slot, &pinned) {
            return self.fill(loadout, pinned, familiar_kind, step + 1);
        }
        for choice in list.iter().map(Some).chain([None]) {
            let mut s = loadout.clone();
            if let Some(&idx) = choice {
                let id = space.pool.items[idx].id;
                if !space.fits(&s, id) {
                    continue;
                }
                s.equipment[slot] = Some(id);
            }
            self.fill(s, pinned, familiar_kind, step + 1);
            if self.done {
                return;
            }
        }
    }

    fn consider(&mut self, mut loadout: Speculation) {
        let space = self.space;
        space.inner.apply(&mut loadout, space.data);
        let eval = loadout.evaluate(space.ev, space.data, space.ctx);
        self.evaluated += 1;

        let better = match &self.best {
            Some((_, best)) => compare(&eval, best) == Ordering::Greater,
            None => true,
        };
        if better {
            if eval.score.exceeded && !eval.score.failed {
                self.done = true;
            }
            self.best = Some((loadout, eval));
        }
    }
}
