use super::candidates::CandidatePool;
use super::speculation::{compare, Evaluation, Speculation};
use crate::character::CharacterContext;
use crate::data::{FamiliarId, GameData, ItemId, ItemTag};
use crate::modifiers::ModifierVector;
use crate::scorer::Evaluator;
use crate::slots::EquipSlot;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use tracing::debug;

/// Choices made once, before the slot search, for things that ride on an
/// item rather than occupying a slot of their own.
#[derive(Debug, Clone, Default)]
pub struct InnerChoices {
    /// Carryable familiars, best first.
    pub riders: Vec<FamiliarId>,
    pub card: Option<ItemId>,
    pub options: BTreeMap<ItemId, String>,
    crown_locked: bool,
    bjorn_locked: bool,
    card_locked: bool,
}

fn judge(ev: &Evaluator, ctx: &CharacterContext, mods: &ModifierVector) -> Evaluation {
    let combined = ctx.modifiers.combine(mods);
    Evaluation {
        score: ev.score(&combined, ctx),
        tiebreaker: ev.tiebreaker_score(&combined, ctx),
        changes: 0,
        beeosity: 0,
        folded: 0,
        outfit: None,
    }
}

/// Picks the best of `candidates`, keeping the first one on ties.
fn best_of<T>(candidates: impl IntoIterator<Item = (T, Evaluation)>) -> Option<T> {
    let mut best: Option<(T, Evaluation)> = None;
    for (value, eval) in candidates {
        let better = match &best {
            Some((_, current)) => compare(&eval, current) == Ordering::Greater,
            None => true,
        };
        if better {
            best = Some((value, eval));
        }
    }
    best.map(|(value, _)| value)
}

impl InnerChoices {
    pub fn choose(
        ev: &Evaluator,
        data: &GameData,
        ctx: &CharacterContext,
        pool: &CandidatePool,
    ) -> Self {
        let mut choices = InnerChoices {
            crown_locked: ev.slot_counter(EquipSlot::CrownOfThrones) < 0,
            bjorn_locked: ev.slot_counter(EquipSlot::BuddyBjorn) < 0,
            card_locked: ev.slot_counter(EquipSlot::CardSleeve) < 0,
            ..Default::default()
        };

        if pool.carriers > 0 {
            choices.riders = rank_riders(ev, data, ctx);
            debug!("Carried familiar ranking: {:?}", choices.riders);
        }

        if pool.wants_card && !choices.card_locked {
            let owned = data
                .items
                .iter()
                .filter(|i| i.has_tag(ItemTag::SleeveCard) && ctx.owned_count(i.id) > 0)
                .map(|i| i.id);
            let seeded = ctx.card.into_iter().chain(owned.filter(|id| Some(*id) != ctx.card));
            choices.card = best_of(seeded.filter_map(|id| {
                data.item(id).map(|card| (id, judge(ev, ctx, &card.modifiers)))
            }));
        }

        for &id in &pool.option_items {
            let Some(item) = data.item(id) else {
                continue;
            };
            let forced = item
                .options
                .iter()
                .find(|o| ev.forced_options.contains(&o.name.to_lowercase()));
            let choice = match forced {
                Some(option) => Some(option.name.clone()),
                None => {
                    let current = ctx.item_options.get(&id).and_then(|c| item.option(c));
                    let seeded = current
                        .into_iter()
                        .chain(item.options.iter().filter(|o| Some(*o) != current));
                    best_of(seeded.map(|o| {
                        let mods = item.modifiers.combine(&o.modifiers);
                        (o.name.clone(), judge(ev, ctx, &mods))
                    }))
                }
            };
            if let Some(choice) = choice {
                choices.options.insert(id, choice);
            }
        }

        choices
    }

    /// Fills in riders, card and options for whatever `loadout` wears.
    pub fn apply(&self, loadout: &mut Speculation, data: &GameData) {
        let hat = loadout.wears(data, ItemTag::CarrierHat);
        let back = loadout.wears(data, ItemTag::CarrierBack);

        if !self.riders.is_empty() {
            let mut taken: Vec<FamiliarId> = loadout.familiar.map(|f| f.id).into_iter().collect();
            if self.crown_locked {
                taken.extend(loadout.enthroned);
            }
            if self.bjorn_locked {
                taken.extend(loadout.bjorned);
            }
            if back && !self.bjorn_locked {
                loadout.bjorned = self.riders.iter().copied().find(|f| !taken.contains(f));
                taken.extend(loadout.bjorned);
            }
            if hat && !self.crown_locked {
                loadout.enthroned = self.riders.iter().copied().find(|f| !taken.contains(f));
            }
        }

        if self.card.is_some() && !self.card_locked && loadout.wears(data, ItemTag::CardSleeve) {
            loadout.card = self.card;
        }

        let worn: Vec<ItemId> = loadout.equipment.items().map(|(_, id)| id).collect();
        for id in worn {
            if let Some(choice) = self.options.get(&id) {
                loadout.options.insert(id, choice.clone());
            }
        }
    }
}

/// Current riders first, then the terrarium, ordered best first.
fn rank_riders(ev: &Evaluator, data: &GameData, ctx: &CharacterContext) -> Vec<FamiliarId> {
    let mut seen = Vec::new();
    let ids = ctx
        .enthroned
        .into_iter()
        .chain(ctx.bjorned)
        .chain(ctx.familiars.iter().map(|f| f.id))
        .chain(ctx.familiar.map(|f| f.id));
    for id in ids {
        if !seen.contains(&id) {
            seen.push(id);
        }
    }

    let mut ranked: Vec<(FamiliarId, Evaluation)> = seen
        .into_iter()
        .filter_map(|id| data.familiar(id))
        .filter(|f| f.can_carry)
        .map(|f| (f.id, judge(ev, ctx, &f.carried_modifiers)))
        .collect();
    ranked.sort_by(|a, b| compare(&b.1, &a.1));
    ranked.into_iter().map(|(id, _)| id).collect()
}
