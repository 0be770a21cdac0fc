use super::candidates::{CandidatePool, AUTO_SYNERGY};
use super::options::InnerChoices;
use super::speculation::{compare, Evaluation, Speculation};
use crate::character::{CharacterContext, DUAL_WIELD_SKILL};
use crate::config::MaximizerPrefs;
use crate::data::{FamiliarSpecial, GameData, ItemId, OutfitId};
use crate::scorer::Evaluator;
use crate::slots::{EquipSlot, ItemKind, SlotKind, ACCESSORY_SLOTS};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use tracing::info;

/// A candidate with its standalone evaluation.
#[derive(Debug, Clone, Copy)]
pub struct Ranked {
    pub idx: usize,
    pub eval: Evaluation,
}

/// Trimmed, merged, best-first candidate lists the search draws from.
#[derive(Debug, Clone, Default)]
pub struct Shortlists {
    lists: BTreeMap<SlotKind, Vec<usize>>,
    pub outfits: Vec<OutfitId>,
}

impl Shortlists {
    pub fn list(&self, kind: SlotKind) -> &[usize] {
        self.lists.get(&kind).map_or(&[], |l| l.as_slice())
    }
}

/// Everything ranking and set comparison need, borrowed once.
pub struct Ranker<'a> {
    pub ev: &'a Evaluator,
    pub data: &'a GameData,
    pub ctx: &'a CharacterContext,
    pub prefs: &'a MaximizerPrefs,
    pub inner: &'a InnerChoices,
}

/// How many copies of a bucket can be worn at once.
pub fn max_useful(kind: SlotKind, ev: &Evaluator, data: &GameData, ctx: &CharacterContext) -> u32 {
    let special = |s: FamiliarSpecial| {
        ctx.familiar
            .iter()
            .chain(ev.familiars.iter())
            .filter_map(|f| data.familiar(f.id))
            .any(|f| f.special == Some(s)) as u32
    };
    match kind {
        SlotKind::Weapon1H => {
            1 + ctx.has_skill(DUAL_WIELD_SKILL) as u32 + special(FamiliarSpecial::DisembodiedHand)
        }
        SlotKind::Accessory => 3,
        SlotKind::Familiar | SlotKind::OtherFamiliar(_) => {
            1 + special(FamiliarSpecial::Scarecrow)
                + special(FamiliarSpecial::DisembodiedHand)
                + special(FamiliarSpecial::Hatrack)
        }
        _ => 1,
    }
}

impl<'a> Ranker<'a> {
    fn finish(&self, mut loadout: Speculation) -> Evaluation {
        self.inner.apply(&mut loadout, self.data);
        loadout.evaluate(self.ev, self.data, self.ctx)
    }

    /// The current loadout with `id` placed where `kind` puts it. A worn
    /// accessory stays in the slot it already occupies.
    fn rank_one(&self, id: ItemId, kind: SlotKind) -> Evaluation {
        let mut loadout = Speculation::from_current(self.ctx);
        if let SlotKind::OtherFamiliar(n) = kind {
            loadout.familiar = self.ev.familiars.get(n).copied();
        }
        let slot = match kind.real_slot() {
            EquipSlot::Acc1 => ACCESSORY_SLOTS
                .into_iter()
                .find(|&s| self.ctx.equipment[s] == Some(id))
                .unwrap_or(EquipSlot::Acc1),
            slot => slot,
        };
        loadout.equipment[slot] = Some(id);

        let two_handed = |id: Option<ItemId>| {
            id.and_then(|i| self.data.item(i))
                .is_some_and(|item| item.is_two_handed())
        };
        if slot == EquipSlot::Weapon && two_handed(Some(id)) {
            loadout.equipment[EquipSlot::Offhand] = None;
        }
        if slot == EquipSlot::Offhand && two_handed(loadout.equipment[EquipSlot::Weapon]) {
            loadout.equipment[EquipSlot::Weapon] = None;
        }
        self.finish(loadout)
    }

    fn rank(&self, pool: &CandidatePool) -> BTreeMap<SlotKind, Vec<Ranked>> {
        pool.lists
            .iter()
            .map(|(&kind, list)| {
                let mut ranked: Vec<Ranked> = list
                    .iter()
                    .map(|&idx| Ranked {
                        idx,
                        eval: self.rank_one(pool.items[idx].id, kind),
                    })
                    .collect();
                sort_ranked(&mut ranked, pool);
                (kind, ranked)
            })
            .collect()
    }

    /// Whether wearing every member together strictly beats the items the
    /// members would push out of their slots.
    fn set_wins(
        &self,
        members: &[ItemId],
        ranked: &BTreeMap<SlotKind, Vec<Ranked>>,
        pool: &CandidatePool,
    ) -> bool {
        let mut with_set = Speculation::from_current(self.ctx);
        let mut without = with_set.clone();

        let mut by_slot: BTreeMap<EquipSlot, Vec<ItemId>> = BTreeMap::new();
        for &m in members {
            let Some(item) = self.data.item(m) else {
                return false;
            };
            let group = match item.kind {
                ItemKind::Accessory => EquipSlot::Acc1,
                kind => kind.home_slot(),
            };
            by_slot.entry(group).or_default().push(m);
        }

        for (group, placed) in &by_slot {
            let targets: Vec<EquipSlot> = if *group == EquipSlot::Acc1 {
                ACCESSORY_SLOTS.to_vec()
            } else {
                vec![*group]
            };
            let capacity = targets.len();
            let k = placed.len();
            if k > capacity {
                return false;
            }

            let alternatives: Vec<ItemId> = group_ranking(*group, ranked)
                .into_iter()
                .map(|r| &pool.items[r.idx])
                .filter(|c| !c.conditional && !members.contains(&c.id))
                .map(|c| c.id)
                .skip(capacity - k)
                .take(k)
                .collect();

            for (i, &m) in placed.iter().enumerate() {
                let slot = targets[i];
                with_set.equipment[slot] = Some(m);
                without.equipment[slot] = alternatives.get(i).copied();
                if slot == EquipSlot::Weapon
                    && self.data.item(m).is_some_and(|item| item.is_two_handed())
                {
                    with_set.equipment[EquipSlot::Offhand] = None;
                }
            }
        }

        let a = self.finish(with_set);
        let b = self.finish(without);
        !a.score.failed && compare(&a, &b) == Ordering::Greater
    }

    fn trim(&self, kind: SlotKind, ranked: &[Ranked], pool: &CandidatePool) -> Vec<Ranked> {
        let useful = max_useful(kind, self.ev, self.data, self.ctx);
        let mut kept: Vec<Ranked> = ranked
            .iter()
            .filter(|r| pool.items[r.idx].required)
            .copied()
            .collect();
        let mut total: u32 = kept
            .iter()
            .map(|r| &pool.items[r.idx])
            .filter(|c| !c.conditional)
            .map(|c| self.quota_units(c.count, c.initial))
            .sum();
        let mut bee_items = 0u32;
        let mut bee_total = 0u32;

        for r in ranked {
            let c = &pool.items[r.idx];
            if c.required {
                continue;
            }
            let bees = if self.ctx.in_beecore() {
                self.data.item(c.id).map_or(0, |i| i.beeosity())
            } else {
                0
            };
            if bees > 0 {
                if c.automatic()
                    || (total < useful && bee_items < useful && bee_total < self.ev.beeosity)
                {
                    kept.push(*r);
                    bee_items += c.count;
                    bee_total += bees * c.count;
                }
                continue;
            }
            if c.automatic() || total < useful {
                kept.push(*r);
                if !c.conditional {
                    total += self.quota_units(c.count, c.initial);
                }
            }
        }
        kept
    }

    /// Copies reachable only by folding a sibling do not fill a quota,
    /// since the sibling may be wanted elsewhere.
    fn quota_units(&self, count: u32, initial: u32) -> u32 {
        if self.prefs.allow_foldables {
            count.min(initial)
        } else {
            count
        }
    }
}

fn sort_ranked(ranked: &mut [Ranked], pool: &CandidatePool) {
    ranked.sort_by(|a, b| {
        compare(&b.eval, &a.eval).then_with(|| pool.items[a.idx].id.cmp(&pool.items[b.idx].id))
    });
}

/// All ranked candidates that could fill `group`, best first.
fn group_ranking(group: EquipSlot, ranked: &BTreeMap<SlotKind, Vec<Ranked>>) -> Vec<Ranked> {
    let kinds: &[SlotKind] = match group {
        EquipSlot::Hat => &[SlotKind::Hat],
        EquipSlot::Weapon => &[SlotKind::Weapon, SlotKind::Weapon1H],
        EquipSlot::Offhand => &[SlotKind::Offhand, SlotKind::OffhandMelee, SlotKind::OffhandRanged],
        EquipSlot::Container => &[SlotKind::Container],
        EquipSlot::Shirt => &[SlotKind::Shirt],
        EquipSlot::Pants => &[SlotKind::Pants],
        EquipSlot::Familiar => &[SlotKind::Familiar],
        _ => &[SlotKind::Accessory, SlotKind::Watch],
    };
    let mut out: Vec<Ranked> = Vec::new();
    for kind in kinds {
        for r in ranked.get(kind).into_iter().flatten() {
            if !out.iter().any(|o| o.idx == r.idx) {
                out.push(*r);
            }
        }
    }
    out.sort_by(|a, b| compare(&b.eval, &a.eval));
    out
}

fn merge(into: &mut Vec<Ranked>, from: &[Ranked], pool: &CandidatePool) {
    for r in from {
        if !into.iter().any(|o| o.idx == r.idx) {
            into.push(*r);
        }
    }
    sort_ranked(into, pool);
}

/// Ranks every bucket, settles synergies and outfits, then trims and
/// merges the buckets into the lists the search walks.
pub fn build(cx: &Ranker, pool: &mut CandidatePool) -> Shortlists {
    let ranked = cx.rank(pool);

    let mut winners: BTreeSet<ItemId> = BTreeSet::new();
    for &s in &pool.useful_synergies {
        let members = &cx.data.synergies[s].members;
        if members.iter().all(|m| pool.get(*m).is_some()) && cx.set_wins(members, &ranked, pool) {
            winners.extend(members.iter().copied());
        }
    }
    for item in pool.items.iter_mut() {
        if item.auto & AUTO_SYNERGY != 0 && !winners.contains(&item.id) {
            item.auto &= !AUTO_SYNERGY;
        }
    }

    let outfits: Vec<OutfitId> = pool
        .useful_outfits
        .iter()
        .copied()
        .filter(|&o| {
            let Some(outfit) = cx.data.outfit(o) else {
                return false;
            };
            let available = outfit.pieces.iter().all(|p| pool.count_of(*p) > 0);
            cx.ev.pos_outfits.contains(&o)
                || (available && cx.set_wins(&outfit.pieces, &ranked, pool))
        })
        .collect();

    let mut trimmed: BTreeMap<SlotKind, Vec<Ranked>> = ranked
        .iter()
        .map(|(&kind, list)| (kind, cx.trim(kind, list, pool)))
        .collect();

    let watches = trimmed.remove(&SlotKind::Watch).unwrap_or_default();
    merge(trimmed.entry(SlotKind::Accessory).or_default(), &watches, pool);
    let one_handed = trimmed.remove(&SlotKind::Weapon1H).unwrap_or_default();
    merge(trimmed.entry(SlotKind::Weapon).or_default(), &one_handed, pool);
    let offhands = trimmed.get(&SlotKind::Offhand).cloned().unwrap_or_default();
    merge(trimmed.entry(SlotKind::OffhandMelee).or_default(), &offhands, pool);
    merge(trimmed.entry(SlotKind::OffhandRanged).or_default(), &offhands, pool);

    if cx.ev.dump > 0 {
        dump(cx, pool, &outfits, &trimmed, &ranked);
    }

    Shortlists {
        lists: trimmed
            .into_iter()
            .map(|(kind, list)| (kind, list.into_iter().map(|r| r.idx).collect()))
            .collect(),
        outfits,
    }
}

fn dump(
    cx: &Ranker,
    pool: &CandidatePool,
    outfits: &[OutfitId],
    trimmed: &BTreeMap<SlotKind, Vec<Ranked>>,
    ranked: &BTreeMap<SlotKind, Vec<Ranked>>,
) {
    let name = |idx: usize| {
        cx.data
            .item(pool.items[idx].id)
            .map_or_else(|| pool.items[idx].id.to_string(), |i| i.name.clone())
    };
    let outfit_names: Vec<&str> = outfits
        .iter()
        .filter_map(|o| cx.data.outfit(*o))
        .map(|o| o.name.as_str())
        .collect();
    info!("Useful outfits: {:?}", outfit_names);

    for (kind, list) in trimmed {
        let names: Vec<String> = list.iter().map(|r| name(r.idx)).collect();
        info!("Shortlist {:?}: {:?}", kind, names);
    }
    if cx.ev.dump > 1 {
        for (kind, list) in ranked {
            for r in list {
                let c = &pool.items[r.idx];
                info!(
                    "  {:?} {} score={:.3} tb={:.3} count={} auto={} required={} conditional={}",
                    kind,
                    name(r.idx),
                    r.eval.score.value,
                    r.eval.tiebreaker,
                    c.count,
                    c.automatic(),
                    c.required,
                    c.conditional
                );
            }
        }
    }
}
