#![allow(dead_code)]

use gearforge::character::{CharacterClass, CharacterContext, OwnedFamiliar, StatBlock};
use gearforge::data::{
    FamiliarId, FamiliarRecord, FamiliarRole, FamiliarSpecial, GameData, ItemId, ItemOption,
    ItemRecord, ItemTag, OutfitId, OutfitRecord, StatRequirement, SynergyRecord,
};
use gearforge::modifiers::{Axis, BitmapAxis, Flag, ModifierVector, Stat};
use gearforge::slots::{EquipSlot, Equipment, ItemKind};
use std::collections::{BTreeMap, BTreeSet};

/// Builder for ItemRecord so tests only spell out what matters.
pub struct ItemBuilder {
    item: ItemRecord,
}

impl ItemBuilder {
    pub fn new(id: u32, name: &str, kind: ItemKind) -> Self {
        Self {
            item: ItemRecord {
                id: ItemId(id),
                name: name.to_string(),
                kind,
                hands: if kind == ItemKind::Weapon { 1 } else { 0 },
                ranged: false,
                weapon_type: None,
                tags: BTreeSet::new(),
                fold_group: None,
                requirement: None,
                path: None,
                familiar: None,
                modifiers: ModifierVector::new(),
                familiar_modifiers: ModifierVector::new(),
                options: Vec::new(),
            },
        }
    }

    pub fn hands(mut self, hands: u8) -> Self {
        self.item.hands = hands;
        self
    }

    pub fn ranged(mut self) -> Self {
        self.item.ranged = true;
        self
    }

    pub fn weapon_type(mut self, ty: &str) -> Self {
        self.item.weapon_type = Some(ty.to_string());
        self
    }

    pub fn tag(mut self, tag: ItemTag) -> Self {
        self.item.tags.insert(tag);
        self
    }

    pub fn fold_group(mut self, group: &str) -> Self {
        self.item.fold_group = Some(group.to_string());
        self
    }

    pub fn requires(mut self, stat: Stat, amount: u32) -> Self {
        self.item.requirement = Some(StatRequirement { stat, amount });
        self
    }

    pub fn modifier(mut self, axis: Axis, value: f64) -> Self {
        self.item.modifiers = self.item.modifiers.with(axis, value);
        self
    }

    pub fn flag(mut self, flag: Flag) -> Self {
        self.item.modifiers = self.item.modifiers.with_flag(flag);
        self
    }

    pub fn bitmap(mut self, axis: BitmapAxis, bits: u64) -> Self {
        self.item.modifiers = self.item.modifiers.with_bitmap(axis, bits);
        self
    }

    pub fn familiar_modifier(mut self, axis: Axis, value: f64) -> Self {
        self.item.familiar_modifiers = self.item.familiar_modifiers.with(axis, value);
        self
    }

    pub fn option(mut self, name: &str, modifiers: ModifierVector) -> Self {
        self.item.options.push(ItemOption {
            name: name.to_string(),
            modifiers,
        });
        self
    }

    pub fn build(self) -> ItemRecord {
        self.item
    }
}

pub fn hat(id: u32, name: &str) -> ItemBuilder {
    ItemBuilder::new(id, name, ItemKind::Hat)
}

pub fn accessory(id: u32, name: &str) -> ItemBuilder {
    ItemBuilder::new(id, name, ItemKind::Accessory)
}

pub fn familiar(id: u32, race: &str) -> FamiliarRecord {
    FamiliarRecord {
        id: FamiliarId(id),
        race: race.to_string(),
        roles: BTreeSet::new(),
        special: None,
        can_carry: true,
        can_equip: true,
        underwater: false,
        modifiers: ModifierVector::new(),
        carried_modifiers: ModifierVector::new(),
    }
}

pub fn with_role(mut fam: FamiliarRecord, role: FamiliarRole) -> FamiliarRecord {
    fam.roles.insert(role);
    fam
}

pub fn with_special(mut fam: FamiliarRecord, special: FamiliarSpecial) -> FamiliarRecord {
    fam.special = Some(special);
    fam
}

pub fn carrying(mut fam: FamiliarRecord, carried: ModifierVector) -> FamiliarRecord {
    fam.carried_modifiers = carried;
    fam
}

/// Collects records into a finalized GameData.
#[derive(Default)]
pub struct DataBuilder {
    data: GameData,
}

impl DataBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn item(mut self, item: ItemBuilder) -> Self {
        self.data.items.push(item.build());
        self
    }

    pub fn items(mut self, items: impl IntoIterator<Item = ItemBuilder>) -> Self {
        self.data.items.extend(items.into_iter().map(|i| i.build()));
        self
    }

    pub fn outfit(mut self, id: u32, name: &str, pieces: &[u32], modifiers: ModifierVector) -> Self {
        self.data.outfits.push(OutfitRecord {
            id: OutfitId(id),
            name: name.to_string(),
            pieces: pieces.iter().map(|p| ItemId(*p)).collect(),
            modifiers,
        });
        self
    }

    pub fn synergy(mut self, name: &str, members: &[u32], modifiers: ModifierVector) -> Self {
        self.data.synergies.push(SynergyRecord {
            name: name.to_string(),
            members: members.iter().map(|m| ItemId(*m)).collect(),
            modifiers,
        });
        self
    }

    pub fn familiar(mut self, fam: FamiliarRecord) -> Self {
        self.data.familiars.push(fam);
        self
    }

    pub fn effect(mut self, name: &str, modifiers: ModifierVector) -> Self {
        self.data.effects.insert(name.to_string(), modifiers);
        self
    }

    pub fn raw(self) -> GameData {
        self.data
    }

    pub fn build(self) -> GameData {
        self.data.finalize().expect("fixture data must validate")
    }
}

pub fn mods() -> ModifierVector {
    ModifierVector::new()
}

/// One copy of each listed item.
pub fn owning(ids: &[u32]) -> BTreeMap<ItemId, u32> {
    ids.iter().map(|id| (ItemId(*id), 1)).collect()
}

pub fn wearing(slots: &[(EquipSlot, u32)]) -> Equipment {
    slots
        .iter()
        .fold(Equipment::empty(), |eq, (slot, id)| eq.with(*slot, ItemId(*id)))
}

pub fn owned_familiar(id: u32, weight: u32) -> OwnedFamiliar {
    OwnedFamiliar {
        id: FamiliarId(id),
        weight,
    }
}

pub fn stats(muscle: u32, mysticality: u32, moxie: u32) -> StatBlock {
    StatBlock {
        muscle,
        mysticality,
        moxie,
    }
}

/// A plain seal clubber holding one of each listed item.
pub fn clubber(ids: &[u32]) -> CharacterContext {
    CharacterContext::builder()
        .class(CharacterClass::SealClubber)
        .base_stats(stats(20, 10, 10))
        .inventory(owning(ids))
        .build()
}

pub fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-6
}
