use crate::data::ItemId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ops::{Index, IndexMut};
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumCount, EnumIter};

/// Equipment slots a user can address in an expression. The first ten hold
/// items; the last three are sub-slots of carrier items.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Display,
    EnumIter,
    EnumCount,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum EquipSlot {
    #[strum(to_string = "hat")]
    Hat,
    #[strum(to_string = "weapon")]
    Weapon,
    #[strum(to_string = "off-hand")]
    Offhand,
    #[strum(to_string = "back")]
    Container,
    #[strum(to_string = "shirt")]
    Shirt,
    #[strum(to_string = "pants")]
    Pants,
    #[strum(to_string = "acc1")]
    Acc1,
    #[strum(to_string = "acc2")]
    Acc2,
    #[strum(to_string = "acc3")]
    Acc3,
    #[strum(to_string = "familiar")]
    Familiar,
    #[strum(to_string = "crown-of-thrones")]
    CrownOfThrones,
    #[strum(to_string = "buddy-bjorn")]
    BuddyBjorn,
    #[strum(to_string = "card-sleeve")]
    CardSleeve,
}

pub const CORE_SLOTS: usize = 10;

pub const ACCESSORY_SLOTS: [EquipSlot; 3] = [EquipSlot::Acc1, EquipSlot::Acc2, EquipSlot::Acc3];

impl EquipSlot {
    pub fn from_keyword(keyword: &str) -> Option<EquipSlot> {
        let slot = match keyword.trim() {
            "hat" => EquipSlot::Hat,
            "weapon" => EquipSlot::Weapon,
            "off-hand" | "offhand" => EquipSlot::Offhand,
            "back" | "container" => EquipSlot::Container,
            "shirt" => EquipSlot::Shirt,
            "pants" => EquipSlot::Pants,
            "acc1" => EquipSlot::Acc1,
            "acc2" => EquipSlot::Acc2,
            "acc3" => EquipSlot::Acc3,
            "familiar" => EquipSlot::Familiar,
            "crown-of-thrones" => EquipSlot::CrownOfThrones,
            "buddy-bjorn" => EquipSlot::BuddyBjorn,
            "card-sleeve" => EquipSlot::CardSleeve,
            _ => return None,
        };
        Some(slot)
    }

    pub fn is_core(self) -> bool {
        (self as usize) < CORE_SLOTS
    }

    pub fn is_accessory(self) -> bool {
        matches!(self, EquipSlot::Acc1 | EquipSlot::Acc2 | EquipSlot::Acc3)
    }

    pub fn core() -> impl Iterator<Item = EquipSlot> {
        EquipSlot::iter().filter(|s| s.is_core())
    }
}

/// What kind of gear an item is, independent of which slot it ends up in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Hat,
    Weapon,
    Offhand,
    Container,
    Shirt,
    Pants,
    Accessory,
    Familiar,
}

impl ItemKind {
    pub fn home_slot(self) -> EquipSlot {
        match self {
            ItemKind::Hat => EquipSlot::Hat,
            ItemKind::Weapon => EquipSlot::Weapon,
            ItemKind::Offhand => EquipSlot::Offhand,
            ItemKind::Container => EquipSlot::Container,
            ItemKind::Shirt => EquipSlot::Shirt,
            ItemKind::Pants => EquipSlot::Pants,
            ItemKind::Accessory => EquipSlot::Acc1,
            ItemKind::Familiar => EquipSlot::Familiar,
        }
    }
}

/// Ranking buckets used while building shortlists. Several of these are
/// synthetic and map back onto a real slot when merged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SlotKind {
    Hat,
    Weapon,
    /// One-handed weapons, which may also fill the off-hand.
    Weapon1H,
    Offhand,
    /// Off-hand choices that pair with a melee main weapon.
    OffhandMelee,
    /// Off-hand choices that pair with a ranged main weapon.
    OffhandRanged,
    Container,
    Shirt,
    Pants,
    Accessory,
    Watch,
    Familiar,
    /// Familiar-slot list for the n-th `switch` familiar.
    OtherFamiliar(usize),
}

impl SlotKind {
    pub fn for_item(kind: ItemKind) -> SlotKind {
        match kind {
            ItemKind::Hat => SlotKind::Hat,
            ItemKind::Weapon => SlotKind::Weapon,
            ItemKind::Offhand => SlotKind::Offhand,
            ItemKind::Container => SlotKind::Container,
            ItemKind::Shirt => SlotKind::Shirt,
            ItemKind::Pants => SlotKind::Pants,
            ItemKind::Accessory => SlotKind::Accessory,
            ItemKind::Familiar => SlotKind::Familiar,
        }
    }

    /// The real slot a candidate in this bucket is worn in.
    pub fn real_slot(self) -> EquipSlot {
        match self {
            SlotKind::Hat => EquipSlot::Hat,
            SlotKind::Weapon | SlotKind::Weapon1H => EquipSlot::Weapon,
            SlotKind::Offhand | SlotKind::OffhandMelee | SlotKind::OffhandRanged => {
                EquipSlot::Offhand
            }
            SlotKind::Container => EquipSlot::Container,
            SlotKind::Shirt => EquipSlot::Shirt,
            SlotKind::Pants => EquipSlot::Pants,
            SlotKind::Accessory | SlotKind::Watch => EquipSlot::Acc1,
            SlotKind::Familiar | SlotKind::OtherFamiliar(_) => EquipSlot::Familiar,
        }
    }
}

/// One item (or nothing) per core slot.
#[derive(Debug, Clone, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
#[serde(
    from = "BTreeMap<EquipSlot, ItemId>",
    into = "BTreeMap<EquipSlot, ItemId>"
)]
pub struct Equipment([Option<ItemId>; CORE_SLOTS]);

impl Equipment {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with(mut self, slot: EquipSlot, item: ItemId) -> Self {
        self[slot] = Some(item);
        self
    }

    pub fn items(&self) -> impl Iterator<Item = (EquipSlot, ItemId)> + '_ {
        EquipSlot::core().filter_map(move |s| self[s].map(|id| (s, id)))
    }

    pub fn contains(&self, item: ItemId) -> bool {
        self.0.iter().any(|slot| *slot == Some(item))
    }

    pub fn count_of(&self, item: ItemId) -> u32 {
        self.0.iter().filter(|slot| **slot == Some(item)).count() as u32
    }

    /// Number of core slots whose content differs from `other`.
    pub fn differences(&self, other: &Equipment) -> u32 {
        self.0
            .iter()
            .zip(other.0.iter())
            .filter(|(a, b)| a != b)
            .count() as u32
    }
}

impl Index<EquipSlot> for Equipment {
    type Output = Option<ItemId>;

    fn index(&self, slot: EquipSlot) -> &Option<ItemId> {
        static NONE: Option<ItemId> = None;
        if slot.is_core() {
            &self.0[slot as usize]
        } else {
            &NONE
        }
    }
}

impl IndexMut<EquipSlot> for Equipment {
    fn index_mut(&mut self, slot: EquipSlot) -> &mut Option<ItemId> {
        &mut self.0[slot as usize]
    }
}

impl From<BTreeMap<EquipSlot, ItemId>> for Equipment {
    fn from(map: BTreeMap<EquipSlot, ItemId>) -> Self {
        let mut eq = Equipment::default();
        for (slot, item) in map {
            if slot.is_core() {
                eq[slot] = Some(item);
            }
        }
        eq
    }
}

impl From<Equipment> for BTreeMap<EquipSlot, ItemId> {
    fn from(eq: Equipment) -> Self {
        eq.items().collect()
    }
}
