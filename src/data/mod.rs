pub mod loader;

use crate::character::Path;
use crate::modifiers::{Axis, BitmapAxis, ModifierVector, Stat};
use crate::slots::ItemKind;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use strum_macros::{Display, EnumIter};

macro_rules! id_type {
    ($name:ident) => {
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u32);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_type!(ItemId);
id_type!(FamiliarId);
id_type!(OutfitId);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemTag {
    Shield,
    MainhandOnly,
    Chefstaff,
    SauceGlove,
    HoboFocus,
    /// Hat that lets a second familiar ride along (Crown of Thrones).
    CarrierHat,
    /// Back item that lets a second familiar ride along (Buddy Bjorn).
    CarrierBack,
    CardSleeve,
    SleeveCard,
    /// Weapon whose item-drop bonus only exists while charged.
    ChargedItemDrop,
    /// Shirt whose experience bonus only exists while charged.
    ChargedExperience,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatRequirement {
    pub stat: Stat,
    pub amount: u32,
}

/// One selectable configuration of an option item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemOption {
    pub name: String,
    #[serde(default)]
    pub modifiers: ModifierVector,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemRecord {
    pub id: ItemId,
    pub name: String,
    pub kind: ItemKind,
    #[serde(default)]
    pub hands: u8,
    #[serde(default)]
    pub ranged: bool,
    #[serde(default)]
    pub weapon_type: Option<String>,
    #[serde(default)]
    pub tags: BTreeSet<ItemTag>,
    #[serde(default)]
    pub fold_group: Option<String>,
    #[serde(default)]
    pub requirement: Option<StatRequirement>,
    /// Usable in hardcore only while on this path.
    #[serde(default)]
    pub path: Option<Path>,
    /// Familiar-slot items restricted to one familiar race.
    #[serde(default)]
    pub familiar: Option<String>,
    #[serde(default)]
    pub modifiers: ModifierVector,
    /// What a familiar gains from wearing this outside the familiar slot.
    #[serde(default)]
    pub familiar_modifiers: ModifierVector,
    #[serde(default)]
    pub options: Vec<ItemOption>,
}

impl ItemRecord {
    /// Number of `b` letters in the name; the Bees Hate You path caps this.
    pub fn beeosity(&self) -> u32 {
        self.name.chars().filter(|c| matches!(c, 'b' | 'B')).count() as u32
    }

    pub fn has_tag(&self, tag: ItemTag) -> bool {
        self.tags.contains(&tag)
    }

    pub fn is_weapon(&self) -> bool {
        self.kind == ItemKind::Weapon
    }

    pub fn is_melee(&self) -> bool {
        self.is_weapon() && !self.ranged
    }

    pub fn is_two_handed(&self) -> bool {
        self.is_weapon() && self.hands > 1
    }

    pub fn weapon_type_is(&self, ty: &str) -> bool {
        self.weapon_type
            .as_deref()
            .is_some_and(|t| t.eq_ignore_ascii_case(ty))
    }

    pub fn option(&self, name: &str) -> Option<&ItemOption> {
        self.options.iter().find(|o| o.name.eq_ignore_ascii_case(name))
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum FamiliarRole {
    Fairy,
    Leprechaun,
    Volleyball,
    Sombrero,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FamiliarSpecial {
    /// Wears hats.
    Hatrack,
    /// Wears pants.
    Scarecrow,
    /// Wields one-handed weapons.
    DisembodiedHand,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FamiliarRecord {
    pub id: FamiliarId,
    pub race: String,
    #[serde(default)]
    pub roles: BTreeSet<FamiliarRole>,
    #[serde(default)]
    pub special: Option<FamiliarSpecial>,
    #[serde(default = "default_true")]
    pub can_carry: bool,
    #[serde(default = "default_true")]
    pub can_equip: bool,
    #[serde(default)]
    pub underwater: bool,
    /// Passive bonus while this is the active familiar.
    #[serde(default)]
    pub modifiers: ModifierVector,
    /// Bonus while riding in a carrier.
    #[serde(default)]
    pub carried_modifiers: ModifierVector,
}

impl FamiliarRecord {
    /// Whether this familiar can wear `item` in the familiar slot.
    pub fn can_wear(&self, item: &ItemRecord) -> bool {
        if !self.can_equip {
            return false;
        }
        match item.kind {
            ItemKind::Familiar => item
                .familiar
                .as_deref()
                .is_none_or(|race| race.eq_ignore_ascii_case(&self.race)),
            ItemKind::Hat => self.special == Some(FamiliarSpecial::Hatrack),
            ItemKind::Pants => self.special == Some(FamiliarSpecial::Scarecrow),
            ItemKind::Weapon => {
                self.special == Some(FamiliarSpecial::DisembodiedHand)
                    && item.hands <= 1
                    && !item.has_tag(ItemTag::Chefstaff)
            }
            _ => false,
        }
    }

    /// The vector an item contributes when this familiar wears it.
    pub fn worn_modifiers<'a>(&self, item: &'a ItemRecord) -> &'a ModifierVector {
        match (item.kind, self.special) {
            (ItemKind::Hat, Some(FamiliarSpecial::Hatrack))
            | (ItemKind::Pants, Some(FamiliarSpecial::Scarecrow)) => &item.familiar_modifiers,
            _ => &item.modifiers,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutfitRecord {
    pub id: OutfitId,
    pub name: String,
    pub pieces: Vec<ItemId>,
    #[serde(default)]
    pub modifiers: ModifierVector,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynergyRecord {
    pub name: String,
    pub members: Vec<ItemId>,
    #[serde(default)]
    pub modifiers: ModifierVector,
}

/// Set-bonus categories whose per-unit reward is declared in the data file.
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
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum SetBonus {
    HoboPower,
    Smithsness,
    Brimstone,
    Cloathing,
    SlimeHate,
}

impl SetBonus {
    /// Units of this bonus present in a combined vector.
    pub fn units(self, mods: &ModifierVector) -> f64 {
        match self {
            SetBonus::HoboPower => mods.get(Axis::HoboPower),
            SetBonus::Smithsness => mods.get(Axis::Smithsness),
            SetBonus::SlimeHate => mods.get(Axis::SlimeHatesIt),
            SetBonus::Brimstone => mods.bitmap_count(BitmapAxis::Brimstone) as f64,
            SetBonus::Cloathing => mods.bitmap_count(BitmapAxis::Cloathing) as f64,
        }
    }
}

/// Read-only game databases.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GameData {
    #[serde(default)]
    pub items: Vec<ItemRecord>,
    #[serde(default)]
    pub outfits: Vec<OutfitRecord>,
    #[serde(default)]
    pub synergies: Vec<SynergyRecord>,
    #[serde(default)]
    pub familiars: Vec<FamiliarRecord>,
    #[serde(default)]
    pub effects: BTreeMap<String, ModifierVector>,
    #[serde(default)]
    pub set_bonuses: BTreeMap<SetBonus, ModifierVector>,

    #[serde(skip)]
    item_index: HashMap<ItemId, usize>,
    #[serde(skip)]
    familiar_index: HashMap<FamiliarId, usize>,
    #[serde(skip)]
    piece_outfit: HashMap<ItemId, usize>,
}

impl GameData {
    pub fn item(&self, id: ItemId) -> Option<&ItemRecord> {
        self.item_index.get(&id).map(|&i| &self.items[i])
    }

    pub fn familiar(&self, id: FamiliarId) -> Option<&FamiliarRecord> {
        self.familiar_index.get(&id).map(|&i| &self.familiars[i])
    }

    pub fn outfit(&self, id: OutfitId) -> Option<&OutfitRecord> {
        self.outfits.iter().find(|o| o.id == id)
    }

    /// The outfit `item` is a piece of, if any.
    pub fn outfit_of(&self, item: ItemId) -> Option<&OutfitRecord> {
        self.piece_outfit.get(&item).map(|&i| &self.outfits[i])
    }

    pub fn effect(&self, name: &str) -> Option<&ModifierVector> {
        self.effects
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v)
    }

    /// Exact name match first, then the lowest-id item whose name contains
    /// the query.
    pub fn find_item(&self, query: &str) -> Option<&ItemRecord> {
        let q = query.trim().to_lowercase();
        if q.is_empty() {
            return None;
        }
        if let Ok(n) = q.trim_start_matches('[').trim_end_matches(']').parse::<u32>() {
            if let Some(item) = self.item(ItemId(n)) {
                return Some(item);
            }
        }
        self.items
            .iter()
            .find(|i| i.name.to_lowercase() == q)
            .or_else(|| self.items.iter().find(|i| i.name.to_lowercase().contains(&q)))
    }

    pub fn find_outfit(&self, query: &str) -> Option<&OutfitRecord> {
        let q = query.trim().to_lowercase();
        self.outfits
            .iter()
            .find(|o| o.name.to_lowercase() == q)
            .or_else(|| self.outfits.iter().find(|o| o.name.to_lowercase().contains(&q)))
    }

    pub fn find_familiar(&self, query: &str) -> Option<&FamiliarRecord> {
        let q = query.trim().to_lowercase();
        self.familiars
            .iter()
            .find(|f| f.race.to_lowercase() == q)
            .or_else(|| self.familiars.iter().find(|f| f.race.to_lowercase().contains(&q)))
    }

    pub fn outfit_beeosity(&self, outfit: &OutfitRecord) -> u32 {
        outfit
            .pieces
            .iter()
            .filter_map(|id| self.item(*id))
            .map(|i| i.beeosity())
            .sum()
    }

    /// Items sharing a fold group with `item` (including itself).
    pub fn fold_siblings<'a>(&'a self, item: &'a ItemRecord) -> Vec<&'a ItemRecord> {
        match &item.fold_group {
            Some(group) => self
                .items
                .iter()
                .filter(|i| i.fold_group.as_deref() == Some(group.as_str()))
                .collect(),
            None => vec![item],
        }
    }

    pub fn set_bonus(&self, bonus: SetBonus) -> Option<&ModifierVector> {
        self.set_bonuses.get(&bonus)
    }
}
