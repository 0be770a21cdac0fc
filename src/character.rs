use crate::data::{FamiliarId, GameData, ItemId};
use crate::error::GfResult;
use crate::modifiers::{ModifierVector, Stat};
use crate::slots::Equipment;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path as FsPath;
use strum_macros::{Display, EnumIter};
use typed_builder::TypedBuilder;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CharacterClass {
    #[strum(to_string = "Seal Clubber")]
    SealClubber,
    #[strum(to_string = "Turtle Tamer")]
    TurtleTamer,
    #[strum(to_string = "Pastamancer")]
    Pastamancer,
    #[strum(to_string = "Sauceror")]
    Sauceror,
    #[strum(to_string = "Disco Bandit")]
    DiscoBandit,
    #[strum(to_string = "Accordion Thief")]
    AccordionThief,
    #[strum(to_string = "Avatar of Boris")]
    AvatarOfBoris,
    #[strum(to_string = "Zombie Master")]
    ZombieMaster,
    #[strum(to_string = "Avatar of Jarlsberg")]
    AvatarOfJarlsberg,
    #[strum(to_string = "Avatar of Sneaky Pete")]
    AvatarOfSneakyPete,
    #[strum(to_string = "Ed")]
    Ed,
}

impl CharacterClass {
    pub fn prime_stat(self) -> Stat {
        match self {
            CharacterClass::SealClubber
            | CharacterClass::TurtleTamer
            | CharacterClass::AvatarOfBoris
            | CharacterClass::ZombieMaster => Stat::Muscle,
            CharacterClass::Pastamancer
            | CharacterClass::Sauceror
            | CharacterClass::AvatarOfJarlsberg
            | CharacterClass::Ed => Stat::Mysticality,
            CharacterClass::DiscoBandit
            | CharacterClass::AccordionThief
            | CharacterClass::AvatarOfSneakyPete => Stat::Moxie,
        }
    }

    /// Whether a class restriction string names this class.
    pub fn matches(self, restriction: &str) -> bool {
        self.to_string().eq_ignore_ascii_case(restriction.trim())
    }
}

/// Challenge path the character is on.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Path {
    #[default]
    None,
    BeesHateYou,
    AvatarOfBoris,
    ZombieSlayer,
    AvatarOfJarlsberg,
    AvatarOfSneakyPete,
    HeavyRains,
    ActuallyEdTheUndying,
    Axecore,
    KolHighSchool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StatBlock {
    pub muscle: u32,
    pub mysticality: u32,
    pub moxie: u32,
}

impl StatBlock {
    pub fn get(&self, stat: Stat) -> u32 {
        match stat {
            Stat::Muscle => self.muscle,
            Stat::Mysticality => self.mysticality,
            Stat::Moxie => self.moxie,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnedFamiliar {
    pub id: FamiliarId,
    pub weight: u32,
}

fn default_true() -> bool {
    true
}

pub const DUAL_WIELD_SKILL: &str = "Double-Fisted Skull Smashing";
pub const CHEFSTAFF_SKILL: &str = "Spirit of Rigatoni";
pub const KNIFE_SKILL: &str = "Tricky Knifework";
pub const CLUB_SKILL: &str = "Iron Palm Technique";

/// Snapshot of everything about the character the maximizer may read.
/// Nothing in the search mutates it.
#[derive(Debug, Clone, Serialize, Deserialize, TypedBuilder)]
pub struct CharacterContext {
    pub class: CharacterClass,
    #[builder(default)]
    #[serde(default)]
    pub path: Path,
    #[builder(default)]
    #[serde(default)]
    pub hardcore: bool,
    /// False in hardcore or ronin, where the mall is out of reach.
    #[builder(default = true)]
    #[serde(default = "default_true")]
    pub can_interact: bool,
    #[builder(default)]
    #[serde(default)]
    pub base_stats: StatBlock,
    #[builder(default)]
    #[serde(default)]
    pub skills: BTreeSet<String>,
    #[builder(default)]
    #[serde(default)]
    pub inventory: BTreeMap<ItemId, u32>,
    #[builder(default)]
    #[serde(default)]
    pub equipment: Equipment,
    #[builder(default)]
    #[serde(default)]
    pub familiar: Option<OwnedFamiliar>,
    /// Familiars in the terrarium.
    #[builder(default)]
    #[serde(default)]
    pub familiars: Vec<OwnedFamiliar>,
    #[builder(default)]
    #[serde(default)]
    pub enthroned: Option<FamiliarId>,
    #[builder(default)]
    #[serde(default)]
    pub bjorned: Option<FamiliarId>,
    #[builder(default)]
    #[serde(default)]
    pub card: Option<ItemId>,
    /// Current choice for each option item.
    #[builder(default)]
    #[serde(default)]
    pub item_options: BTreeMap<ItemId, String>,
    #[builder(default)]
    #[serde(default)]
    pub item_charges: BTreeMap<ItemId, u32>,
    /// Effects, passive skills and everything else not coming from gear.
    #[builder(default)]
    #[serde(default)]
    pub modifiers: ModifierVector,
    #[builder(default)]
    #[serde(default)]
    pub zone: String,
}

impl CharacterContext {
    pub fn load_from_file<P: AsRef<FsPath>>(path: P) -> GfResult<Self> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn prime_stat(&self) -> Stat {
        self.class.prime_stat()
    }

    pub fn has_skill(&self, skill: &str) -> bool {
        self.skills.iter().any(|s| s.eq_ignore_ascii_case(skill))
    }

    pub fn in_beecore(&self) -> bool {
        self.path == Path::BeesHateYou
    }

    pub fn in_sea(&self) -> bool {
        self.zone.eq_ignore_ascii_case("the sea")
    }

    /// Familiars cannot ride in carriers on these paths.
    pub fn can_carry_familiars(&self) -> bool {
        !matches!(
            self.path,
            Path::AvatarOfJarlsberg | Path::AvatarOfSneakyPete | Path::Axecore
        )
    }

    pub fn owns_familiar(&self, id: FamiliarId) -> Option<OwnedFamiliar> {
        self.familiars
            .iter()
            .chain(self.familiar.iter())
            .find(|f| f.id == id)
            .copied()
    }

    pub fn inventory_count(&self, item: ItemId) -> u32 {
        self.inventory.get(&item).copied().unwrap_or(0)
    }

    /// Copies on hand plus copies currently worn.
    pub fn owned_count(&self, item: ItemId) -> u32 {
        self.inventory_count(item) + self.equipment.count_of(item)
    }

    pub fn is_equipped(&self, item: ItemId) -> bool {
        self.equipment.contains(item)
    }

    /// Copies reachable by folding siblings in the same fold group.
    pub fn foldable_count(&self, item: ItemId, data: &GameData) -> u32 {
        match data.item(item) {
            Some(record) if record.fold_group.is_some() => data
                .fold_siblings(record)
                .iter()
                .filter(|s| s.id != item)
                .map(|s| self.owned_count(s.id))
                .sum(),
            _ => 0,
        }
    }

    pub fn charges(&self, item: ItemId) -> u32 {
        self.item_charges.get(&item).copied().unwrap_or(0)
    }

    pub fn buffed_stat(&self, stat: Stat) -> f64 {
        crate::modifiers::predict::buffed_stat(&self.modifiers, self, stat)
    }
}
