use std::ops::{Index, IndexMut};
use strum::{EnumCount, IntoEnumIterator};
use strum_macros::{Display, EnumIter, EnumString, IntoStaticStr};

/// Numeric modifier axes. The display string is the name used in data files
/// and matched (case-insensitively) by the expression parser.
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
    EnumString,
    EnumIter,
    EnumCount,
    IntoStaticStr,
)]
#[strum(ascii_case_insensitive)]
pub enum Axis {
    #[strum(serialize = "Familiar Weight")]
    FamiliarWeight,
    #[strum(serialize = "Familiar Weight Percent")]
    FamiliarWeightPercent,
    #[strum(serialize = "Hidden Familiar Weight")]
    HiddenFamiliarWeight,
    #[strum(serialize = "Familiar Experience")]
    FamiliarExperience,
    #[strum(serialize = "Monster Level")]
    MonsterLevel,
    #[strum(serialize = "Combat Rate")]
    CombatRate,
    #[strum(serialize = "Underwater Combat Rate")]
    UnderwaterCombatRate,
    #[strum(serialize = "Initiative")]
    Initiative,
    #[strum(serialize = "Initiative Penalty")]
    InitiativePenalty,
    #[strum(serialize = "Experience")]
    Experience,
    #[strum(serialize = "Muscle Experience")]
    MuscleExperience,
    #[strum(serialize = "Mysticality Experience")]
    MysticalityExperience,
    #[strum(serialize = "Moxie Experience")]
    MoxieExperience,
    #[strum(serialize = "Muscle Experience Percent")]
    MuscleExperiencePercent,
    #[strum(serialize = "Mysticality Experience Percent")]
    MysticalityExperiencePercent,
    #[strum(serialize = "Moxie Experience Percent")]
    MoxieExperiencePercent,
    #[strum(serialize = "Item Drop")]
    ItemDrop,
    #[strum(serialize = "Item Drop Penalty")]
    ItemDropPenalty,
    #[strum(serialize = "Sporadic Item Drop")]
    SporadicItemDrop,
    #[strum(serialize = "Meat Drop")]
    MeatDrop,
    #[strum(serialize = "Meat Drop Penalty")]
    MeatDropPenalty,
    #[strum(serialize = "Sporadic Meat Drop")]
    SporadicMeatDrop,
    #[strum(serialize = "Meat Bonus")]
    MeatBonus,
    #[strum(serialize = "Food Drop")]
    FoodDrop,
    #[strum(serialize = "Booze Drop")]
    BoozeDrop,
    #[strum(serialize = "Hat Drop")]
    HatDrop,
    #[strum(serialize = "Weapon Drop")]
    WeaponDrop,
    #[strum(serialize = "Offhand Drop")]
    OffhandDrop,
    #[strum(serialize = "Shirt Drop")]
    ShirtDrop,
    #[strum(serialize = "Pants Drop")]
    PantsDrop,
    #[strum(serialize = "Accessory Drop")]
    AccessoryDrop,
    #[strum(serialize = "Candy Drop")]
    CandyDrop,
    #[strum(serialize = "Gear Drop")]
    GearDrop,
    #[strum(serialize = "Pickpocket Chance")]
    PickpocketChance,
    #[strum(serialize = "Damage Absorption")]
    DamageAbsorption,
    #[strum(serialize = "Damage Reduction")]
    DamageReduction,
    #[strum(serialize = "Cold Resistance")]
    ColdResistance,
    #[strum(serialize = "Hot Resistance")]
    HotResistance,
    #[strum(serialize = "Sleaze Resistance")]
    SleazeResistance,
    #[strum(serialize = "Spooky Resistance")]
    SpookyResistance,
    #[strum(serialize = "Stench Resistance")]
    StenchResistance,
    #[strum(serialize = "Mana Cost")]
    ManaCost,
    #[strum(serialize = "Stackable Mana Cost")]
    StackableManaCost,
    #[strum(serialize = "Muscle")]
    Muscle,
    #[strum(serialize = "Muscle Percent")]
    MusclePercent,
    #[strum(serialize = "Mysticality")]
    Mysticality,
    #[strum(serialize = "Mysticality Percent")]
    MysticalityPercent,
    #[strum(serialize = "Moxie")]
    Moxie,
    #[strum(serialize = "Moxie Percent")]
    MoxiePercent,
    #[strum(serialize = "Maximum HP")]
    MaximumHp,
    #[strum(serialize = "Maximum HP Percent")]
    MaximumHpPercent,
    #[strum(serialize = "Maximum MP")]
    MaximumMp,
    #[strum(serialize = "Maximum MP Percent")]
    MaximumMpPercent,
    #[strum(serialize = "Weapon Damage")]
    WeaponDamage,
    #[strum(serialize = "Weapon Damage Percent")]
    WeaponDamagePercent,
    #[strum(serialize = "Ranged Damage")]
    RangedDamage,
    #[strum(serialize = "Ranged Damage Percent")]
    RangedDamagePercent,
    #[strum(serialize = "Spell Damage")]
    SpellDamage,
    #[strum(serialize = "Spell Damage Percent")]
    SpellDamagePercent,
    #[strum(serialize = "Cold Damage")]
    ColdDamage,
    #[strum(serialize = "Hot Damage")]
    HotDamage,
    #[strum(serialize = "Sleaze Damage")]
    SleazeDamage,
    #[strum(serialize = "Spooky Damage")]
    SpookyDamage,
    #[strum(serialize = "Stench Damage")]
    StenchDamage,
    #[strum(serialize = "Cold Spell Damage")]
    ColdSpellDamage,
    #[strum(serialize = "Hot Spell Damage")]
    HotSpellDamage,
    #[strum(serialize = "Sleaze Spell Damage")]
    SleazeSpellDamage,
    #[strum(serialize = "Spooky Spell Damage")]
    SpookySpellDamage,
    #[strum(serialize = "Stench Spell Damage")]
    StenchSpellDamage,
    #[strum(serialize = "Critical Hit Percent")]
    CriticalHitPercent,
    #[strum(serialize = "Spell Critical Percent")]
    SpellCriticalPercent,
    #[strum(serialize = "Fumble")]
    Fumble,
    #[strum(serialize = "HP Regen Min")]
    HpRegenMin,
    #[strum(serialize = "HP Regen Max")]
    HpRegenMax,
    #[strum(serialize = "MP Regen Min")]
    MpRegenMin,
    #[strum(serialize = "MP Regen Max")]
    MpRegenMax,
    #[strum(serialize = "Adventures")]
    Adventures,
    #[strum(serialize = "PvP Fights")]
    PvpFights,
    #[strum(serialize = "Fairy Weight")]
    FairyWeight,
    #[strum(serialize = "Fairy Effectiveness")]
    FairyEffectiveness,
    #[strum(serialize = "Leprechaun Weight")]
    LeprechaunWeight,
    #[strum(serialize = "Leprechaun Effectiveness")]
    LeprechaunEffectiveness,
    #[strum(serialize = "Volleyball Weight")]
    VolleyballWeight,
    #[strum(serialize = "Volleyball Effectiveness")]
    VolleyballEffectiveness,
    #[strum(serialize = "Sombrero Weight")]
    SombreroWeight,
    #[strum(serialize = "Sombrero Effectiveness")]
    SombreroEffectiveness,
    #[strum(serialize = "Sombrero Bonus")]
    SombreroBonus,
    #[strum(serialize = "Hobo Power")]
    HoboPower,
    #[strum(serialize = "Smithsness")]
    Smithsness,
    #[strum(serialize = "Slime Hates It")]
    SlimeHatesIt,
    #[strum(serialize = "Sprinkle Drop")]
    SprinkleDrop,
    #[strum(serialize = "Random Monster Modifiers")]
    RandomMonsterModifiers,
    #[strum(serialize = "DB Combat Damage")]
    DbCombatDamage,
    #[strum(serialize = "Sixgun Damage")]
    SixgunDamage,
}

impl Axis {
    #[inline(always)]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Exact, case-insensitive lookup by display name.
    pub fn find_name(name: &str) -> Option<Axis> {
        name.trim().parse().ok()
    }
}

/// The three character stats.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    EnumIter,
    serde::Serialize,
    serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(ascii_case_insensitive)]
pub enum Stat {
    Muscle,
    Mysticality,
    Moxie,
}

impl Stat {
    pub fn axis(self) -> Axis {
        match self {
            Stat::Muscle => Axis::Muscle,
            Stat::Mysticality => Axis::Mysticality,
            Stat::Moxie => Axis::Moxie,
        }
    }

    pub fn percent_axis(self) -> Axis {
        match self {
            Stat::Muscle => Axis::MusclePercent,
            Stat::Mysticality => Axis::MysticalityPercent,
            Stat::Moxie => Axis::MoxiePercent,
        }
    }

    pub fn experience_axis(self) -> Axis {
        match self {
            Stat::Muscle => Axis::MuscleExperience,
            Stat::Mysticality => Axis::MysticalityExperience,
            Stat::Moxie => Axis::MoxieExperience,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum Element {
    Cold,
    Hot,
    Sleaze,
    Spooky,
    Stench,
}

impl Element {
    pub fn resistance(self) -> Axis {
        match self {
            Element::Cold => Axis::ColdResistance,
            Element::Hot => Axis::HotResistance,
            Element::Sleaze => Axis::SleazeResistance,
            Element::Spooky => Axis::SpookyResistance,
            Element::Stench => Axis::StenchResistance,
        }
    }

    pub fn damage(self) -> Axis {
        match self {
            Element::Cold => Axis::ColdDamage,
            Element::Hot => Axis::HotDamage,
            Element::Sleaze => Axis::SleazeDamage,
            Element::Spooky => Axis::SpookyDamage,
            Element::Stench => Axis::StenchDamage,
        }
    }

    pub fn immunity(self) -> Flag {
        match self {
            Element::Cold => Flag::ColdImmunity,
            Element::Hot => Flag::HotImmunity,
            Element::Sleaze => Flag::SleazeImmunity,
            Element::Spooky => Flag::SpookyImmunity,
            Element::Stench => Flag::StenchImmunity,
        }
    }

    pub fn vulnerability(self) -> Flag {
        match self {
            Element::Cold => Flag::ColdVulnerability,
            Element::Hot => Flag::HotVulnerability,
            Element::Sleaze => Flag::SleazeVulnerability,
            Element::Spooky => Flag::SpookyVulnerability,
            Element::Stench => Flag::StenchVulnerability,
        }
    }

    pub fn from_resistance(axis: Axis) -> Option<Element> {
        Element::iter().find(|e| e.resistance() == axis)
    }
}

/// Boolean modifiers. Packed into a [`FlagSet`].
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
    EnumString,
    EnumIter,
    EnumCount,
    IntoStaticStr,
)]
#[strum(ascii_case_insensitive)]
pub enum Flag {
    #[strum(serialize = "Single Equip")]
    Single,
    #[strum(serialize = "Unarmed")]
    Unarmed,
    #[strum(serialize = "Nonstackable Watch")]
    NonstackableWatch,
    #[strum(serialize = "Cold Immunity")]
    ColdImmunity,
    #[strum(serialize = "Hot Immunity")]
    HotImmunity,
    #[strum(serialize = "Sleaze Immunity")]
    SleazeImmunity,
    #[strum(serialize = "Spooky Immunity")]
    SpookyImmunity,
    #[strum(serialize = "Stench Immunity")]
    StenchImmunity,
    #[strum(serialize = "Cold Vulnerability")]
    ColdVulnerability,
    #[strum(serialize = "Hot Vulnerability")]
    HotVulnerability,
    #[strum(serialize = "Sleaze Vulnerability")]
    SleazeVulnerability,
    #[strum(serialize = "Spooky Vulnerability")]
    SpookyVulnerability,
    #[strum(serialize = "Stench Vulnerability")]
    StenchVulnerability,
    #[strum(serialize = "Adventure Underwater")]
    AdventureUnderwater,
    #[strum(serialize = "Underwater Familiar")]
    UnderwaterFamiliar,
    #[strum(serialize = "Never Fumble")]
    NeverFumble,
    #[strum(serialize = "Weakens Monster")]
    WeakensMonster,
    #[strum(serialize = "Four Songs")]
    FourSongs,
    #[strum(serialize = "Moxie Controls MP")]
    MoxieControlsMp,
    #[strum(serialize = "Free Pull")]
    FreePull,
    #[strum(serialize = "Variable")]
    Variable,
    #[strum(serialize = "Breakable")]
    Breakable,
    #[strum(serialize = "Drops Items")]
    DropsItems,
    #[strum(serialize = "Drops Meat")]
    DropsMeat,
}

impl Flag {
    #[inline(always)]
    pub fn bit(self) -> u64 {
        1u64 << (self as u32)
    }

    pub fn find_name(name: &str) -> Option<Flag> {
        name.trim().parse().ok()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FlagSet(u64);

impl FlagSet {
    pub const EMPTY: FlagSet = FlagSet(0);

    pub fn bits(self) -> u64 {
        self.0
    }

    pub fn contains(self, flag: Flag) -> bool {
        self.0 & flag.bit() != 0
    }

    pub fn insert(&mut self, flag: Flag) {
        self.0 |= flag.bit();
    }

    pub fn union(self, other: FlagSet) -> FlagSet {
        FlagSet(self.0 | other.0)
    }

    pub fn intersection(self, other: FlagSet) -> FlagSet {
        FlagSet(self.0 & other.0)
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn iter(self) -> impl Iterator<Item = Flag> {
        Flag::iter().filter(move |f| self.contains(*f))
    }
}

impl FromIterator<Flag> for FlagSet {
    fn from_iter<I: IntoIterator<Item = Flag>>(iter: I) -> Self {
        let mut set = FlagSet::EMPTY;
        for f in iter {
            set.insert(f);
        }
        set
    }
}

/// Set-membership bitmaps. Combined by OR; the achieved amount is the
/// number of distinct bits present.
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
    EnumString,
    EnumIter,
    EnumCount,
)]
#[strum(ascii_case_insensitive)]
pub enum BitmapAxis {
    Clownosity,
    Raveosity,
    Synergetic,
    Brimstone,
    Cloathing,
    Mutex,
}

/// Fixed-size table indexed by [`Axis`].
#[derive(Debug, Clone, PartialEq)]
pub struct AxisArray<T>([T; Axis::COUNT]);

impl<T: Copy> AxisArray<T> {
    pub fn filled(value: T) -> Self {
        AxisArray([value; Axis::COUNT])
    }

    pub fn iter(&self) -> impl Iterator<Item = (Axis, T)> + '_ {
        Axis::iter().zip(self.0.iter().copied())
    }
}

impl<T> Index<Axis> for AxisArray<T> {
    type Output = T;

    #[inline(always)]
    fn index(&self, axis: Axis) -> &T {
        &self.0[axis.index()]
    }
}

impl<T> IndexMut<Axis> for AxisArray<T> {
    #[inline(always)]
    fn index_mut(&mut self, axis: Axis) -> &mut T {
        &mut self.0[axis.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_round_trip_case_insensitively() {
        for axis in Axis::iter() {
            let name = axis.to_string();
            assert_eq!(Axis::find_name(&name.to_lowercase()), Some(axis));
        }
        assert_eq!(Axis::find_name("item drop"), Some(Axis::ItemDrop));
        assert_eq!(Axis::find_name("item"), None);
    }

    #[test]
    fn test_flags_fit_in_bitset() {
        assert!(Flag::COUNT <= 64);
        let set: FlagSet = [Flag::Single, Flag::Unarmed].into_iter().collect();
        assert!(set.contains(Flag::Unarmed));
        assert!(!set.contains(Flag::NeverFumble));
        assert_eq!(set.iter().count(), 2);
    }
}
