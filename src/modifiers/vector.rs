use super::axis::{Axis, AxisArray, BitmapAxis, Flag, FlagSet};
use crate::error::GearForgeError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::iter::Sum;
use std::ops::Add;
use strum::{EnumCount, IntoEnumIterator};

/// String-valued modifiers. Combination keeps the first non-empty value.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StringMods {
    pub class: Option<String>,
    pub intrinsic_effect: Option<String>,
    pub rollover_effect: Option<String>,
    pub outfit: Option<String>,
}

impl StringMods {
    fn merged(&self, other: &StringMods) -> StringMods {
        StringMods {
            class: self.class.clone().or_else(|| other.class.clone()),
            intrinsic_effect: self
                .intrinsic_effect
                .clone()
                .or_else(|| other.intrinsic_effect.clone()),
            rollover_effect: self
                .rollover_effect
                .clone()
                .or_else(|| other.rollover_effect.clone()),
            outfit: self.outfit.clone().or_else(|| other.outfit.clone()),
        }
    }
}

/// A fixed set of numeric axes, boolean flags, set bitmaps and string
/// modifiers describing the effect of a piece of gear, an effect, or a whole
/// configuration. The zero vector has no effect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawModifiers", into = "RawModifiers")]
pub struct ModifierVector {
    values: AxisArray<f64>,
    flags: FlagSet,
    bitmaps: [u64; BitmapAxis::COUNT],
    strings: StringMods,
}

impl Default for ModifierVector {
    fn default() -> Self {
        Self {
            values: AxisArray::filled(0.0),
            flags: FlagSet::EMPTY,
            bitmaps: [0; BitmapAxis::COUNT],
            strings: StringMods::default(),
        }
    }
}

impl ModifierVector {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline(always)]
    pub fn get(&self, axis: Axis) -> f64 {
        self.values[axis]
    }

    pub fn with(mut self, axis: Axis, value: f64) -> Self {
        self.values[axis] = value;
        self
    }

    pub fn with_flag(mut self, flag: Flag) -> Self {
        self.flags.insert(flag);
        self
    }

    pub fn with_bitmap(mut self, axis: BitmapAxis, bits: u64) -> Self {
        self.bitmaps[axis as usize] |= bits;
        self
    }

    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.strings.class = Some(class.into());
        self
    }

    pub fn with_intrinsic_effect(mut self, effect: impl Into<String>) -> Self {
        self.strings.intrinsic_effect = Some(effect.into());
        self
    }

    pub fn with_rollover_effect(mut self, effect: impl Into<String>) -> Self {
        self.strings.rollover_effect = Some(effect.into());
        self
    }

    pub fn with_outfit(mut self, outfit: impl Into<String>) -> Self {
        self.strings.outfit = Some(outfit.into());
        self
    }

    pub fn has_flag(&self, flag: Flag) -> bool {
        self.flags.contains(flag)
    }

    pub fn flags(&self) -> FlagSet {
        self.flags
    }

    pub fn raw_bitmap(&self, axis: BitmapAxis) -> u64 {
        self.bitmaps[axis as usize]
    }

    /// Number of distinct set members present.
    pub fn bitmap_count(&self, axis: BitmapAxis) -> u32 {
        self.bitmaps[axis as usize].count_ones()
    }

    pub fn class(&self) -> Option<&str> {
        self.strings.class.as_deref()
    }

    pub fn intrinsic_effect(&self) -> Option<&str> {
        self.strings.intrinsic_effect.as_deref()
    }

    pub fn rollover_effect(&self) -> Option<&str> {
        self.strings.rollover_effect.as_deref()
    }

    pub fn outfit(&self) -> Option<&str> {
        self.strings.outfit.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.values.iter().all(|(_, v)| v == 0.0)
            && self.flags.is_empty()
            && self.bitmaps.iter().all(|b| *b == 0)
            && self.strings == StringMods::default()
    }

    /// Returns a new vector holding the sum of both.
    pub fn combine(&self, other: &ModifierVector) -> ModifierVector {
        let mut values = self.values.clone();
        for (axis, v) in other.values.iter() {
            if v != 0.0 {
                values[axis] += v;
            }
        }
        let mut bitmaps = self.bitmaps;
        for (slot, bits) in bitmaps.iter_mut().zip(other.bitmaps.iter()) {
            *slot |= bits;
        }
        ModifierVector {
            values,
            flags: self.flags.union(other.flags),
            bitmaps,
            strings: self.strings.merged(&other.strings),
        }
    }

    /// Numeric axes multiplied by `factor`. Flags, bitmaps and strings are kept.
    pub fn scaled(&self, factor: f64) -> ModifierVector {
        let mut out = self.clone();
        for axis in Axis::iter() {
            out.values[axis] *= factor;
        }
        out
    }

    /// Non-zero numeric axes, in axis order.
    pub fn nonzero(&self) -> impl Iterator<Item = (Axis, f64)> + '_ {
        self.values.iter().filter(|(_, v)| *v != 0.0)
    }
}

impl Add<&ModifierVector> for &ModifierVector {
    type Output = ModifierVector;

    fn add(self, rhs: &ModifierVector) -> ModifierVector {
        self.combine(rhs)
    }
}

impl<'a> Sum<&'a ModifierVector> for ModifierVector {
    fn sum<I: Iterator<Item = &'a ModifierVector>>(iter: I) -> ModifierVector {
        iter.fold(ModifierVector::default(), |acc, v| acc.combine(v))
    }
}

/// On-disk shape: display names as keys, zero axes omitted.
#[derive(Debug, Default, Serialize, Deserialize)]
struct RawModifiers {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    flags: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    bitmaps: BTreeMap<String, u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    class: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    intrinsic_effect: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    rollover_effect: Option<String>,
    #[serde(flatten)]
    values: BTreeMap<String, f64>,
}

impl TryFrom<RawModifiers> for ModifierVector {
    type Error = GearForgeError;

    fn try_from(raw: RawModifiers) -> Result<Self, Self::Error> {
        let mut mods = ModifierVector::default();
        for (name, value) in raw.values {
            let axis = Axis::find_name(&name).ok_or_else(|| {
                GearForgeError::Validation(format!("unknown modifier '{}'", name))
            })?;
            mods.values[axis] += value;
        }
        for name in raw.flags {
            let flag = Flag::find_name(&name).ok_or_else(|| {
                GearForgeError::Validation(format!("unknown boolean modifier '{}'", name))
            })?;
            mods.flags.insert(flag);
        }
        for (name, bits) in raw.bitmaps {
            let axis: BitmapAxis = name.parse().map_err(|_| {
                GearForgeError::Validation(format!("unknown bitmap modifier '{}'", name))
            })?;
            mods.bitmaps[axis as usize] |= bits;
        }
        mods.strings.class = raw.class;
        mods.strings.intrinsic_effect = raw.intrinsic_effect;
        mods.strings.rollover_effect = raw.rollover_effect;
        Ok(mods)
    }
}

impl From<ModifierVector> for RawModifiers {
    fn from(mods: ModifierVector) -> Self {
        RawModifiers {
            flags: mods.flags.iter().map(|f| f.to_string()).collect(),
            bitmaps: BitmapAxis::iter()
                .filter(|b| mods.bitmaps[*b as usize] != 0)
                .map(|b| (b.to_string(), mods.bitmaps[b as usize]))
                .collect(),
            class: mods.strings.class,
            intrinsic_effect: mods.strings.intrinsic_effect,
            rollover_effect: mods.strings.rollover_effect,
            values: mods
                .values
                .iter()
                .filter(|(_, v)| *v != 0.0)
                .map(|(a, v)| (a.to_string(), v))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combine_leaves_operands_untouched() {
        let a = ModifierVector::new().with(Axis::ItemDrop, 10.0);
        let b = ModifierVector::new()
            .with(Axis::ItemDrop, 5.0)
            .with_flag(Flag::Single)
            .with_bitmap(BitmapAxis::Clownosity, 0b01);
        let c = &a + &b;
        assert_eq!(c.get(Axis::ItemDrop), 15.0);
        assert!(c.has_flag(Flag::Single));
        assert_eq!(a.get(Axis::ItemDrop), 10.0);
        assert!(!a.has_flag(Flag::Single));
    }

    #[test]
    fn test_bitmaps_count_distinct_members() {
        let a = ModifierVector::new().with_bitmap(BitmapAxis::Clownosity, 0b011);
        let b = ModifierVector::new().with_bitmap(BitmapAxis::Clownosity, 0b110);
        assert_eq!(a.combine(&b).bitmap_count(BitmapAxis::Clownosity), 3);
    }

    #[test]
    fn test_json_shape() {
        let json = r#"{"Muscle": 5, "item drop": 10, "flags": ["Single Equip"], "bitmaps": {"Clownosity": 1}, "class": "Sauceror"}"#;
        let mods: ModifierVector = serde_json::from_str(json).unwrap();
        assert_eq!(mods.get(Axis::Muscle), 5.0);
        assert_eq!(mods.get(Axis::ItemDrop), 10.0);
        assert!(mods.has_flag(Flag::Single));
        assert_eq!(mods.class(), Some("Sauceror"));

        let back = serde_json::to_string(&mods).unwrap();
        let again: ModifierVector = serde_json::from_str(&back).unwrap();
        assert_eq!(mods, again);
    }

    #[test]
    fn test_unknown_name_is_rejected() {
        let res: Result<ModifierVector, _> = serde_json::from_str(r#"{"Charisma": 3}"#);
        assert!(res.is_err());
    }
}
