use super::{GameData, ItemId};
use crate::error::{GearForgeError, GfResult};
use crate::modifiers::BitmapAxis;
use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::{debug, warn};

const MAX_SYNERGIES: usize = 64;

impl GameData {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> GfResult<Self> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    pub fn from_reader<R: Read>(reader: R) -> GfResult<Self> {
        let data: GameData = serde_json::from_reader(reader)?;
        data.finalize()
    }

    /// Sorts records by id, builds lookup tables, derives the synergy
    /// bitmaps and checks cross references.
    pub fn finalize(mut self) -> GfResult<Self> {
        self.items.sort_by_key(|i| i.id);
        self.familiars.sort_by_key(|f| f.id);
        self.outfits.sort_by_key(|o| o.id);

        self.item_index.clear();
        for (i, item) in self.items.iter().enumerate() {
            if self.item_index.insert(item.id, i).is_some() {
                return Err(GearForgeError::Validation(format!(
                    "duplicate item id {}",
                    item.id
                )));
            }
            if item.is_weapon() && item.hands == 0 {
                return Err(GearForgeError::Validation(format!(
                    "weapon '{}' declares zero hands",
                    item.name
                )));
            }
        }

        self.familiar_index.clear();
        for (i, fam) in self.familiars.iter().enumerate() {
            if self.familiar_index.insert(fam.id, i).is_some() {
                return Err(GearForgeError::Validation(format!(
                    "duplicate familiar id {}",
                    fam.id
                )));
            }
        }

        self.piece_outfit.clear();
        for (i, outfit) in self.outfits.iter().enumerate() {
            if outfit.pieces.is_empty() {
                return Err(GearForgeError::Validation(format!(
                    "outfit '{}' has no pieces",
                    outfit.name
                )));
            }
            for piece in &outfit.pieces {
                if !self.item_index.contains_key(piece) {
                    return Err(GearForgeError::Validation(format!(
                        "outfit '{}' references unknown item {}",
                        outfit.name, piece
                    )));
                }
                self.piece_outfit.insert(*piece, i);
            }
        }

        if self.synergies.len() > MAX_SYNERGIES {
            return Err(GearForgeError::Validation(format!(
                "at most {} synergies are supported, got {}",
                MAX_SYNERGIES,
                self.synergies.len()
            )));
        }
        let mut synergy_bits: HashMap<ItemId, u64> = HashMap::new();
        for (bit, synergy) in self.synergies.iter().enumerate() {
            if synergy.members.len() < 2 {
                return Err(GearForgeError::Validation(format!(
                    "synergy '{}' needs at least two members",
                    synergy.name
                )));
            }
            for member in &synergy.members {
                if !self.item_index.contains_key(member) {
                    return Err(GearForgeError::Validation(format!(
                        "synergy '{}' references unknown item {}",
                        synergy.name, member
                    )));
                }
                *synergy_bits.entry(*member).or_default() |= 1u64 << bit;
            }
        }
        for item in self.items.iter_mut() {
            if let Some(bits) = synergy_bits.get(&item.id) {
                item.modifiers = item
                    .modifiers
                    .clone()
                    .with_bitmap(BitmapAxis::Synergetic, *bits);
            }
        }

        for item in &self.items {
            if let Some(effect) = item.modifiers.intrinsic_effect() {
                if self.effect(effect).is_none() {
                    warn!(
                        "Item '{}' grants unknown intrinsic effect '{}'",
                        item.name, effect
                    );
                }
            }
        }

        debug!(
            "Game data ready: {} items, {} outfits, {} synergies, {} familiars",
            self.items.len(),
            self.outfits.len(),
            self.synergies.len(),
            self.familiars.len()
        );
        Ok(self)
    }
}

/// Reads `name-or-id<TAB>count` lines into an inventory map.
pub fn load_inventory<R: Read>(reader: R, data: &GameData) -> GfResult<BTreeMap<ItemId, u32>> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true)
        .comment(Some(b'#'))
        .from_reader(reader);

    let mut inventory = BTreeMap::new();
    for result in rdr.records() {
        let record = result?;
        let key = record.get(0).unwrap_or("").trim();
        if key.is_empty() {
            continue;
        }
        let count: u32 = match record.get(1) {
            Some(raw) => raw.trim().parse().map_err(|_| {
                GearForgeError::Validation(format!("bad count '{}' for '{}'", raw, key))
            })?,
            None => 1,
        };
        let item = data
            .find_item(key)
            .ok_or_else(|| GearForgeError::UnknownItem(key.to_string()))?;
        *inventory.entry(item.id).or_insert(0) += count;
    }
    Ok(inventory)
}

pub fn load_inventory_file<P: AsRef<Path>>(
    path: P,
    data: &GameData,
) -> GfResult<BTreeMap<ItemId, u32>> {
    let file = File::open(path)?;
    load_inventory(BufReader::new(file), data)
}
