use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::components::{ability::Ability, spells::spell::Spell};

fn is_false(value: &bool) -> bool {
    !*value
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpellSlot {
    pub max: u8,
    pub current: u8,
    /// Pact magic slots are tracked separately from the shared slot pool
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_pact_magic: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SpellSlotError {
    NoSlotsLeft { max: u8 },
}

impl SpellSlot {
    pub fn new(max: u8) -> Self {
        Self {
            max,
            current: max,
            is_pact_magic: false,
        }
    }

    pub fn pact(max: u8) -> Self {
        Self {
            is_pact_magic: true,
            ..Self::new(max)
        }
    }

    pub fn spend(&mut self) -> Result<(), SpellSlotError> {
        if self.current == 0 {
            return Err(SpellSlotError::NoSlotsLeft { max: self.max });
        }
        self.current -= 1;
        Ok(())
    }

    /// Changes the ceiling without refunding spent slots. Current uses are only
    /// lowered if they would exceed the new maximum.
    pub fn set_max(&mut self, max: u8) {
        self.max = max;
        if self.current > max {
            self.current = max;
        }
    }
}

/// Spell slots keyed by spell level (1-9).
pub type SpellSlots = BTreeMap<u8, SpellSlot>;

/// Applies freshly computed maximums to an existing set of slots, keeping
/// whatever was already spent. Newly gained slot levels start full and slot
/// levels that are no longer granted are dropped.
pub fn rebase_slots(existing: &SpellSlots, maximums: SpellSlots) -> SpellSlots {
    maximums
        .into_iter()
        .map(|(level, fresh)| {
            let slot = match existing.get(&level) {
                Some(previous) => {
                    let mut slot = *previous;
                    slot.set_max(fresh.max);
                    slot.is_pact_magic = fresh.is_pact_magic;
                    slot
                }
                None => fresh,
            };
            (level, slot)
        })
        .collect()
}

/// Result of combining the spell slots of several casting classes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MulticlassSlots {
    /// Shared pool of the full, half and third casters
    pub shared: SpellSlots,
    /// Pact magic slots per class, never merged into the shared pool
    pub pact: BTreeMap<String, SpellSlots>,
}

impl MulticlassSlots {
    pub fn is_empty(&self) -> bool {
        self.shared.is_empty() && self.pact.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassSpellcasting {
    pub level: u8,
    #[serde(default)]
    pub spells_known: Vec<Spell>,
    #[serde(default)]
    pub spells_prepared: Vec<Spell>,
    #[serde(default)]
    pub spell_slots: SpellSlots,
    /// Number of cantrips the class may know at its level
    #[serde(default)]
    pub cantrips_known: u8,
    #[serde(default)]
    pub spellcasting_ability: Option<Ability>,
    #[serde(default)]
    pub ritual_casting: bool,
}

impl ClassSpellcasting {
    pub fn new(level: u8, spellcasting_ability: Option<Ability>, ritual_casting: bool) -> Self {
        Self {
            level,
            spells_known: Vec::new(),
            spells_prepared: Vec::new(),
            spell_slots: SpellSlots::new(),
            cantrips_known: 0,
            spellcasting_ability,
            ritual_casting,
        }
    }

    pub fn known_cantrips(&self) -> usize {
        self.spells_known.iter().filter(|spell| spell.is_cantrip()).count()
    }

    pub fn known_leveled_spells(&self) -> usize {
        self.spells_known
            .iter()
            .filter(|spell| !spell.is_cantrip())
            .count()
    }

    pub fn learn(&mut self, spell: Spell) {
        if !self.spells_known.contains(&spell) {
            self.spells_known.push(spell);
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MulticlassSpellcasting {
    pub is_casting_multiclass: bool,
    #[serde(default)]
    pub combined_slots: SpellSlots,
    #[serde(default)]
    pub pact_slots: BTreeMap<String, SpellSlots>,
}

/// Spells that do not come from a class, e.g. racial or item spells.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OtherSpellcasting {
    #[serde(default)]
    pub spells_known: Vec<Spell>,
    #[serde(default)]
    pub item_spells: Vec<Spell>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpellcastingState {
    #[serde(default)]
    pub classes: BTreeMap<String, ClassSpellcasting>,
    #[serde(default)]
    pub multiclass: MulticlassSpellcasting,
    #[serde(default)]
    pub other: OtherSpellcasting,
}

impl SpellcastingState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn class(&self, class_name: &str) -> Option<&ClassSpellcasting> {
        self.classes.get(class_name)
    }

    pub fn class_mut(&mut self, class_name: &str) -> Option<&mut ClassSpellcasting> {
        self.classes.get_mut(class_name)
    }
}
