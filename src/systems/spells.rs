use std::{collections::HashMap, sync::LazyLock};

use tracing::debug;

use crate::{
    components::{
        class::{CasterProgression, ClassDefinition},
        level::{ClassEntry, MAX_LEVEL},
        spells::spellcasting::{MulticlassSlots, SpellSlot, SpellSlots},
    },
    registry::classes::ClassDataProvider,
};

pub static MAX_SPELL_LEVEL: u8 = 9;

/// Slots per spell level, indexed by effective caster level.
static SPELL_SLOTS_PER_LEVEL: LazyLock<HashMap<u8, Vec<u8>>> = LazyLock::new(|| {
    HashMap::from([
        (0, vec![]),
        (1, vec![2]),
        (2, vec![3]),
        (3, vec![4, 2]),
        (4, vec![4, 3]),
        (5, vec![4, 3, 2]),
        (6, vec![4, 3, 3]),
        (7, vec![4, 3, 3, 1]),
        (8, vec![4, 3, 3, 2]),
        (9, vec![4, 3, 3, 3, 1]),
        (10, vec![4, 3, 3, 3, 2]),
        (11, vec![4, 3, 3, 3, 2, 1]),
        (12, vec![4, 3, 3, 3, 2, 1]),
        (13, vec![4, 3, 3, 3, 2, 1, 1]),
        (14, vec![4, 3, 3, 3, 2, 1, 1]),
        (15, vec![4, 3, 3, 3, 2, 1, 1, 1]),
        (16, vec![4, 3, 3, 3, 2, 1, 1, 1]),
        (17, vec![4, 3, 3, 3, 2, 1, 1, 1, 1]),
        (18, vec![4, 3, 3, 3, 3, 1, 1, 1, 1]),
        (19, vec![4, 3, 3, 3, 3, 2, 1, 1, 1]),
        (20, vec![4, 3, 3, 3, 3, 2, 2, 1, 1]),
    ])
});

/// (slot count, slot level) per pact magic class level. Index 0 is unused.
static PACT_SLOTS_PER_LEVEL: [(u8, u8); 21] = [
    (0, 0),
    (1, 1),
    (2, 1),
    (2, 2),
    (2, 2),
    (2, 3),
    (2, 3),
    (2, 4),
    (2, 4),
    (2, 5),
    (2, 5),
    (3, 5),
    (3, 5),
    (3, 5),
    (3, 5),
    (3, 5),
    (3, 5),
    (4, 5),
    (4, 5),
    (4, 5),
    (4, 5),
];

/// Caster level a class contributes to the shared slot pool. Pact magic and
/// non-casters contribute nothing.
pub fn effective_caster_level(progression: Option<CasterProgression>, level: u8) -> u8 {
    let level = level.min(MAX_LEVEL);
    match progression {
        Some(CasterProgression::Full) => level,
        Some(CasterProgression::Half) => level / 2,
        Some(CasterProgression::Third) => level / 3,
        Some(CasterProgression::Pact) | None => 0,
    }
}

pub fn standard_slots(caster_level: u8) -> SpellSlots {
    SPELL_SLOTS_PER_LEVEL
        .get(&caster_level.min(MAX_LEVEL))
        .map(|slots| {
            slots
                .iter()
                .enumerate()
                .map(|(index, &count)| (index as u8 + 1, SpellSlot::new(count)))
                .collect()
        })
        .unwrap_or_default()
}

pub fn pact_slots(level: u8) -> SpellSlots {
    let (count, slot_level) = PACT_SLOTS_PER_LEVEL[level.min(MAX_LEVEL) as usize];
    if count == 0 {
        return SpellSlots::new();
    }
    SpellSlots::from([(slot_level, SpellSlot::pact(count))])
}

pub fn slots_for_progression(progression: Option<CasterProgression>, level: u8) -> SpellSlots {
    match progression {
        Some(CasterProgression::Pact) => pact_slots(level),
        Some(progression) => standard_slots(effective_caster_level(Some(progression), level)),
        None => SpellSlots::new(),
    }
}

/// Value at `level` of a table indexed from level 1, clamped to the table.
fn table_value(table: &[u8], level: u8) -> u8 {
    if level == 0 || table.is_empty() {
        return 0;
    }
    let index = (level as usize - 1).min(table.len() - 1);
    table[index]
}

/// Derives spell slots and spell limits from class data. Missing data never
/// fails a calculation, it yields no slots and a limit of zero.
pub struct SpellSlotCalculator<'a> {
    classes: &'a dyn ClassDataProvider,
}

impl<'a> SpellSlotCalculator<'a> {
    pub fn new(classes: &'a dyn ClassDataProvider) -> Self {
        Self { classes }
    }

    pub fn caster_progression(
        &self,
        class_name: &str,
        subclass: Option<&str>,
    ) -> Option<CasterProgression> {
        self.classes
            .class(class_name)
            .and_then(|class| class.caster_progression(subclass))
    }

    pub fn slots_for(&self, class_name: &str, level: u8) -> SpellSlots {
        slots_for_progression(self.caster_progression(class_name, None), level)
    }

    /// Like `slots_for`, but also considers a subclass that grants
    /// spellcasting.
    pub fn slots_for_entry(&self, entry: &ClassEntry) -> SpellSlots {
        slots_for_progression(
            self.caster_progression(&entry.name, entry.subclass.as_deref()),
            entry.levels,
        )
    }

    /// Combines the slots of several casting classes. Full, half and third
    /// casters share one pool looked up from their summed caster levels, pact
    /// magic stays separate per class. Empty unless at least two classes cast.
    pub fn combined_slots_for(&self, entries: &[ClassEntry]) -> MulticlassSlots {
        let casters: Vec<(&ClassEntry, CasterProgression)> = entries
            .iter()
            .filter_map(|entry| {
                self.caster_progression(&entry.name, entry.subclass.as_deref())
                    .map(|progression| (entry, progression))
            })
            .collect();

        if casters.len() < 2 {
            return MulticlassSlots::default();
        }

        let mut combined = MulticlassSlots::default();
        let mut total_caster_level: u8 = 0;
        for (entry, progression) in casters {
            if progression == CasterProgression::Pact {
                combined
                    .pact
                    .insert(entry.name.clone(), pact_slots(entry.levels));
            } else {
                total_caster_level = total_caster_level
                    .saturating_add(effective_caster_level(Some(progression), entry.levels));
            }
        }
        combined.shared = standard_slots(total_caster_level);

        debug!(
            "Combined caster level {} with {} pact magic classes",
            total_caster_level,
            combined.pact.len()
        );
        combined
    }

    pub fn cantrips_known(&self, class_name: &str, level: u8) -> u8 {
        self.classes
            .class(class_name)
            .map(|class| table_value(&class.cantrip_progression, level))
            .unwrap_or_default()
    }

    pub fn cantrips_known_for(&self, entry: &ClassEntry) -> u8 {
        let Some(class) = self.classes.class(&entry.name) else {
            return 0;
        };
        if !class.cantrip_progression.is_empty() {
            return table_value(&class.cantrip_progression, entry.levels);
        }
        entry
            .subclass
            .as_deref()
            .and_then(|name| class.subclass(name))
            .map(|subclass| table_value(&subclass.cantrip_progression, entry.levels))
            .unwrap_or_default()
    }

    pub fn spells_known_limit(&self, class_name: &str, level: u8) -> usize {
        self.classes
            .class(class_name)
            .map(|class| class_spells_known(class, level))
            .unwrap_or_default()
    }

    pub fn spells_known_limit_for(&self, entry: &ClassEntry) -> usize {
        let Some(class) = self.classes.class(&entry.name) else {
            return 0;
        };
        let limit = class_spells_known(class, entry.levels);
        if limit > 0 {
            return limit;
        }
        entry
            .subclass
            .as_deref()
            .and_then(|name| class.subclass(name))
            .map(|subclass| table_value(&subclass.spells_known_progression, entry.levels) as usize)
            .unwrap_or_default()
    }
}

/// Fixed-learn tables list how many spells are learned at each level, so the
/// limit is their running sum.
fn class_spells_known(class: &ClassDefinition, level: u8) -> usize {
    if !class.spells_known_progression_fixed.is_empty() {
        return class
            .spells_known_progression_fixed
            .iter()
            .take(level as usize)
            .map(|&count| count as usize)
            .sum();
    }
    table_value(&class.spells_known_progression, level) as usize
}
