use std::collections::BTreeSet;

use tracing::{debug, info, warn};

use crate::{
    components::{
        ability::AbilityScoreMap,
        class::ClassDefinition,
        hit_points::HitPoints,
        id::LevelUpId,
        level::{ClassEntry, Level, MAX_LEVEL, ProgressionRecord},
        level_up::LevelUpRecord,
        spells::spellcasting::{
            ClassSpellcasting, MulticlassSlots, SpellcastingState, rebase_slots,
        },
    },
    config::RulesConfig,
    engine::event::{ProgressionEvent, ProgressionEventKind, ProgressionListener},
    registry::classes::ClassDataProvider,
    systems::{health, spells::SpellSlotCalculator},
};

pub const ASI_FEATURE: &str = "Ability Score Improvement";

/// Levels at which a class grants an Ability Score Improvement, falling back
/// to the configured default when the feature table lists none.
pub fn class_asi_levels(class: &ClassDefinition, config: &RulesConfig) -> Vec<u8> {
    let levels = class.feature_levels(ASI_FEATURE);
    if levels.is_empty() {
        debug!("No ASI levels in class data for {}, using defaults", class.name);
        return config.default_asi_levels.clone();
    }
    levels
}

/// ASI levels of a class up to `class_level` that no level-up record has used.
pub fn unused_asi_levels(
    class_name: &str,
    asi_levels: &[u8],
    class_level: u8,
    level_ups: &[LevelUpRecord],
) -> Vec<u8> {
    asi_levels
        .iter()
        .copied()
        .filter(|level| *level <= class_level)
        .filter(|level| {
            !level_ups
                .iter()
                .any(|record| record.reached(class_name, *level) && record.uses_asi())
        })
        .collect()
}

/// Same as `ceil(level / 4) + 1`.
pub fn proficiency_bonus(progression: &ProgressionRecord) -> u8 {
    progression.proficiency_bonus()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MulticlassOption {
    pub class_name: String,
    pub requirements_met: bool,
}

/// Rules for a character's class levels. The manager holds no character
/// state; every operation works on the components passed to it.
pub struct ProgressionManager<'a> {
    classes: &'a dyn ClassDataProvider,
    config: RulesConfig,
    listeners: Vec<ProgressionListener>,
}

impl<'a> ProgressionManager<'a> {
    pub fn new(classes: &'a dyn ClassDataProvider) -> Self {
        Self::with_config(classes, RulesConfig::default())
    }

    pub fn with_config(classes: &'a dyn ClassDataProvider, config: RulesConfig) -> Self {
        Self {
            classes,
            config,
            listeners: Vec::new(),
        }
    }

    pub fn classes(&self) -> &'a dyn ClassDataProvider {
        self.classes
    }

    pub fn config(&self) -> &RulesConfig {
        &self.config
    }

    pub fn calculator(&self) -> SpellSlotCalculator<'a> {
        SpellSlotCalculator::new(self.classes)
    }

    pub fn add_listener(&mut self, listener: ProgressionListener) {
        self.listeners.push(listener);
    }

    fn notify(&self, kind: ProgressionEventKind) {
        let event = ProgressionEvent::new(kind);
        debug!("Progression event: {}", event.kind);
        for listener in &self.listeners {
            listener(&event);
        }
    }

    /// Sets `class_name` to `level`. An existing entry is overwritten rather
    /// than incremented; a new class is appended and, if it casts spells, gets
    /// its spellcasting initialized.
    pub fn add_class_level(
        &self,
        progression: &mut ProgressionRecord,
        spellcasting: &mut SpellcastingState,
        class_name: &str,
        level: u8,
        source: &str,
    ) {
        let level = level.clamp(1, self.config.max_level.min(MAX_LEVEL));

        if let Some(entry) = progression.class_mut(class_name) {
            let from = entry.levels;
            entry.levels = level;
            let name = entry.name.clone();
            if let Some(class_spellcasting) = spellcasting.class_mut(&name) {
                class_spellcasting.level = level;
            }
            info!("{} level set {} -> {}", name, from, level);
            if from != level {
                self.notify(ProgressionEventKind::ClassLevelChanged {
                    class_name: name,
                    from,
                    to: level,
                });
            }
            return;
        }

        let class = self.classes.class(class_name);
        if class.is_none() {
            warn!("Adding class {} without class data", class_name);
        }
        // Class data spells the canonical name
        let name = class.map_or_else(|| class_name.to_string(), |class| class.name.clone());
        let mut entry = ClassEntry::new(name.clone(), source, level);

        if let Some(class) = class.filter(|class| class.is_caster()) {
            let calculator = self.calculator();
            entry.spell_slots = calculator.slots_for_entry(&entry);

            let mut class_spellcasting =
                ClassSpellcasting::new(level, class.spellcasting_ability, class.ritual_casting);
            class_spellcasting.spell_slots = entry.spell_slots.clone();
            class_spellcasting.cantrips_known = calculator.cantrips_known_for(&entry);
            spellcasting.classes.insert(name.clone(), class_spellcasting);
        }

        progression.classes.push(entry);
        info!("Added class {} at level {}", name, level);
        self.notify(ProgressionEventKind::MulticlassAdded {
            class_name: name,
            level,
        });
    }

    /// Removes the class entirely. Returns false if the character does not
    /// have the class.
    pub fn remove_class_level(
        &self,
        progression: &mut ProgressionRecord,
        spellcasting: &mut SpellcastingState,
        class_name: &str,
    ) -> bool {
        let Some(index) = progression
            .classes
            .iter()
            .position(|entry| entry.name.eq_ignore_ascii_case(class_name))
        else {
            warn!("Cannot remove class {}: character does not have it", class_name);
            return false;
        };

        let entry = progression.classes.remove(index);
        spellcasting.classes.remove(&entry.name);
        info!("Removed class {}", entry.name);
        self.notify(ProgressionEventKind::MulticlassRemoved {
            class_name: entry.name,
        });
        true
    }

    pub fn total_level(&self, progression: &ProgressionRecord) -> u8 {
        progression.total_level()
    }

    pub fn class_asi_levels(&self, class_name: &str) -> Vec<u8> {
        match self.classes.class(class_name) {
            Some(class) => class_asi_levels(class, &self.config),
            None => self.config.default_asi_levels.clone(),
        }
    }

    /// Union of the ASI levels of every class the character has.
    pub fn asi_levels(&self, progression: &ProgressionRecord) -> BTreeSet<u8> {
        progression
            .classes
            .iter()
            .flat_map(|entry| self.class_asi_levels(&entry.name))
            .collect()
    }

    /// The class's current level grants an ASI that has not been used yet.
    pub fn has_asi_available(&self, progression: &ProgressionRecord, class_name: &str) -> bool {
        let Some(entry) = progression.class(class_name) else {
            return false;
        };
        let asi_levels = self.class_asi_levels(&entry.name);
        if !asi_levels.contains(&entry.levels) {
            return false;
        }
        unused_asi_levels(
            &entry.name,
            &asi_levels,
            entry.levels,
            &progression.level_ups,
        )
        .contains(&entry.levels)
    }

    /// Classes without prerequisite data can always be taken.
    pub fn check_multiclass_requirements(
        &self,
        abilities: &AbilityScoreMap,
        class_name: &str,
    ) -> bool {
        let Some(class) = self.classes.class(class_name) else {
            warn!("No multiclass requirements for unknown class {}", class_name);
            return false;
        };
        class
            .multiclass_requirements()
            .is_none_or(|requirements| requirements.is_met(abilities))
    }

    /// Every known class the character does not have yet.
    pub fn multiclass_options(
        &self,
        progression: &ProgressionRecord,
        abilities: &AbilityScoreMap,
    ) -> Vec<MulticlassOption> {
        self.classes
            .class_names()
            .into_iter()
            .filter(|name| progression.class(name).is_none())
            .map(|name| MulticlassOption {
                requirements_met: self.check_multiclass_requirements(abilities, &name),
                class_name: name,
            })
            .collect()
    }

    /// Recomputes the combined slot pool and stores it on the spellcasting
    /// state. Spent slots stay spent.
    pub fn calculate_multiclass_spell_slots(
        &self,
        progression: &ProgressionRecord,
        spellcasting: &mut SpellcastingState,
    ) -> MulticlassSlots {
        let combined = self.calculator().combined_slots_for(&progression.classes);
        let multiclass = &mut spellcasting.multiclass;

        multiclass.is_casting_multiclass = !combined.is_empty();
        multiclass.combined_slots = rebase_slots(&multiclass.combined_slots, combined.shared.clone());
        multiclass.pact_slots = combined
            .pact
            .iter()
            .map(|(class_name, slots)| {
                let existing = multiclass
                    .pact_slots
                    .get(class_name)
                    .cloned()
                    .unwrap_or_default();
                (class_name.clone(), rebase_slots(&existing, slots.clone()))
            })
            .collect();

        combined
    }

    pub fn record_level_up(
        &self,
        progression: &mut ProgressionRecord,
        record: LevelUpRecord,
    ) -> LevelUpId {
        let id = record.id;
        let (from_level, to_level) = (record.from_level, record.to_level);
        progression.level_ups.push(record);
        info!("Recorded level up {} -> {}", from_level, to_level);
        self.notify(ProgressionEventKind::LevelUpRecorded {
            record_id: id,
            from_level,
            to_level,
        });
        id
    }

    /// Recomputes slot maximums of every class with spellcasting. Current uses
    /// are kept and only clamped to the new maximum.
    pub fn update_spell_slots(
        &self,
        progression: &mut ProgressionRecord,
        spellcasting: &mut SpellcastingState,
    ) {
        let calculator = self.calculator();

        for entry in progression.classes.iter_mut() {
            let Some(class_spellcasting) = spellcasting.classes.get_mut(&entry.name) else {
                continue;
            };
            let maximums = calculator.slots_for_entry(entry);
            class_spellcasting.level = entry.levels;
            class_spellcasting.spell_slots =
                rebase_slots(&class_spellcasting.spell_slots, maximums.clone());
            class_spellcasting.cantrips_known = calculator.cantrips_known_for(entry);
            entry.spell_slots = rebase_slots(&entry.spell_slots, maximums);
            debug!(
                "Updated spell slots of {} at level {}",
                entry.name, entry.levels
            );
        }

        self.calculate_multiclass_spell_slots(progression, spellcasting);
    }

    /// Spellcasting state for a class that gained spellcasting after it was
    /// added, e.g. through its subclass.
    pub fn initialize_spellcasting(
        &self,
        progression: &ProgressionRecord,
        spellcasting: &mut SpellcastingState,
    ) {
        for entry in &progression.classes {
            if spellcasting.classes.contains_key(&entry.name) {
                continue;
            }
            let Some(class) = self.classes.class(&entry.name) else {
                continue;
            };
            let subclass = entry.subclass.as_deref();
            if class.caster_progression(subclass).is_none() {
                continue;
            }
            spellcasting.classes.insert(
                entry.name.clone(),
                ClassSpellcasting::new(
                    entry.levels,
                    class.spellcasting_ability(subclass),
                    class.ritual_casting,
                ),
            );
        }
    }

    pub fn update_hit_points(
        &self,
        progression: &ProgressionRecord,
        abilities: &AbilityScoreMap,
        hit_points: &mut HitPoints,
    ) {
        health::update_hit_points(
            self.classes,
            progression,
            abilities,
            hit_points,
            self.config.hit_point_mode,
        );
    }

    pub fn experience_for_next_level(&self, progression: &ProgressionRecord) -> u32 {
        progression.experience_for_next_level()
    }
}
