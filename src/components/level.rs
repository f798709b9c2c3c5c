use serde::{Deserialize, Serialize};

use crate::components::{
    level_up::{ChoiceCategory, FeatureSelection, LevelUpRecord},
    spells::spellcasting::SpellSlots,
};

pub const MAX_LEVEL: u8 = 20;

pub trait Level {
    fn total_level(&self) -> u8;

    fn proficiency_bonus(&self) -> u8 {
        let total_level = self.total_level();
        if total_level == 0 {
            return 0;
        }
        // Same as ceil(level / 4) + 1
        (total_level - 1) / 4 + 2
    }
}

/// Proficiency bonus derived from the total level, stored on the character so
/// it only changes when a level-up is committed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProficiencyBonus(pub u8);

static EXPERIENCE_PER_LEVEL: [u32; 21] = [
    0,      // dummy for level 0
    0,      // level 1
    300,    // level 2
    900,    // level 3
    2700,   // level 4
    6500,   // level 5
    14000,  // level 6
    23000,  // level 7
    34000,  // level 8
    48000,  // level 9
    64000,  // level 10
    85000,  // level 11
    100000, // level 12
    120000, // level 13
    140000, // level 14
    165000, // level 15
    195000, // level 16
    225000, // level 17
    265000, // level 18
    305000, // level 19
    355000, // level 20
];

pub fn experience_for_level(level: u8) -> u32 {
    EXPERIENCE_PER_LEVEL
        .get(level.min(MAX_LEVEL) as usize)
        .copied()
        .unwrap_or_default()
}

pub fn level_for_experience(experience: u32) -> u8 {
    (1..=MAX_LEVEL)
        .rev()
        .find(|level| experience >= EXPERIENCE_PER_LEVEL[*level as usize])
        .unwrap_or(1)
}

/// One class the character has levels in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassEntry {
    pub name: String,
    #[serde(default)]
    pub source: String,
    pub levels: u8,
    #[serde(default)]
    pub subclass: Option<String>,
    #[serde(default)]
    pub features: Vec<FeatureSelection>,
    #[serde(default)]
    pub spell_slots: SpellSlots,
}

impl ClassEntry {
    pub fn new(name: impl Into<String>, source: impl Into<String>, levels: u8) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
            levels,
            subclass: None,
            features: Vec::new(),
            spell_slots: SpellSlots::new(),
        }
    }

    pub fn with_subclass(mut self, subclass: impl Into<String>) -> Self {
        self.subclass = Some(subclass.into());
        self
    }

    pub fn with_feature(mut self, selection: FeatureSelection) -> Self {
        self.features.push(selection);
        self
    }

    pub fn selections(&self, category: ChoiceCategory) -> usize {
        self.features
            .iter()
            .filter(|selection| selection.category == category)
            .count()
    }

    pub fn selections_for_feature(&self, feature: &str) -> usize {
        self.features
            .iter()
            .filter(|selection| selection.feature.eq_ignore_ascii_case(feature))
            .count()
    }
}

/// Class levels, experience and level-up history of a character. The
/// character level is always derived from the class levels.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressionRecord {
    #[serde(default)]
    pub classes: Vec<ClassEntry>,
    #[serde(default)]
    pub experience_points: u32,
    #[serde(default)]
    pub level_ups: Vec<LevelUpRecord>,
}

impl ProgressionRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn class(&self, class_name: &str) -> Option<&ClassEntry> {
        self.classes
            .iter()
            .find(|entry| entry.name.eq_ignore_ascii_case(class_name))
    }

    pub fn class_mut(&mut self, class_name: &str) -> Option<&mut ClassEntry> {
        self.classes
            .iter_mut()
            .find(|entry| entry.name.eq_ignore_ascii_case(class_name))
    }

    pub fn class_level(&self, class_name: &str) -> u8 {
        self.class(class_name).map_or(0, |entry| entry.levels)
    }

    /// Sum of all class levels; zero when the character has no classes.
    /// Saturates at `u8::MAX` so out-of-range edits can still be reported.
    pub fn class_level_sum(&self) -> u8 {
        self.classes
            .iter()
            .fold(0u8, |sum, entry| sum.saturating_add(entry.levels))
    }

    pub fn experience_for_next_level(&self) -> u32 {
        let next_level = self.total_level().saturating_add(1);
        if next_level > MAX_LEVEL {
            return 0;
        }
        experience_for_level(next_level)
    }
}

impl Level for ProgressionRecord {
    /// Level 0 is not a valid game state, so a character without classes is
    /// level 1.
    fn total_level(&self) -> u8 {
        self.class_level_sum().max(1)
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[test]
    fn total_level_is_sum_of_class_levels() {
        let mut progression = ProgressionRecord::new();
        assert_eq!(progression.total_level(), 1);
        assert_eq!(progression.class_level_sum(), 0);

        progression.classes.push(ClassEntry::new("Fighter", "PHB", 5));
        progression.classes.push(ClassEntry::new("Wizard", "PHB", 3));
        assert_eq!(progression.total_level(), 8);
        assert_eq!(progression.class_level("wizard"), 3);
        assert_eq!(progression.class_level("Cleric"), 0);
    }

    #[test]
    fn class_level_sum_saturates() {
        let mut progression = ProgressionRecord::new();
        for _ in 0..14 {
            progression.classes.push(ClassEntry::new("Fighter", "PHB", 20));
        }
        assert_eq!(progression.class_level_sum(), u8::MAX);
        assert_eq!(progression.total_level(), u8::MAX);

        progression.classes.truncate(1);
        progression.classes.push(ClassEntry::new("Wizard", "PHB", 255));
        assert_eq!(progression.total_level(), u8::MAX);
        assert_eq!(progression.experience_for_next_level(), 0);
    }

    #[rstest]
    #[case(1, 2)]
    #[case(4, 2)]
    #[case(5, 3)]
    #[case(8, 3)]
    #[case(9, 4)]
    #[case(13, 5)]
    #[case(17, 6)]
    #[case(20, 6)]
    fn proficiency_bonus(#[case] level: u8, #[case] expected: u8) {
        let mut progression = ProgressionRecord::new();
        progression.classes.push(ClassEntry::new("Rogue", "PHB", level));
        assert_eq!(progression.proficiency_bonus(), expected);
    }

    #[test]
    fn experience_thresholds() {
        assert_eq!(experience_for_level(2), 300);
        assert_eq!(experience_for_level(20), 355000);
        assert_eq!(level_for_experience(0), 1);
        assert_eq!(level_for_experience(899), 2);
        assert_eq!(level_for_experience(900), 3);
        assert_eq!(level_for_experience(1_000_000), 20);
    }

    #[test]
    fn experience_for_next_level_at_max() {
        let mut progression = ProgressionRecord::new();
        progression.classes.push(ClassEntry::new("Warlock", "PHB", 20));
        assert_eq!(progression.experience_for_next_level(), 0);

        progression.classes[0].levels = 1;
        assert_eq!(progression.experience_for_next_level(), 300);
    }
}
