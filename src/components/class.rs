use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum::Display;

use crate::{
    components::ability::{Ability, AbilityScoreMap},
    registry::serialize::class::ClassFeatureRefDefinition,
};

/// Spell slot growth category of a class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
pub enum CasterProgression {
    /// Full spellcasting progression, e.g. Wizard.
    #[serde(rename = "full")]
    Full,
    /// Half spellcasting progression, e.g. Paladin.
    #[serde(rename = "1/2")]
    Half,
    /// Third spellcasting progression, e.g. Eldritch Knight.
    #[serde(rename = "1/3")]
    Third,
    /// Pact magic, e.g. Warlock. Never merges with the other progressions.
    #[serde(rename = "pact")]
    Pact,
}

/// Reference to a class feature as listed in a class's feature table, e.g.
/// `"Ability Score Improvement|Fighter||4"`. The level is `None` when the
/// reference could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "ClassFeatureRefDefinition", into = "ClassFeatureRefDefinition")]
pub struct ClassFeatureRef {
    pub name: String,
    pub class_name: String,
    pub class_source: Option<String>,
    pub level: Option<u8>,
    /// The feature is the point where the class grants its subclass
    pub gain_subclass_feature: bool,
}

/// Full text of a class or subclass feature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassFeature {
    pub name: String,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub class_name: String,
    #[serde(default)]
    pub subclass_name: Option<String>,
    pub level: u8,
    #[serde(default)]
    pub entries: Vec<String>,
}

impl ClassFeature {
    pub fn text(&self) -> String {
        self.entries.join("\n")
    }
}

/// Table of how many options of a kind (e.g. Eldritch Invocations) a class
/// knows at each level. Index 0 is level 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionalFeatureProgression {
    pub name: String,
    #[serde(default)]
    pub feature_type: Vec<String>,
    pub progression: Vec<u8>,
}

impl OptionalFeatureProgression {
    pub fn count_at(&self, level: u8) -> u8 {
        if level == 0 || self.progression.is_empty() {
            return 0;
        }
        let index = (level as usize - 1).min(self.progression.len() - 1);
        self.progression[index]
    }
}

/// Ability score minimums for multiclassing into a class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MulticlassRequirements {
    /// Any one of the groups has to be met in full
    Any { or: Vec<BTreeMap<Ability, u8>> },
    /// Every minimum has to be met
    All(BTreeMap<Ability, u8>),
}

impl MulticlassRequirements {
    pub fn is_met(&self, scores: &AbilityScoreMap) -> bool {
        let group_met = |group: &BTreeMap<Ability, u8>| {
            group
                .iter()
                .all(|(ability, minimum)| scores.get(*ability) >= *minimum as i32)
        };

        match self {
            MulticlassRequirements::All(group) => group_met(group),
            MulticlassRequirements::Any { or } => or.iter().any(group_met),
        }
    }
}

impl Default for MulticlassRequirements {
    fn default() -> Self {
        MulticlassRequirements::All(BTreeMap::new())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Multiclassing {
    #[serde(default)]
    pub requirements: MulticlassRequirements,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubclassDefinition {
    pub name: String,
    #[serde(default)]
    pub short_name: Option<String>,
    #[serde(default)]
    pub source: String,
    /// Some subclasses grant spellcasting to a class that has none, e.g. the
    /// Eldritch Knight for the Fighter.
    #[serde(default)]
    pub caster_progression: Option<CasterProgression>,
    #[serde(default)]
    pub spellcasting_ability: Option<Ability>,
    #[serde(default)]
    pub cantrip_progression: Vec<u8>,
    #[serde(default)]
    pub spells_known_progression: Vec<u8>,
    #[serde(default)]
    pub features: Vec<ClassFeature>,
}

impl SubclassDefinition {
    pub fn matches(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
            || self
                .short_name
                .as_deref()
                .is_some_and(|short| short.eq_ignore_ascii_case(name))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassDefinition {
    pub name: String,
    #[serde(default)]
    pub source: String,
    pub hit_die: u8,
    #[serde(default)]
    pub caster_progression: Option<CasterProgression>,
    #[serde(default)]
    pub spellcasting_ability: Option<Ability>,
    #[serde(default)]
    pub ritual_casting: bool,
    #[serde(default)]
    pub cantrip_progression: Vec<u8>,
    #[serde(default)]
    pub spells_known_progression: Vec<u8>,
    /// Number of spells learned at each level, e.g. the Wizard's spellbook.
    /// The limit at a level is the sum of the entries up to that level.
    #[serde(default)]
    pub spells_known_progression_fixed: Vec<u8>,
    #[serde(default)]
    pub optionalfeature_progression: Vec<OptionalFeatureProgression>,
    #[serde(default)]
    pub class_features: Vec<ClassFeatureRef>,
    /// Feature text, keyed by the names in `class_features`
    #[serde(default)]
    pub features: Vec<ClassFeature>,
    #[serde(default)]
    pub multiclassing: Option<Multiclassing>,
    #[serde(default)]
    pub subclass_title: Option<String>,
    #[serde(default)]
    pub subclasses: Vec<SubclassDefinition>,
}

impl ClassDefinition {
    pub fn subclass(&self, name: &str) -> Option<&SubclassDefinition> {
        self.subclasses.iter().find(|subclass| subclass.matches(name))
    }

    /// Caster progression of the class, or of the subclass if the class
    /// itself has none.
    pub fn caster_progression(&self, subclass: Option<&str>) -> Option<CasterProgression> {
        if self.caster_progression.is_some() {
            return self.caster_progression;
        }
        subclass
            .and_then(|name| self.subclass(name))
            .and_then(|subclass| subclass.caster_progression)
    }

    pub fn spellcasting_ability(&self, subclass: Option<&str>) -> Option<Ability> {
        if self.spellcasting_ability.is_some() {
            return self.spellcasting_ability;
        }
        subclass
            .and_then(|name| self.subclass(name))
            .and_then(|subclass| subclass.spellcasting_ability)
    }

    pub fn is_caster(&self) -> bool {
        self.caster_progression.is_some() || self.spellcasting_ability.is_some()
    }

    /// Levels at which the feature table lists a feature with the given name.
    /// References without a parseable level are skipped.
    pub fn feature_levels(&self, feature_name: &str) -> Vec<u8> {
        let mut levels: Vec<u8> = self
            .class_features
            .iter()
            .filter(|feature| feature.name.eq_ignore_ascii_case(feature_name))
            .filter_map(|feature| feature.level)
            .collect();
        levels.sort_unstable();
        levels.dedup();
        levels
    }

    pub fn multiclass_requirements(&self) -> Option<&MulticlassRequirements> {
        self.multiclassing
            .as_ref()
            .map(|multiclassing| &multiclassing.requirements)
    }

    pub fn optional_feature_progression(&self, name: &str) -> Option<&OptionalFeatureProgression> {
        self.optionalfeature_progression
            .iter()
            .find(|progression| progression.name.eq_ignore_ascii_case(name))
    }
}
