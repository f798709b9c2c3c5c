use std::{
    collections::BTreeMap,
    time::{SystemTime, UNIX_EPOCH},
};

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, IntoEnumIterator};
use uuid::Uuid;

use crate::components::{
    ability::Ability,
    id::{FeatId, LevelUpId},
    spells::spell::Spell,
};

/// Kinds of class feature choices a player can owe the rules.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumIter, Serialize, Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub enum ChoiceCategory {
    #[strum(to_string = "Eldritch Invocations")]
    Invocation,
    #[strum(to_string = "Metamagic")]
    Metamagic,
    #[strum(to_string = "Fighting Style")]
    FightingStyle,
    #[strum(to_string = "Pact Boon")]
    PactBoon,
    /// Any other feature that asks the player to choose something
    #[strum(to_string = "Feature")]
    Feature,
}

impl ChoiceCategory {
    /// Category of a feature based on its name, for the categories that are
    /// recognised by name alone.
    pub fn from_feature_name(name: &str) -> Option<ChoiceCategory> {
        let name = name.to_lowercase();
        ChoiceCategory::iter()
            .filter(|category| *category != ChoiceCategory::Feature)
            .find(|category| {
                let keyword = match category {
                    ChoiceCategory::Invocation => "invocation",
                    ChoiceCategory::Metamagic => "metamagic",
                    ChoiceCategory::FightingStyle => "fighting style",
                    ChoiceCategory::PactBoon => "pact boon",
                    ChoiceCategory::Feature => unreachable!(),
                };
                name.contains(keyword)
            })
    }
}

/// A choice the player made for a class feature, e.g. the Agonizing Blast
/// invocation or the Archery fighting style.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureSelection {
    pub category: ChoiceCategory,
    /// Name of the feature that granted the choice
    pub feature: String,
    pub choice: String,
    /// Class level at which the choice was made
    pub level: u8,
}

impl FeatureSelection {
    pub fn new(
        category: ChoiceCategory,
        feature: impl Into<String>,
        choice: impl Into<String>,
        level: u8,
    ) -> Self {
        Self {
            category,
            feature: feature.into(),
            choice: choice.into(),
            level,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbilityChange {
    pub from: i32,
    pub to: i32,
}

/// Audit entry appended every time a level-up is committed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelUpRecord {
    #[serde(default = "Uuid::new_v4")]
    pub id: LevelUpId,
    pub from_level: u8,
    pub to_level: u8,
    /// Class that was leveled, when the level-up concerned a single class
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_level: Option<u8>,
    #[serde(default)]
    pub applied_feats: Vec<FeatId>,
    #[serde(default)]
    pub applied_features: Vec<String>,
    #[serde(default)]
    pub changed_abilities: BTreeMap<Ability, AbilityChange>,
    #[serde(default)]
    pub timestamp: u64,
}

impl LevelUpRecord {
    pub fn new(from_level: u8, to_level: u8) -> Self {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|duration| duration.as_secs())
            .unwrap_or_default();
        Self {
            id: Uuid::new_v4(),
            from_level,
            to_level,
            class_name: None,
            class_level: None,
            applied_feats: Vec::new(),
            applied_features: Vec::new(),
            changed_abilities: BTreeMap::new(),
            timestamp,
        }
    }

    pub fn for_class(mut self, class_name: impl Into<String>, class_level: u8) -> Self {
        self.class_name = Some(class_name.into());
        self.class_level = Some(class_level);
        self
    }

    pub fn with_ability_change(mut self, ability: Ability, from: i32, to: i32) -> Self {
        self.changed_abilities
            .insert(ability, AbilityChange { from, to });
        self
    }

    pub fn with_feat(mut self, feat: FeatId) -> Self {
        self.applied_feats.push(feat);
        self
    }

    /// An Ability Score Improvement was taken at this level-up, either as
    /// raised scores or as a feat.
    pub fn uses_asi(&self) -> bool {
        !self.changed_abilities.is_empty() || !self.applied_feats.is_empty()
    }

    /// Whether this record is the level-up that reached the given ASI level of
    /// a class. Records that name their class are matched on class level,
    /// older records on the character level they reached.
    pub fn reached(&self, class_name: &str, level: u8) -> bool {
        match (&self.class_name, self.class_level) {
            (Some(name), Some(class_level)) => {
                name.eq_ignore_ascii_case(class_name) && class_level == level
            }
            _ => self.to_level == level,
        }
    }
}

/// What the player picked for one class level during a wizard session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelChoices {
    #[serde(default)]
    pub subclass: Option<String>,
    #[serde(default)]
    pub features: Vec<FeatureSelection>,
    #[serde(default)]
    pub spells: Vec<Spell>,
    #[serde(default)]
    pub ability_changes: BTreeMap<Ability, AbilityChange>,
    #[serde(default)]
    pub feats: Vec<FeatId>,
}

impl LevelChoices {
    pub fn is_empty(&self) -> bool {
        self.subclass.is_none()
            && self.features.is_empty()
            && self.spells.is_empty()
            && self.ability_changes.is_empty()
            && self.feats.is_empty()
    }
}
