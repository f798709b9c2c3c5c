use std::{collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

#[derive(
    EnumIter,
    EnumString,
    Display,
    Hash,
    Eq,
    PartialEq,
    Ord,
    PartialOrd,
    Debug,
    Clone,
    Copy,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Ability {
    #[serde(alias = "str")]
    #[strum(to_string = "strength", serialize = "str")]
    Strength = 0,
    #[serde(alias = "dex")]
    #[strum(to_string = "dexterity", serialize = "dex")]
    Dexterity = 1,
    #[serde(alias = "con")]
    #[strum(to_string = "constitution", serialize = "con")]
    Constitution = 2,
    #[serde(alias = "int")]
    #[strum(to_string = "intelligence", serialize = "int")]
    Intelligence = 3,
    #[serde(alias = "wis")]
    #[strum(to_string = "wisdom", serialize = "wis")]
    Wisdom = 4,
    #[serde(alias = "cha")]
    #[strum(to_string = "charisma", serialize = "cha")]
    Charisma = 5,
}

impl Ability {
    pub fn acronym(&self) -> &'static str {
        match self {
            Ability::Strength => "STR",
            Ability::Dexterity => "DEX",
            Ability::Constitution => "CON",
            Ability::Intelligence => "INT",
            Ability::Wisdom => "WIS",
            Ability::Charisma => "CHA",
        }
    }
}

pub const DEFAULT_ABILITY_SCORE: i32 = 10;

/// The six ability scores of a character. Abilities that were never set read
/// as the default score of 10.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AbilityScoreMap {
    scores: BTreeMap<Ability, i32>,
}

impl AbilityScoreMap {
    pub fn new() -> Self {
        Self {
            scores: Ability::iter()
                .map(|ability| (ability, DEFAULT_ABILITY_SCORE))
                .collect(),
        }
    }

    pub fn get(&self, ability: Ability) -> i32 {
        self.scores
            .get(&ability)
            .copied()
            .unwrap_or(DEFAULT_ABILITY_SCORE)
    }

    pub fn set(&mut self, ability: Ability, score: i32) {
        self.scores.insert(ability, score);
    }

    pub fn modifier(&self, ability: Ability) -> i32 {
        (self.get(ability) - 10).div_euclid(2)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Ability, i32)> + '_ {
        Ability::iter().map(|ability| (ability, self.get(ability)))
    }
}

impl Default for AbilityScoreMap {
    fn default() -> Self {
        Self::new()
    }
}

impl From<[(Ability, i32); 6]> for AbilityScoreMap {
    fn from(scores: [(Ability, i32); 6]) -> Self {
        let mut map = AbilityScoreMap::new();
        for (ability, score) in scores {
            map.set(ability, score);
        }
        map
    }
}

impl fmt::Display for AbilityScoreMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .iter()
            .map(|(ability, score)| format!("{} {}", ability.acronym(), score))
            .collect();
        write!(f, "{}", parts.join(", "))
    }
}
