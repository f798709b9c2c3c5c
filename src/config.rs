use std::{fs, path::Path};

use serde::{Deserialize, Serialize};
use strum::Display;
use thiserror::Error;

use crate::components::level::MAX_LEVEL;

/// How hit points are gained on levels after the first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum HitPointMode {
    /// Fixed value of half the hit die plus one
    #[default]
    Average,
    /// Full hit die every level
    Maximum,
}

impl HitPointMode {
    pub fn per_level(&self, hit_die: u8) -> u32 {
        match self {
            HitPointMode::Average => hit_die as u32 / 2 + 1,
            HitPointMode::Maximum => hit_die as u32,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Rules that apply when the class data does not say otherwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RulesConfig {
    pub max_level: u8,
    /// Used for classes whose feature table lists no Ability Score
    /// Improvement
    pub default_asi_levels: Vec<u8>,
    /// Used for classes whose feature table does not mark a subclass feature
    pub default_subclass_level: u8,
    pub hit_point_mode: HitPointMode,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            max_level: MAX_LEVEL,
            default_asi_levels: vec![4, 8, 12, 16, 19],
            default_subclass_level: 3,
            hit_point_mode: HitPointMode::Average,
        }
    }
}

impl RulesConfig {
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }
}
