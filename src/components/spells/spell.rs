use serde::{Deserialize, Serialize};

/// A spell as tracked on a character sheet. Level 0 is a cantrip.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Spell {
    pub name: String,
    pub level: u8,
    #[serde(default)]
    pub source: String,
}

impl Spell {
    pub fn new(name: impl Into<String>, level: u8) -> Self {
        Self {
            name: name.into(),
            level,
            source: String::new(),
        }
    }

    pub fn cantrip(name: impl Into<String>) -> Self {
        Self::new(name, 0)
    }

    pub fn is_cantrip(&self) -> bool {
        self.level == 0
    }
}
