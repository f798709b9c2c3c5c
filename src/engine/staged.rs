use std::{collections::BTreeMap, sync::Arc};

use serde_json::Value;
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

use crate::{
    components::{
        ability::AbilityScoreMap, hit_points::HitPoints, id::FeatId, level::ProgressionRecord,
        spells::spellcasting::SpellcastingState,
    },
    engine::error::ProgressionError,
    entities::character::Character,
};

/// Top-level fields of the staged copy, named as they appear in paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumIter, EnumString)]
#[strum(serialize_all = "camelCase")]
pub enum StagedField {
    Progression,
    Spellcasting,
    Feats,
    Abilities,
    HitPoints,
    /// Subclass picks that are applied to their class entries on commit
    Subclasses,
}

/// The character fields a session may change, staged away from the live
/// character. Fields are shared with the copy they were cloned from until the
/// first write, so cloning for a rollback point costs nothing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StagedChanges {
    progression: Arc<ProgressionRecord>,
    spellcasting: Arc<SpellcastingState>,
    feats: Arc<Vec<FeatId>>,
    abilities: Arc<AbilityScoreMap>,
    hit_points: Arc<HitPoints>,
    subclasses: Arc<BTreeMap<String, String>>,
}

impl StagedChanges {
    pub fn from_character(character: &Character) -> Self {
        Self {
            progression: Arc::new(character.progression.clone()),
            spellcasting: Arc::new(character.spellcasting.clone()),
            feats: Arc::new(character.feats.clone()),
            abilities: Arc::new(character.ability_scores.clone()),
            hit_points: Arc::new(character.hit_points),
            subclasses: Arc::new(BTreeMap::new()),
        }
    }

    pub fn progression(&self) -> &ProgressionRecord {
        &self.progression
    }

    pub fn progression_mut(&mut self) -> &mut ProgressionRecord {
        Arc::make_mut(&mut self.progression)
    }

    pub fn spellcasting(&self) -> &SpellcastingState {
        &self.spellcasting
    }

    pub fn spellcasting_mut(&mut self) -> &mut SpellcastingState {
        Arc::make_mut(&mut self.spellcasting)
    }

    /// Both fields at once, for operations that keep them in step.
    pub fn progression_and_spellcasting_mut(
        &mut self,
    ) -> (&mut ProgressionRecord, &mut SpellcastingState) {
        (
            Arc::make_mut(&mut self.progression),
            Arc::make_mut(&mut self.spellcasting),
        )
    }

    pub fn feats(&self) -> &[FeatId] {
        &self.feats
    }

    pub fn feats_mut(&mut self) -> &mut Vec<FeatId> {
        Arc::make_mut(&mut self.feats)
    }

    pub fn abilities(&self) -> &AbilityScoreMap {
        &self.abilities
    }

    pub fn abilities_mut(&mut self) -> &mut AbilityScoreMap {
        Arc::make_mut(&mut self.abilities)
    }

    pub fn hit_points(&self) -> &HitPoints {
        &self.hit_points
    }

    pub fn hit_points_mut(&mut self) -> &mut HitPoints {
        Arc::make_mut(&mut self.hit_points)
    }

    pub fn subclasses(&self) -> &BTreeMap<String, String> {
        &self.subclasses
    }

    pub fn subclasses_mut(&mut self) -> &mut BTreeMap<String, String> {
        Arc::make_mut(&mut self.subclasses)
    }

    /// Whether `field` still shares its data with `other`, i.e. neither side
    /// has written to it since one was cloned from the other.
    pub fn shares(&self, other: &StagedChanges, field: StagedField) -> bool {
        match field {
            StagedField::Progression => Arc::ptr_eq(&self.progression, &other.progression),
            StagedField::Spellcasting => Arc::ptr_eq(&self.spellcasting, &other.spellcasting),
            StagedField::Feats => Arc::ptr_eq(&self.feats, &other.feats),
            StagedField::Abilities => Arc::ptr_eq(&self.abilities, &other.abilities),
            StagedField::HitPoints => Arc::ptr_eq(&self.hit_points, &other.hit_points),
            StagedField::Subclasses => Arc::ptr_eq(&self.subclasses, &other.subclasses),
        }
    }

    fn field_eq(&self, other: &StagedChanges, field: StagedField) -> bool {
        self.shares(other, field)
            || match field {
                StagedField::Progression => self.progression == other.progression,
                StagedField::Spellcasting => self.spellcasting == other.spellcasting,
                StagedField::Feats => self.feats == other.feats,
                StagedField::Abilities => self.abilities == other.abilities,
                StagedField::HitPoints => self.hit_points == other.hit_points,
                StagedField::Subclasses => self.subclasses == other.subclasses,
            }
    }

    /// Fields whose content differs from `initial`.
    pub fn changed_fields(&self, initial: &StagedChanges) -> Vec<StagedField> {
        StagedField::iter()
            .filter(|field| !self.field_eq(initial, *field))
            .collect()
    }

    pub(crate) fn field_value(&self, field: StagedField) -> Value {
        let value = match field {
            StagedField::Progression => serde_json::to_value(&*self.progression),
            StagedField::Spellcasting => serde_json::to_value(&*self.spellcasting),
            StagedField::Feats => serde_json::to_value(&*self.feats),
            StagedField::Abilities => serde_json::to_value(&*self.abilities),
            StagedField::HitPoints => serde_json::to_value(*self.hit_points),
            StagedField::Subclasses => serde_json::to_value(&*self.subclasses),
        };
        // Staged data only holds plain maps, lists and numbers
        value.unwrap_or(Value::Null)
    }

    /// Replaces `field` with the typed reading of `value`. Nothing changes if
    /// the value does not fit.
    pub(crate) fn replace_field(
        &mut self,
        path: &str,
        field: StagedField,
        value: Value,
    ) -> Result<(), ProgressionError> {
        let mismatch = |source| ProgressionError::TypeMismatch {
            path: path.to_string(),
            source,
        };
        match field {
            StagedField::Progression => {
                self.progression = Arc::new(serde_json::from_value(value).map_err(mismatch)?)
            }
            StagedField::Spellcasting => {
                self.spellcasting = Arc::new(serde_json::from_value(value).map_err(mismatch)?)
            }
            StagedField::Feats => {
                self.feats = Arc::new(serde_json::from_value(value).map_err(mismatch)?)
            }
            StagedField::Abilities => {
                self.abilities = Arc::new(serde_json::from_value(value).map_err(mismatch)?)
            }
            StagedField::HitPoints => {
                self.hit_points = Arc::new(serde_json::from_value(value).map_err(mismatch)?)
            }
            StagedField::Subclasses => {
                self.subclasses = Arc::new(serde_json::from_value(value).map_err(mismatch)?)
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;
    use crate::components::{ability::Ability, level::ClassEntry};

    fn staged() -> StagedChanges {
        let mut character = Character::new("Mialee", AbilityScoreMap::new());
        character
            .progression
            .classes
            .push(ClassEntry::new("Wizard", "PHB", 3));
        StagedChanges::from_character(&character)
    }

    #[test]
    fn writes_copy_only_the_touched_field() {
        let initial = staged();
        let mut staged = initial.clone();
        assert!(StagedField::iter().all(|field| staged.shares(&initial, field)));

        staged.abilities_mut().set(Ability::Intelligence, 18);

        assert!(!staged.shares(&initial, StagedField::Abilities));
        assert!(staged.shares(&initial, StagedField::Progression));
        assert_eq!(initial.abilities().get(Ability::Intelligence), 10);
        assert_eq!(staged.changed_fields(&initial), vec![StagedField::Abilities]);
    }

    #[test]
    fn writing_the_same_value_is_not_a_change() {
        let initial = staged();
        let mut staged = initial.clone();
        staged.progression_mut().classes[0].levels = 3;
        assert!(!staged.shares(&initial, StagedField::Progression));
        assert!(staged.changed_fields(&initial).is_empty());
    }

    #[test]
    fn field_names_match_paths() {
        assert_eq!(StagedField::HitPoints.to_string(), "hitPoints");
        assert_eq!(StagedField::from_str("progression"), Ok(StagedField::Progression));
        assert!(StagedField::from_str("name").is_err());
    }

    #[test]
    fn replace_field_rejects_ill_typed_values() {
        let mut staged = staged();
        let before = staged.clone();
        let result = staged.replace_field(
            "abilities",
            StagedField::Abilities,
            serde_json::json!({"strength": "very strong"}),
        );
        assert!(matches!(result, Err(ProgressionError::TypeMismatch { .. })));
        assert_eq!(staged, before);
    }
}
