use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

use enum_iterator::{Sequence, all, next, previous};
use hecs::{Entity, World};
use serde_json::Value;
use strum::{Display, IntoEnumIterator};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    components::{
        ability::Ability,
        id::{FeatId, SessionId},
        level::{Level, ProficiencyBonus, ProgressionRecord},
        level_up::{AbilityChange, FeatureSelection, LevelChoices, LevelUpRecord},
        spells::spell::Spell,
        validation::{
            Finding, FindingCategory, FindingDetail, MissingChoicesSummary, ValidationReport,
        },
    },
    engine::{error::ProgressionError, staged::{StagedChanges, StagedField}},
    entities::character::Character,
    systems::{
        progression::{ProgressionManager, proficiency_bonus},
        validation::CompletenessValidator,
    },
};

/// Steps of the level-up wizard, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, Sequence)]
pub enum WizardStep {
    RulesReview,
    ClassFeatures,
    AbilityScoreImprovement,
    Spells,
    Summary,
}

impl WizardStep {
    pub fn index(&self) -> usize {
        all::<WizardStep>()
            .position(|step| step == *self)
            .unwrap_or_default()
    }

    pub fn from_index(index: usize) -> Option<WizardStep> {
        all::<WizardStep>().nth(index)
    }
}

/// Decides whether the wizard may leave a step.
pub type StepValidator = Arc<dyn Fn(&StagedChanges) -> bool + Send + Sync + 'static>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassLevelChange {
    pub class_name: String,
    /// Zero for a class that was added
    pub from: u8,
    /// Zero for a class that was removed
    pub to: u8,
}

/// What committing the session would change.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeSummary {
    pub from_level: u8,
    pub to_level: u8,
    pub class_changes: Vec<ClassLevelChange>,
    pub new_subclasses: BTreeMap<String, String>,
    pub ability_changes: BTreeMap<Ability, AbilityChange>,
    pub new_feats: Vec<FeatId>,
    pub hit_points_before: u32,
    pub hit_points_after: u32,
}

impl ChangeSummary {
    pub fn is_empty(&self) -> bool {
        self.class_changes.is_empty()
            && self.new_subclasses.is_empty()
            && self.ability_changes.is_empty()
            && self.new_feats.is_empty()
            && self.hit_points_before == self.hit_points_after
    }
}

fn class_changes(before: &ProgressionRecord, after: &ProgressionRecord) -> Vec<ClassLevelChange> {
    let mut changes: Vec<ClassLevelChange> = after
        .classes
        .iter()
        .filter(|entry| before.class_level(&entry.name) != entry.levels)
        .map(|entry| ClassLevelChange {
            class_name: entry.name.clone(),
            from: before.class_level(&entry.name),
            to: entry.levels,
        })
        .collect();

    changes.extend(
        before
            .classes
            .iter()
            .filter(|entry| after.class(&entry.name).is_none())
            .map(|entry| ClassLevelChange {
                class_name: entry.name.clone(),
                from: entry.levels,
                to: 0,
            }),
    );
    changes
}

fn ability_changes(before: &StagedChanges, after: &StagedChanges) -> BTreeMap<Ability, AbilityChange> {
    Ability::iter()
        .filter_map(|ability| {
            let from = before.abilities().get(ability);
            let to = after.abilities().get(ability);
            (from != to).then_some((ability, AbilityChange { from, to }))
        })
        .collect()
}

/// Invariants every committed character has to satisfy.
fn check_committed(character: &Character, max_level: u8) -> Result<(), ProgressionError> {
    let progression = &character.progression;
    if progression.classes.is_empty() {
        return Err(ProgressionError::InvalidCommittedState(
            "character has no classes".to_string(),
        ));
    }
    if let Some(entry) = progression.classes.iter().find(|entry| entry.levels == 0) {
        return Err(ProgressionError::InvalidCommittedState(format!(
            "class {} has no levels",
            entry.name
        )));
    }
    let level = progression
        .classes
        .iter()
        .map(|entry| entry.levels as u32)
        .sum::<u32>();
    if !(1..=max_level as u32).contains(&level) {
        return Err(ProgressionError::InvalidCommittedState(format!(
            "total level {} is outside 1-{}",
            level, max_level
        )));
    }
    Ok(())
}

/// A level-up in progress. All edits go to a staged copy of the character;
/// the live character in the world is only written by `apply_changes`.
pub struct ProgressionSession<'a> {
    id: SessionId,
    entity: Entity,
    manager: &'a ProgressionManager<'a>,
    validator: &'a CompletenessValidator<'a>,
    staged: StagedChanges,
    initial_state: StagedChanges,
    current_step: WizardStep,
    step_validators: HashMap<WizardStep, StepValidator>,
    step_data: HashMap<WizardStep, Value>,
    choices: BTreeMap<String, BTreeMap<u8, LevelChoices>>,
    validation_report: ValidationReport,
}

impl<'a> ProgressionSession<'a> {
    pub fn new(
        world: &World,
        entity: Entity,
        manager: &'a ProgressionManager<'a>,
        validator: &'a CompletenessValidator<'a>,
    ) -> Result<Self, ProgressionError> {
        let character = Character::try_from_world(world, entity)
            .ok_or(ProgressionError::MissingCharacter(entity))?;

        let validation_report = validator.validate(character.snapshot());
        let initial_state = StagedChanges::from_character(&character);
        let id = Uuid::new_v4();

        info!(
            "Opened progression session {} for {} at level {}",
            id,
            character.name,
            character.total_level()
        );
        if !validation_report.is_valid() {
            debug!(
                "{} has {} missing choices before the session",
                character.name,
                validation_report.missing().len()
            );
        }

        Ok(Self {
            id,
            entity,
            manager,
            validator,
            staged: initial_state.clone(),
            initial_state,
            current_step: WizardStep::RulesReview,
            step_validators: HashMap::new(),
            step_data: HashMap::new(),
            choices: BTreeMap::new(),
            validation_report,
        })
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn entity(&self) -> Entity {
        self.entity
    }

    pub fn staged(&self) -> &StagedChanges {
        &self.staged
    }

    pub fn staged_mut(&mut self) -> &mut StagedChanges {
        &mut self.staged
    }

    pub fn get(&self, path: &str) -> Result<Option<Value>, ProgressionError> {
        self.staged.get(path)
    }

    pub fn set(&mut self, path: &str, value: Value) -> Result<(), ProgressionError> {
        self.staged.set(path, value)
    }

    // Staged edits

    pub fn add_class_level(&mut self, class_name: &str, level: u8) {
        let source = self
            .manager
            .classes()
            .class(class_name)
            .map(|class| class.source.clone())
            .unwrap_or_default();
        let (progression, spellcasting) = self.staged.progression_and_spellcasting_mut();
        self.manager
            .add_class_level(progression, spellcasting, class_name, level, &source);
    }

    pub fn remove_class_level(&mut self, class_name: &str) -> bool {
        let (progression, spellcasting) = self.staged.progression_and_spellcasting_mut();
        let removed = self
            .manager
            .remove_class_level(progression, spellcasting, class_name);
        if removed && self.staged.subclasses().contains_key(class_name) {
            self.staged.subclasses_mut().remove(class_name);
        }
        removed
    }

    pub fn select_subclass(&mut self, class_name: &str, subclass: &str) {
        self.staged
            .subclasses_mut()
            .insert(class_name.to_string(), subclass.to_string());
    }

    /// Returns false if the character has no such class.
    pub fn select_feature(&mut self, class_name: &str, selection: FeatureSelection) -> bool {
        match self.staged.progression_mut().class_mut(class_name) {
            Some(entry) => {
                entry.features.push(selection);
                true
            }
            None => {
                warn!("Cannot record a feature choice for missing class {}", class_name);
                false
            }
        }
    }

    /// Returns false if the class has no spellcasting.
    pub fn learn_spell(&mut self, class_name: &str, spell: Spell) -> bool {
        match self.staged.spellcasting_mut().class_mut(class_name) {
            Some(spellcasting) => {
                spellcasting.learn(spell);
                true
            }
            None => {
                warn!("{} has no spellcasting to learn {} with", class_name, spell.name);
                false
            }
        }
    }

    pub fn set_ability_score(&mut self, ability: Ability, score: i32) {
        self.staged.abilities_mut().set(ability, score);
    }

    pub fn add_feat(&mut self, feat: FeatId) {
        if !self.staged.feats().contains(&feat) {
            self.staged.feats_mut().push(feat);
        }
    }

    // Steps

    pub fn current_step(&self) -> WizardStep {
        self.current_step
    }

    pub fn step_index(&self) -> usize {
        self.current_step.index()
    }

    pub fn set_step_validator(&mut self, step: WizardStep, validator: StepValidator) {
        self.step_validators.insert(step, validator);
    }

    fn step_is_valid(&self, step: WizardStep) -> bool {
        self.step_validators
            .get(&step)
            .is_none_or(|validator| validator(&self.staged))
    }

    /// The first step is always reachable; any other step only once the
    /// current step is valid.
    pub fn can_go_to_step(&self, step: WizardStep) -> bool {
        step == WizardStep::RulesReview || self.step_is_valid(self.current_step)
    }

    pub fn jump_to_step(&mut self, step: WizardStep) -> bool {
        if !self.can_go_to_step(step) {
            debug!("Step {} is not reachable from {}", step, self.current_step);
            return false;
        }
        self.current_step = step;
        true
    }

    pub fn next_step(&mut self) -> bool {
        match next(&self.current_step) {
            Some(step) => self.jump_to_step(step),
            None => false,
        }
    }

    pub fn previous_step(&mut self) -> bool {
        match previous(&self.current_step) {
            Some(step) => self.jump_to_step(step),
            None => false,
        }
    }

    pub fn set_step_data(&mut self, step: WizardStep, data: Value) {
        self.step_data.insert(step, data);
    }

    pub fn step_data(&self, step: WizardStep) -> Option<&Value> {
        self.step_data.get(&step)
    }

    // Choice ledger

    pub fn record_choices(&mut self, class_name: &str, level: u8, choices: LevelChoices) {
        self.choices
            .entry(class_name.to_string())
            .or_default()
            .insert(level, choices);
    }

    pub fn choices(&self, class_name: &str, level: u8) -> Option<&LevelChoices> {
        self.choices.get(class_name)?.get(&level)
    }

    pub fn class_choices(&self, class_name: &str) -> Option<&BTreeMap<u8, LevelChoices>> {
        self.choices.get(class_name)
    }

    pub fn all_choices(&self) -> &BTreeMap<String, BTreeMap<u8, LevelChoices>> {
        &self.choices
    }

    /// Clears one level of a class, or every level when `level` is `None`.
    pub fn clear_choices(&mut self, class_name: &str, level: Option<u8>) {
        match level {
            Some(level) => {
                if let Some(class_choices) = self.choices.get_mut(class_name) {
                    class_choices.remove(&level);
                    if class_choices.is_empty() {
                        self.choices.remove(class_name);
                    }
                }
            }
            None => {
                self.choices.remove(class_name);
            }
        }
    }

    // Summary and commit

    pub fn change_summary(&self) -> ChangeSummary {
        let before = self.initial_state.progression();
        let after = self.staged.progression();

        let mut projected = *self.staged.hit_points();
        self.manager
            .update_hit_points(after, self.staged.abilities(), &mut projected);

        ChangeSummary {
            from_level: before.total_level(),
            to_level: after.total_level(),
            class_changes: class_changes(before, after),
            new_subclasses: self
                .staged
                .subclasses()
                .iter()
                .filter(|(class_name, subclass)| {
                    before
                        .class(class_name)
                        .and_then(|entry| entry.subclass.as_deref())
                        != Some(subclass.as_str())
                })
                .map(|(class_name, subclass)| (class_name.clone(), subclass.clone()))
                .collect(),
            ability_changes: ability_changes(&self.initial_state, &self.staged),
            new_feats: self
                .staged
                .feats()
                .iter()
                .filter(|feat| !self.initial_state.feats().contains(feat))
                .cloned()
                .collect(),
            hit_points_before: self.initial_state.hit_points().max(),
            hit_points_after: projected.max(),
        }
    }

    fn level_up_record(&self, committed: &Character) -> LevelUpRecord {
        let before = self.initial_state.progression();
        let mut record = LevelUpRecord::new(
            before.total_level(),
            committed.progression.total_level(),
        );

        match class_changes(before, &committed.progression).as_slice() {
            [change] if change.to > 0 => {
                record = record.for_class(change.class_name.clone(), change.to);
            }
            _ => {}
        }

        for (ability, change) in ability_changes(&self.initial_state, &self.staged) {
            record = record.with_ability_change(ability, change.from, change.to);
        }

        let ledger = self.choices.values().flat_map(|levels| levels.values());
        for feat in committed
            .feats
            .iter()
            .filter(|feat| !self.initial_state.feats().contains(feat))
            .chain(ledger.clone().flat_map(|choices| choices.feats.iter()))
        {
            if !record.applied_feats.contains(feat) {
                record = record.with_feat(feat.clone());
            }
        }

        record.applied_features = ledger
            .flat_map(|choices| choices.features.iter())
            .map(|selection| format!("{}: {}", selection.feature, selection.choice))
            .collect();
        record
    }

    /// Builds the character as it would be after committing and checks it,
    /// without touching the world.
    fn build_committed(&self, live: Character) -> Result<Character, ProgressionError> {
        let mut committed = live;

        // Fields the session never wrote keep whatever the live character has
        for field in self.staged.changed_fields(&self.initial_state) {
            match field {
                StagedField::Progression => {
                    committed.progression = self.staged.progression().clone()
                }
                StagedField::Spellcasting => {
                    committed.spellcasting = self.staged.spellcasting().clone()
                }
                StagedField::Feats => committed.feats = self.staged.feats().to_vec(),
                StagedField::Abilities => {
                    committed.ability_scores = self.staged.abilities().clone()
                }
                StagedField::HitPoints => committed.hit_points = *self.staged.hit_points(),
                StagedField::Subclasses => {}
            }
        }

        for (class_name, subclass) in self.staged.subclasses() {
            match committed.progression.class_mut(class_name) {
                Some(entry) => entry.subclass = Some(subclass.clone()),
                None => warn!(
                    "Dropping subclass {} for {}, which the character does not have",
                    subclass, class_name
                ),
            }
        }

        // Spell slots last, they depend on the final class levels
        committed.proficiency_bonus = ProficiencyBonus(proficiency_bonus(&committed.progression));
        self.manager.update_hit_points(
            &committed.progression,
            &committed.ability_scores,
            &mut committed.hit_points,
        );
        self.manager
            .initialize_spellcasting(&committed.progression, &mut committed.spellcasting);
        self.manager
            .update_spell_slots(&mut committed.progression, &mut committed.spellcasting);

        check_committed(&committed, self.manager.config().max_level)?;
        Ok(committed)
    }

    /// Commits the staged changes to the character in `world` and returns
    /// the committed character. Nothing in the world is written if the
    /// result would be invalid.
    pub fn apply_changes(&mut self, world: &mut World) -> Result<Character, ProgressionError> {
        let live = Character::try_from_world(world, self.entity)
            .ok_or(ProgressionError::MissingCharacter(self.entity))?;

        let mut committed = self.build_committed(live)?;
        let record = self.level_up_record(&committed);
        self.manager
            .record_level_up(&mut committed.progression, record);

        world
            .insert(self.entity, committed.clone())
            .map_err(|_| ProgressionError::MissingCharacter(self.entity))?;

        info!(
            "Session {} committed {} at level {}",
            self.id,
            committed.name,
            committed.total_level()
        );

        // The session continues from the committed state
        self.initial_state = StagedChanges::from_character(&committed);
        self.staged = self.initial_state.clone();
        self.step_data.clear();
        self.validation_report = self.validator.validate(committed.snapshot());

        Ok(committed)
    }

    /// Drops every staged change. The live character was never written, so
    /// this cannot fail.
    pub fn discard(&mut self) {
        debug!("Session {} discarded its staged changes", self.id);
        self.staged = self.initial_state.clone();
        self.step_data.clear();
    }

    // Validation

    /// Missing choices of the character as it was when the session opened.
    pub fn validation_report(&self) -> &ValidationReport {
        &self.validation_report
    }

    pub fn has_missing_choices(&self) -> bool {
        !self.validation_report.is_valid()
    }

    /// The opening report without findings for class levels the staged
    /// character no longer has.
    pub fn filtered_validation_report(&self) -> ValidationReport {
        let progression = self.staged.progression();
        let mut missing = self.validation_report.missing().clone();

        for category in FindingCategory::iter() {
            let findings = std::mem::take(missing.get_mut(category));
            *missing.get_mut(category) = findings
                .into_iter()
                .filter_map(|finding| {
                    let level = progression.class_level(&finding.class);
                    match finding.detail {
                        FindingDetail::Asi { unused_levels } => Finding::unused_asis(
                            &finding.class,
                            unused_levels.into_iter().filter(|l| *l <= level).collect(),
                        ),
                        _ => (finding.level <= level).then_some(finding),
                    }
                })
                .collect();
        }

        ValidationReport::from_parts(missing, self.validation_report.warnings().to_vec())
    }

    /// Whether any choice is still owed at the current staged level of its
    /// class.
    pub fn has_missing_choices_for_current_level(&self) -> bool {
        let progression = self.staged.progression();
        self.filtered_validation_report()
            .findings()
            .any(|(_, finding)| {
                let level = progression.class_level(&finding.class);
                match &finding.detail {
                    FindingDetail::Asi { unused_levels } => unused_levels.contains(&level),
                    _ => finding.level == level,
                }
            })
    }

    pub fn missing_choices_summary(&self) -> MissingChoicesSummary {
        MissingChoicesSummary::from(&self.filtered_validation_report())
    }
}
