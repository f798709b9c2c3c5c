use std::{collections::BTreeMap, sync::LazyLock};

use regex::Regex;
use tracing::{debug, warn};

use crate::{
    components::{
        class::{ClassDefinition, ClassFeature},
        level::{ClassEntry, ProgressionRecord},
        level_up::ChoiceCategory,
        spells::spellcasting::SpellcastingState,
        validation::{Finding, FindingCategory, FindingDetail, ValidationReport},
    },
    config::RulesConfig,
    registry::classes::ClassDataProvider,
    systems::{
        progression::{ASI_FEATURE, class_asi_levels, unused_asi_levels},
        spells::SpellSlotCalculator,
    },
};

static CHOICE_COUNT_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    ["choose", "gain", "select", "learn", "know"]
        .iter()
        .map(|verb| Regex::new(&format!(r"(?i)\b{} (\d+)", verb)).expect("valid regex"))
        .collect()
});

static BARE_CHOICE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(choose|select)\b").expect("valid regex"));

/// Number of options a feature's text asks the player to pick. A bare
/// "choose" or "select" without a number counts as one; text that asks for
/// nothing gives zero.
pub fn parse_choice_count(text: &str) -> u8 {
    for pattern in CHOICE_COUNT_PATTERNS.iter() {
        if let Some(count) = pattern
            .captures(text)
            .and_then(|captures| captures.get(1))
            .and_then(|count| count.as_str().parse::<u8>().ok())
        {
            return count;
        }
    }

    if BARE_CHOICE.is_match(text) { 1 } else { 0 }
}

/// Level at which a class grants its subclass.
pub fn subclass_level(class: &ClassDefinition, config: &RulesConfig) -> u8 {
    class
        .class_features
        .iter()
        .find(|feature| {
            feature.gain_subclass_feature
                || class
                    .subclass_title
                    .as_deref()
                    .is_some_and(|title| feature.name.eq_ignore_ascii_case(title))
        })
        .and_then(|feature| feature.level)
        .unwrap_or(config.default_subclass_level)
}

/// Features checked elsewhere: the subclass grant and Ability Score
/// Improvements.
fn has_own_check(class: &ClassDefinition, feature_name: &str) -> bool {
    feature_name.eq_ignore_ascii_case(ASI_FEATURE)
        || class.class_features.iter().any(|feature| {
            feature.name.eq_ignore_ascii_case(feature_name)
                && (feature.gain_subclass_feature
                    || class
                        .subclass_title
                        .as_deref()
                        .is_some_and(|title| feature.name.eq_ignore_ascii_case(title)))
        })
}

/// The parts of a character the validator looks at.
#[derive(Debug, Clone, Copy)]
pub struct CharacterSnapshot<'c> {
    pub progression: &'c ProgressionRecord,
    pub spellcasting: &'c SpellcastingState,
}

/// Reports every choice a character still owes its classes. Validation never
/// fails: unknown classes only add a warning.
pub struct CompletenessValidator<'a> {
    classes: &'a dyn ClassDataProvider,
    config: RulesConfig,
}

impl<'a> CompletenessValidator<'a> {
    pub fn new(classes: &'a dyn ClassDataProvider) -> Self {
        Self::with_config(classes, RulesConfig::default())
    }

    pub fn with_config(classes: &'a dyn ClassDataProvider, config: RulesConfig) -> Self {
        Self { classes, config }
    }

    pub fn validate(&self, character: CharacterSnapshot<'_>) -> ValidationReport {
        let mut report = ValidationReport::new();

        for entry in character
            .progression
            .classes
            .iter()
            .filter(|entry| entry.levels > 0)
        {
            let Some(class) = self.classes.class(&entry.name) else {
                warn!("Cannot validate unknown class {}", entry.name);
                report.warn(format!("Unknown class: {}", entry.name));
                continue;
            };

            self.check_subclass(class, entry, &mut report);
            self.check_spells(class, entry, character.spellcasting, &mut report);
            self.check_feature_choices(class, entry, &mut report);
            self.check_asis(class, entry, character.progression, &mut report);
        }

        debug!(
            "Validated {} classes: {} missing choices, {} warnings",
            character.progression.classes.len(),
            report.missing().len(),
            report.warnings().len()
        );
        report
    }

    fn check_subclass(&self, class: &ClassDefinition, entry: &ClassEntry, report: &mut ValidationReport) {
        let level = subclass_level(class, &self.config);
        if entry.levels < level || entry.subclass.is_some() {
            return;
        }
        let title = class
            .subclass_title
            .clone()
            .unwrap_or_else(|| "Subclass".to_string());
        report.push(
            FindingCategory::Subclasses,
            Finding {
                class: entry.name.clone(),
                level,
                message: format!("{} {} has not chosen a {}", entry.name, entry.levels, title),
                detail: FindingDetail::Subclass { title },
            },
        );
    }

    fn check_spells(
        &self,
        class: &ClassDefinition,
        entry: &ClassEntry,
        spellcasting: &SpellcastingState,
        report: &mut ValidationReport,
    ) {
        if class
            .spellcasting_ability(entry.subclass.as_deref())
            .is_none()
        {
            return;
        }

        let calculator = SpellSlotCalculator::new(self.classes);
        let class_spellcasting = spellcasting.class(&entry.name);
        let known_cantrips = class_spellcasting.map_or(0, |state| state.known_cantrips());
        let known_spells = class_spellcasting.map_or(0, |state| state.known_leveled_spells());

        let expected_cantrips = calculator.cantrips_known_for(entry) as usize;
        if known_cantrips < expected_cantrips {
            let missing = expected_cantrips - known_cantrips;
            report.push(
                FindingCategory::Spells,
                Finding {
                    class: entry.name.clone(),
                    level: entry.levels,
                    message: format!("{} can learn {} more cantrips", entry.name, missing),
                    detail: FindingDetail::Spells {
                        expected: expected_cantrips,
                        actual: known_cantrips,
                        missing,
                        cantrips: true,
                    },
                },
            );
        }

        let expected_spells = calculator.spells_known_limit_for(entry);
        if known_spells < expected_spells {
            let missing = expected_spells - known_spells;
            report.push(
                FindingCategory::Spells,
                Finding {
                    class: entry.name.clone(),
                    level: entry.levels,
                    message: format!("{} can learn {} more spells", entry.name, missing),
                    detail: FindingDetail::Spells {
                        expected: expected_spells,
                        actual: known_spells,
                        missing,
                        cantrips: false,
                    },
                },
            );
        }
    }

    fn available_features(&self, class: &ClassDefinition, entry: &ClassEntry) -> Vec<ClassFeature> {
        let mut features = self
            .classes
            .class_features(&class.name, entry.levels, &entry.source);
        if let Some(subclass) = entry.subclass.as_deref() {
            features.extend(
                self.classes
                    .subclass_features(&class.name, subclass, entry.levels),
            );
        }
        features
    }

    fn check_feature_choices(
        &self,
        class: &ClassDefinition,
        entry: &ClassEntry,
        report: &mut ValidationReport,
    ) {
        // Features listed at several levels count once, at the latest level
        let mut latest: BTreeMap<String, ClassFeature> = BTreeMap::new();
        for feature in self.available_features(class, entry) {
            if feature.subclass_name.is_none() && has_own_check(class, &feature.name) {
                continue;
            }
            let key = feature.name.to_lowercase();
            match latest.get(&key) {
                Some(existing) if existing.level >= feature.level => {}
                _ => {
                    latest.insert(key, feature);
                }
            }
        }

        for feature in latest.values() {
            let category = ChoiceCategory::from_feature_name(&feature.name);
            let required = match class.optional_feature_progression(&feature.name) {
                Some(progression) => progression.count_at(entry.levels),
                None => parse_choice_count(&feature.text()),
            };
            if required == 0 {
                continue;
            }

            let actual = match category {
                Some(category) => entry.selections(category),
                None => entry.selections_for_feature(&feature.name),
            };
            if actual >= required as usize {
                continue;
            }

            let category = category.unwrap_or(ChoiceCategory::Feature);
            report.push(
                category.into(),
                Finding {
                    class: entry.name.clone(),
                    level: feature.level,
                    message: format!(
                        "{}: {} of {} choices made",
                        feature.name, actual, required
                    ),
                    detail: FindingDetail::Choice {
                        feature: feature.name.clone(),
                        required,
                        actual,
                    },
                },
            );
        }
    }

    fn check_asis(
        &self,
        class: &ClassDefinition,
        entry: &ClassEntry,
        progression: &ProgressionRecord,
        report: &mut ValidationReport,
    ) {
        let asi_levels = class_asi_levels(class, &self.config);
        let unused = unused_asi_levels(&entry.name, &asi_levels, entry.levels, &progression.level_ups);
        if let Some(finding) = Finding::unused_asis(&entry.name, unused) {
            report.push(FindingCategory::Asis, finding);
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::{
        components::{
            level_up::{FeatureSelection, LevelUpRecord},
            spells::{spell::Spell, spellcasting::ClassSpellcasting},
        },
        test_utils::fixtures,
    };

    #[rstest]
    #[case("Choose 2 maneuvers from the list.", 2)]
    #[case("You gain 3 superiority dice.", 3)]
    #[case("You select 1 option.", 1)]
    #[case("You learn 4 new spells.", 4)]
    #[case("You know 2 invocations.", 2)]
    #[case("Choose one of the following options.", 1)]
    #[case("Select a fighting style.", 1)]
    #[case("You can take a second action.", 0)]
    fn choice_counts(#[case] text: &str, #[case] expected: u8) {
        assert_eq!(parse_choice_count(text), expected);
    }

    #[test]
    fn choice_patterns_compile() {
        assert_eq!(CHOICE_COUNT_PATTERNS.len(), 5);
        assert!(BARE_CHOICE.is_match("CHOOSE"));
    }

    fn validate(progression: &ProgressionRecord, spellcasting: &SpellcastingState) -> ValidationReport {
        let validator = CompletenessValidator::new(fixtures::class_registry());
        validator.validate(CharacterSnapshot {
            progression,
            spellcasting,
        })
    }

    fn single_class(entry: ClassEntry) -> ProgressionRecord {
        let mut progression = ProgressionRecord::new();
        progression.classes.push(entry);
        progression
    }

    #[test]
    fn subclass_levels_come_from_class_data() {
        let registry = fixtures::class_registry();
        let config = RulesConfig::default();
        assert_eq!(subclass_level(registry.class("Fighter").unwrap(), &config), 3);
        assert_eq!(subclass_level(registry.class("Warlock").unwrap(), &config), 1);
        assert_eq!(subclass_level(registry.class("Wizard").unwrap(), &config), 2);
    }

    #[test]
    fn missing_subclass_is_flagged() {
        let progression = single_class(
            ClassEntry::new("Fighter", "PHB", 3).with_feature(FeatureSelection::new(
                ChoiceCategory::FightingStyle,
                "Fighting Style",
                "Archery",
                1,
            )),
        );
        let report = validate(&progression, &SpellcastingState::new());
        assert_eq!(report.missing().subclasses.len(), 1);
        assert_eq!(report.missing().subclasses[0].level, 3);
        assert!(report.missing().fighting_styles.is_empty());
    }

    #[test]
    fn complete_fighter_is_valid() {
        let progression = single_class(
            ClassEntry::new("Fighter", "PHB", 3)
                .with_subclass("Champion")
                .with_feature(FeatureSelection::new(
                    ChoiceCategory::FightingStyle,
                    "Fighting Style",
                    "Defense",
                    1,
                )),
        );
        let report = validate(&progression, &SpellcastingState::new());
        assert!(report.is_valid(), "{:?}", report);
    }

    #[test]
    fn missing_fighting_style_is_flagged() {
        let progression = single_class(ClassEntry::new("Fighter", "PHB", 1));
        let report = validate(&progression, &SpellcastingState::new());
        let finding = &report.missing().fighting_styles[0];
        assert_eq!(finding.level, 1);
        assert_eq!(
            finding.detail,
            FindingDetail::Choice {
                feature: "Fighting Style".to_string(),
                required: 1,
                actual: 0
            }
        );
    }

    #[test]
    fn warlock_invocations_follow_progression_table() {
        let progression = single_class(
            ClassEntry::new("Warlock", "PHB", 5)
                .with_subclass("The Fiend")
                .with_feature(FeatureSelection::new(
                    ChoiceCategory::Invocation,
                    "Eldritch Invocations",
                    "Agonizing Blast",
                    2,
                ))
                .with_feature(FeatureSelection::new(
                    ChoiceCategory::PactBoon,
                    "Pact Boon",
                    "Pact of the Tome",
                    3,
                )),
        );
        let report = validate(&progression, &SpellcastingState::new());
        assert_eq!(
            report.missing().invocations[0].detail,
            FindingDetail::Choice {
                feature: "Eldritch Invocations".to_string(),
                required: 3,
                actual: 1
            }
        );
        assert!(report.missing().pact_boons.is_empty());
    }

    #[test]
    fn spell_shortfall_reports_deficit() {
        let progression = single_class(ClassEntry::new("Sorcerer", "PHB", 1).with_subclass("Draconic Bloodline"));
        let mut spellcasting = SpellcastingState::new();
        let mut sorcerer = ClassSpellcasting::new(1, None, false);
        sorcerer.learn(Spell::cantrip("Fire Bolt"));
        sorcerer.learn(Spell::new("Magic Missile", 1));
        spellcasting.classes.insert("Sorcerer".to_string(), sorcerer);

        let report = validate(&progression, &spellcasting);
        let spells = &report.missing().spells;
        assert_eq!(spells.len(), 2);
        assert!(spells.contains(&Finding {
            class: "Sorcerer".to_string(),
            level: 1,
            message: "Sorcerer can learn 3 more cantrips".to_string(),
            detail: FindingDetail::Spells {
                expected: 4,
                actual: 1,
                missing: 3,
                cantrips: true
            },
        }));
        assert!(spells.iter().any(|finding| finding.detail
            == FindingDetail::Spells {
                expected: 2,
                actual: 1,
                missing: 1,
                cantrips: false
            }));
    }

    #[test]
    fn asi_used_by_ability_change() {
        let mut progression = single_class(
            ClassEntry::new("Fighter", "PHB", 4)
                .with_subclass("Champion")
                .with_feature(FeatureSelection::new(
                    ChoiceCategory::FightingStyle,
                    "Fighting Style",
                    "Defense",
                    1,
                )),
        );
        progression.level_ups.push(LevelUpRecord::new(3, 4).with_ability_change(
            crate::components::ability::Ability::Strength,
            15,
            17,
        ));
        let report = validate(&progression, &SpellcastingState::new());
        assert!(report.missing().asis.is_empty());
        assert!(report.is_valid());
    }

    #[test]
    fn asi_without_changes_is_unused() {
        let mut progression = single_class(ClassEntry::new("Wizard", "PHB", 8).with_subclass("School of Evocation"));
        progression.level_ups.push(LevelUpRecord::new(3, 4));
        let report = validate(&progression, &SpellcastingState::new());
        assert_eq!(report.missing().asis.len(), 1);
        assert_eq!(report.missing().asis[0].level, 4);
        assert_eq!(
            report.missing().asis[0].detail,
            FindingDetail::Asi {
                unused_levels: vec![4, 8]
            }
        );
    }

    #[test]
    fn unknown_class_only_warns() {
        let progression = single_class(ClassEntry::new("Artificer", "TCE", 3));
        let report = validate(&progression, &SpellcastingState::new());
        assert!(report.is_valid());
        assert_eq!(report.warnings(), ["Unknown class: Artificer".to_string()]);
    }

    #[test]
    fn subclass_features_are_checked() {
        let progression = single_class(
            ClassEntry::new("Fighter", "PHB", 3)
                .with_subclass("Battle Master")
                .with_feature(FeatureSelection::new(
                    ChoiceCategory::FightingStyle,
                    "Fighting Style",
                    "Dueling",
                    1,
                ))
                .with_feature(FeatureSelection::new(
                    ChoiceCategory::Feature,
                    "Combat Superiority",
                    "Riposte",
                    3,
                )),
        );
        let report = validate(&progression, &SpellcastingState::new());
        assert_eq!(
            report.missing().features[0].detail,
            FindingDetail::Choice {
                feature: "Combat Superiority".to_string(),
                required: 3,
                actual: 1
            }
        );
    }
}
