extern crate progression_rs;

mod tests {
    use std::sync::{Arc, Mutex};

    use progression_rs::{
        components::{
            ability::Ability,
            level::{Level, ProgressionRecord},
            level_up::LevelUpRecord,
            spells::spellcasting::SpellcastingState,
        },
        config::RulesConfig,
        engine::event::{ProgressionEvent, ProgressionEventKind},
        systems::progression::ProgressionManager,
        test_utils::fixtures::{self, characters},
    };
    use rstest::rstest;

    #[test]
    fn setting_the_same_level_twice_changes_nothing() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        let mut manager = ProgressionManager::new(fixtures::class_registry());
        manager.add_listener(Arc::new(move |event: &ProgressionEvent| {
            sink.lock().unwrap().push(event.kind.clone());
        }));

        let mut progression = ProgressionRecord::new();
        let mut spellcasting = SpellcastingState::new();
        manager.add_class_level(&mut progression, &mut spellcasting, "Wizard", 3, "PHB");
        let (once, once_spellcasting) = (progression.clone(), spellcasting.clone());
        manager.add_class_level(&mut progression, &mut spellcasting, "Wizard", 3, "PHB");

        assert_eq!(progression, once);
        assert_eq!(spellcasting, once_spellcasting);
        assert_eq!(
            *events.lock().unwrap(),
            vec![ProgressionEventKind::MulticlassAdded {
                class_name: "Wizard".to_string(),
                level: 3,
            }]
        );
    }

    #[test]
    fn total_level_is_the_sum_of_class_levels() {
        let manager = ProgressionManager::new(fixtures::class_registry());
        let mut progression = ProgressionRecord::new();
        let mut spellcasting = SpellcastingState::new();

        for (class_name, level) in [("Fighter", 5), ("wizard", 2), ("Cleric", 1), ("Wizard", 4)] {
            manager.add_class_level(&mut progression, &mut spellcasting, class_name, level, "PHB");
            let sum: u8 = progression.classes.iter().map(|entry| entry.levels).sum();
            assert_eq!(manager.total_level(&progression), sum);
        }
        assert_eq!(progression.classes.len(), 3);
        assert_eq!(progression.total_level(), 10);

        manager.remove_class_level(&mut progression, &mut spellcasting, "Fighter");
        assert_eq!(progression.total_level(), 5);
        assert!(spellcasting.class("Fighter").is_none());
    }

    #[test]
    fn levels_are_clamped_to_the_configured_maximum() {
        let config = RulesConfig {
            max_level: 10,
            ..RulesConfig::default()
        };
        let manager = ProgressionManager::with_config(fixtures::class_registry(), config);
        let mut progression = ProgressionRecord::new();
        let mut spellcasting = SpellcastingState::new();

        manager.add_class_level(&mut progression, &mut spellcasting, "Fighter", 15, "PHB");
        assert_eq!(progression.class_level("Fighter"), 10);
        manager.add_class_level(&mut progression, &mut spellcasting, "Fighter", 0, "PHB");
        assert_eq!(progression.class_level("Fighter"), 1);
    }

    #[rstest]
    #[case(3, false)]
    #[case(4, true)]
    #[case(5, false)]
    #[case(6, true)]
    fn fighter_asi_levels(#[case] level: u8, #[case] available: bool) {
        let manager = ProgressionManager::new(fixtures::class_registry());
        let fighter = characters::fighter(level);
        assert_eq!(
            manager.has_asi_available(&fighter.progression, "Fighter"),
            available
        );
    }

    #[test]
    fn used_asi_is_no_longer_available() {
        let manager = ProgressionManager::new(fixtures::class_registry());
        let mut fighter = characters::fighter(4);
        manager.record_level_up(
            &mut fighter.progression,
            LevelUpRecord::new(3, 4)
                .for_class("Fighter", 4)
                .with_ability_change(Ability::Strength, 15, 17),
        );
        assert!(!manager.has_asi_available(&fighter.progression, "Fighter"));
    }

    #[test]
    fn asi_levels_of_a_multiclass_character() {
        let manager = ProgressionManager::new(fixtures::class_registry());
        let character = characters::with_classes("Gish", &[("Fighter", 6), ("Wizard", 4)]);
        let levels: Vec<u8> = manager.asi_levels(&character.progression).into_iter().collect();
        assert_eq!(levels, vec![4, 6, 8, 12, 14, 16, 19]);
    }

    #[test]
    fn multiclass_options_report_requirements() {
        let manager = ProgressionManager::new(fixtures::class_registry());
        let fighter = characters::fighter(3);
        let options = manager.multiclass_options(&fighter.progression, &fighter.ability_scores);

        assert!(options.iter().all(|option| option.class_name != "Fighter"));
        let met = |name: &str| {
            options
                .iter()
                .find(|option| option.class_name == name)
                .map(|option| option.requirements_met)
        };
        assert_eq!(met("Wizard"), Some(true));
        assert_eq!(met("Paladin"), Some(true));
        assert_eq!(met("Cleric"), Some(false));
    }

    #[test]
    fn experience_for_next_level() {
        let manager = ProgressionManager::new(fixtures::class_registry());
        assert_eq!(
            manager.experience_for_next_level(&characters::fighter(1).progression),
            300
        );
        assert_eq!(
            manager.experience_for_next_level(&characters::fighter(20).progression),
            0
        );
    }
}
