extern crate progression_rs;

mod tests {
    use progression_rs::{
        components::{
            level::ClassEntry,
            spells::spellcasting::{SpellSlot, SpellSlots},
        },
        systems::{progression::ProgressionManager, spells::SpellSlotCalculator},
        test_utils::fixtures::{self, characters},
    };
    use rstest::rstest;

    fn maximums(slots: &SpellSlots) -> Vec<u8> {
        slots.values().map(|slot| slot.max).collect()
    }

    #[test]
    fn wizard_cleric_share_one_pool() {
        let calculator = SpellSlotCalculator::new(fixtures::class_registry());
        let combined = calculator.combined_slots_for(&[
            ClassEntry::new("Wizard", "PHB", 6),
            ClassEntry::new("Cleric", "PHB", 4),
        ]);
        assert_eq!(maximums(&combined.shared), vec![4, 3, 3, 3, 2]);
        assert!(combined.pact.is_empty());
    }

    #[test]
    fn pact_magic_stays_separate() {
        let calculator = SpellSlotCalculator::new(fixtures::class_registry());
        let combined = calculator.combined_slots_for(&[
            ClassEntry::new("Warlock", "PHB", 9),
            ClassEntry::new("Wizard", "PHB", 3),
        ]);
        assert_eq!(maximums(&combined.shared), vec![4, 2]);
        assert_eq!(combined.pact.len(), 1);
        assert_eq!(
            combined.pact["Warlock"],
            SpellSlots::from([(5, SpellSlot::pact(2))])
        );
    }

    #[test]
    fn single_caster_has_no_combined_pool() {
        let calculator = SpellSlotCalculator::new(fixtures::class_registry());
        let combined = calculator.combined_slots_for(&[
            ClassEntry::new("Fighter", "PHB", 5),
            ClassEntry::new("Wizard", "PHB", 3),
        ]);
        assert!(combined.is_empty());
    }

    #[rstest]
    #[case(1, 1, 1)]
    #[case(2, 2, 1)]
    #[case(5, 2, 3)]
    #[case(11, 3, 5)]
    #[case(17, 4, 5)]
    #[case(20, 4, 5)]
    fn warlock_pact_slots(#[case] level: u8, #[case] count: u8, #[case] slot_level: u8) {
        let calculator = SpellSlotCalculator::new(fixtures::class_registry());
        let slots = calculator.slots_for("Warlock", level);
        assert_eq!(slots, SpellSlots::from([(slot_level, SpellSlot::pact(count))]));
    }

    #[test]
    fn eldritch_knight_casts_through_subclass() {
        let calculator = SpellSlotCalculator::new(fixtures::class_registry());
        let plain = ClassEntry::new("Fighter", "PHB", 7);
        let knight = ClassEntry::new("Fighter", "PHB", 7).with_subclass("Eldritch Knight");

        assert!(calculator.slots_for_entry(&plain).is_empty());
        assert_eq!(maximums(&calculator.slots_for_entry(&knight)), vec![3]);
        assert_eq!(calculator.cantrips_known_for(&knight), 2);
        assert_eq!(calculator.spells_known_limit_for(&knight), 5);
    }

    #[test]
    fn level_up_keeps_spent_slots_spent() {
        let registry = fixtures::class_registry();
        let manager = ProgressionManager::new(registry);
        let mut wizard = characters::wizard(3);

        let first = wizard.spellcasting.class_mut("Wizard").unwrap();
        first.spell_slots.get_mut(&1).unwrap().spend().unwrap();

        manager.add_class_level(
            &mut wizard.progression,
            &mut wizard.spellcasting,
            "Wizard",
            4,
            "PHB",
        );
        manager.update_spell_slots(&mut wizard.progression, &mut wizard.spellcasting);

        let slots = &wizard.spellcasting.class("Wizard").unwrap().spell_slots;
        assert_eq!(maximums(slots), vec![4, 3]);
        // Current uses carry over as they were, only the maximum moves
        assert_eq!(slots[&1].current, 3);
        assert_eq!(slots[&2].current, 2);
        assert_eq!(slots[&2].max, 3);
    }

    #[test]
    fn multiclass_pool_is_stored_on_the_character() {
        let registry = fixtures::class_registry();
        let manager = ProgressionManager::new(registry);
        let mut character = characters::with_classes("Hexblade", &[("Warlock", 9), ("Wizard", 3)]);

        let combined =
            manager.calculate_multiclass_spell_slots(&character.progression, &mut character.spellcasting);

        let multiclass = &character.spellcasting.multiclass;
        assert!(multiclass.is_casting_multiclass);
        assert_eq!(multiclass.combined_slots, combined.shared);
        assert_eq!(multiclass.pact_slots["Warlock"][&5].max, 2);
    }
}
