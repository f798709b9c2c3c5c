use std::sync::LazyLock;

use crate::registry::classes::ClassRegistry;

static CLASS_REGISTRY: LazyLock<ClassRegistry> = LazyLock::new(|| {
    ClassRegistry::load_bundled().expect("Failed to load bundled class data")
});

pub fn class_registry() -> &'static ClassRegistry {
    &CLASS_REGISTRY
}

pub mod characters {
    use hecs::{Entity, World};

    use crate::{
        components::{
            ability::{Ability, AbilityScoreMap},
            level::{Level, ProficiencyBonus},
            spells::spellcasting::SpellcastingState,
        },
        entities::character::Character,
        systems::{health, progression::ProgressionManager},
        config::HitPointMode,
    };

    use super::class_registry;

    pub fn ability_scores() -> AbilityScoreMap {
        AbilityScoreMap::from([
            (Ability::Strength, 15),
            (Ability::Dexterity, 13),
            (Ability::Constitution, 14),
            (Ability::Intelligence, 14),
            (Ability::Wisdom, 10),
            (Ability::Charisma, 13),
        ])
    }

    /// A character with the given class levels, hit points and spell slots
    /// filled in, but none of the choices made.
    pub fn with_classes(name: &str, classes: &[(&str, u8)]) -> Character {
        let registry = class_registry();
        let manager = ProgressionManager::new(registry);
        let mut character = Character::new(name, ability_scores());
        let mut spellcasting = SpellcastingState::new();

        for (class_name, level) in classes {
            manager.add_class_level(
                &mut character.progression,
                &mut spellcasting,
                class_name,
                *level,
                "PHB",
            );
        }
        manager.update_spell_slots(&mut character.progression, &mut spellcasting);
        character.spellcasting = spellcasting;

        if let Some(max) = health::hit_point_maximum(
            registry,
            &character.progression,
            &character.ability_scores,
            HitPointMode::Average,
        ) {
            character.hit_points.update_max(max);
        }
        character.proficiency_bonus = ProficiencyBonus(character.progression.proficiency_bonus());
        character
    }

    pub fn fighter(level: u8) -> Character {
        with_classes("Fighter", &[("Fighter", level)])
    }

    pub fn wizard(level: u8) -> Character {
        with_classes("Wizard", &[("Wizard", level)])
    }

    pub fn warlock(level: u8) -> Character {
        with_classes("Warlock", &[("Warlock", level)])
    }

    pub fn spawn(world: &mut World, character: Character) -> Entity {
        world.spawn(character)
    }
}
