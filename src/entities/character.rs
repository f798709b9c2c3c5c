use hecs::Bundle;

use crate::{
    components::{
        ability::AbilityScoreMap,
        hit_points::HitPoints,
        id::FeatId,
        level::{Level, ProficiencyBonus, ProgressionRecord},
        spells::spellcasting::SpellcastingState,
    },
    systems::validation::CharacterSnapshot,
};

macro_rules! from_world {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[$field_meta:meta])*
                $field_vis:vis $field:ident : $ty:ty,
            )*
        }
    ) => {
        use hecs::{World, Entity};
        use crate::systems;

        $(#[$meta])*
        $vis struct $name {
            $(
                $(#[$field_meta])*
                $field_vis $field : $ty,
            )*
        }

        impl $name {
            pub fn from_world(world: &World, entity: Entity) -> Self {
                Self {
                    $(
                        $field: systems::helpers::get_component_clone(world, entity),
                    )*
                }
            }

            /// `None` if the entity lacks any of the components.
            pub fn try_from_world(world: &World, entity: Entity) -> Option<Self> {
                Some(Self {
                    $(
                        $field: systems::helpers::try_get_component_clone(world, entity)?,
                    )*
                })
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CharacterTag;

from_world!(
    #[derive(Bundle, Debug, Clone, PartialEq)]
    pub struct Character {
        pub tag: CharacterTag,
        pub name: String,
        pub ability_scores: AbilityScoreMap,
        pub progression: ProgressionRecord,
        pub spellcasting: SpellcastingState,
        pub hit_points: HitPoints,
        pub feats: Vec<FeatId>,
        pub proficiency_bonus: ProficiencyBonus,
    }
);

impl Character {
    pub fn new(name: impl Into<String>, ability_scores: AbilityScoreMap) -> Self {
        let progression = ProgressionRecord::new();
        Self {
            tag: CharacterTag,
            name: name.into(),
            ability_scores,
            proficiency_bonus: ProficiencyBonus(progression.proficiency_bonus()),
            progression,
            spellcasting: SpellcastingState::new(),
            hit_points: HitPoints::default(),
            feats: Vec::new(),
        }
    }

    pub fn total_level(&self) -> u8 {
        self.progression.total_level()
    }

    pub fn snapshot(&self) -> CharacterSnapshot<'_> {
        CharacterSnapshot {
            progression: &self.progression,
            spellcasting: &self.spellcasting,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::level::ClassEntry;

    #[test]
    fn round_trips_through_world() {
        let mut character = Character::new("Tordek", AbilityScoreMap::new());
        character
            .progression
            .classes
            .push(ClassEntry::new("Fighter", "PHB", 2));
        character.hit_points = HitPoints::new(20);

        let mut world = World::new();
        let entity = world.spawn(character.clone());

        assert_eq!(Character::from_world(&world, entity), character);
        assert_eq!(Character::try_from_world(&world, entity), Some(character));
    }

    #[test]
    fn incomplete_entity_is_not_a_character() {
        let mut world = World::new();
        let entity = world.spawn((String::from("Not a character"), HitPoints::new(4)));
        assert!(Character::try_from_world(&world, entity).is_none());
    }
}
