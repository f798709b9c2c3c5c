use tracing::warn;

use crate::{
    components::{
        ability::{Ability, AbilityScoreMap},
        hit_points::HitPoints,
        level::ProgressionRecord,
    },
    config::HitPointMode,
    registry::classes::ClassDataProvider,
};

/// Maximum hit points from class levels. The very first character level
/// takes the full hit die of the first class, every later level takes the
/// per-level amount of its class. Each level adds the Constitution modifier
/// but never gives less than one hit point.
///
/// Returns `None` when the character has no classes.
pub fn hit_point_maximum(
    classes: &dyn ClassDataProvider,
    progression: &ProgressionRecord,
    abilities: &AbilityScoreMap,
    mode: HitPointMode,
) -> Option<u32> {
    if progression.classes.is_empty() {
        return None;
    }

    let constitution = abilities.modifier(Ability::Constitution);
    let mut maximum: u32 = 0;
    let mut first_level = true;

    for entry in &progression.classes {
        let Some(class) = classes.class(&entry.name) else {
            warn!("No hit die for unknown class {}, skipping its levels", entry.name);
            continue;
        };

        for _ in 0..entry.levels {
            let base = if first_level {
                first_level = false;
                class.hit_die as u32
            } else {
                mode.per_level(class.hit_die)
            };
            maximum += (base as i32 + constitution).max(1) as u32;
        }
    }

    Some(maximum)
}

/// Moves the maximum of `hit_points` to the value derived from class levels.
pub fn update_hit_points(
    classes: &dyn ClassDataProvider,
    progression: &ProgressionRecord,
    abilities: &AbilityScoreMap,
    hit_points: &mut HitPoints,
    mode: HitPointMode,
) {
    if let Some(maximum) = hit_point_maximum(classes, progression, abilities, mode) {
        hit_points.update_max(maximum);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{components::level::ClassEntry, test_utils::fixtures};

    fn progression(classes: &[(&str, u8)]) -> ProgressionRecord {
        let mut progression = ProgressionRecord::new();
        for (name, levels) in classes {
            progression
                .classes
                .push(ClassEntry::new(*name, "PHB", *levels));
        }
        progression
    }

    fn abilities(constitution: i32) -> AbilityScoreMap {
        let mut abilities = AbilityScoreMap::new();
        abilities.set(Ability::Constitution, constitution);
        abilities
    }

    #[test]
    fn first_level_takes_full_hit_die() {
        let registry = fixtures::class_registry();
        let maximum = hit_point_maximum(
            registry,
            &progression(&[("Fighter", 1)]),
            &abilities(14),
            HitPointMode::Average,
        );
        assert_eq!(maximum, Some(12));
    }

    #[test]
    fn later_levels_take_average() {
        let registry = fixtures::class_registry();
        // Fighter 10 + 2, then 4 levels of 6 + 2, then Wizard 2 levels of 4 + 2
        let maximum = hit_point_maximum(
            registry,
            &progression(&[("Fighter", 5), ("Wizard", 2)]),
            &abilities(14),
            HitPointMode::Average,
        );
        assert_eq!(maximum, Some(12 + 4 * 8 + 2 * 6));
    }

    #[test]
    fn maximum_mode_takes_full_die() {
        let registry = fixtures::class_registry();
        let maximum = hit_point_maximum(
            registry,
            &progression(&[("Wizard", 3)]),
            &abilities(10),
            HitPointMode::Maximum,
        );
        assert_eq!(maximum, Some(18));
    }

    #[test]
    fn each_level_gives_at_least_one() {
        let registry = fixtures::class_registry();
        let maximum = hit_point_maximum(
            registry,
            &progression(&[("Wizard", 2)]),
            &abilities(1),
            HitPointMode::Average,
        );
        assert_eq!(maximum, Some(2));
    }

    #[test]
    fn no_classes_leaves_hit_points_alone() {
        let registry = fixtures::class_registry();
        let mut hit_points = HitPoints::with_current(3, 9);
        update_hit_points(
            registry,
            &ProgressionRecord::new(),
            &abilities(10),
            &mut hit_points,
            HitPointMode::Average,
        );
        assert_eq!(hit_points, HitPoints::with_current(3, 9));
    }

    #[test]
    fn update_shifts_current_by_gain() {
        let registry = fixtures::class_registry();
        let mut hit_points = HitPoints::with_current(5, 10);
        update_hit_points(
            registry,
            &progression(&[("Fighter", 2)]),
            &abilities(10),
            &mut hit_points,
            HitPointMode::Average,
        );
        assert_eq!(hit_points.max(), 16);
        assert_eq!(hit_points.current(), 11);
    }
}
