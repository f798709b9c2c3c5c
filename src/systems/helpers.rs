use std::{any::type_name, ops::Deref};

use hecs::{Entity, Ref, World};
use tracing::error;

pub fn get_component<'a, T: hecs::Component + 'static>(
    world: &'a World,
    entity: Entity,
) -> Ref<'a, T> {
    world
        .get::<&T>(entity)
        .unwrap_or_else(|_| missing_component_panic::<T>(entity))
}

pub fn get_component_clone<T: hecs::Component + Clone>(world: &World, entity: Entity) -> T {
    get_component::<T>(world, entity).deref().clone()
}

/// Like `get_component_clone`, but for callers that treat a missing component
/// as a recoverable condition.
pub fn try_get_component_clone<T: hecs::Component + Clone>(
    world: &World,
    entity: Entity,
) -> Option<T> {
    world
        .get::<&T>(entity)
        .ok()
        .map(|component| component.deref().clone())
}

fn missing_component_panic<T: 'static>(entity: Entity) -> ! {
    let type_name = type_name::<T>();

    if type_name.starts_with('&') {
        error!(
            "You likely passed a reference type to a helper expecting a component. \
            `get_component::<{}>()` is incorrect, try `get_component::<{}>()` instead.",
            type_name,
            &type_name[1..].trim()
        );
    }

    panic!(
        "Entity {:?} is missing component of type `{}`",
        entity, type_name
    );
}
