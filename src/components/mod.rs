pub mod ability;
pub mod class;
pub mod hit_points;
pub mod id;
pub mod level;
pub mod level_up;
pub mod spells;
pub mod validation;
