pub mod classes;
pub mod registry;
pub mod serialize;
