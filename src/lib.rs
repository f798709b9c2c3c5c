extern crate rstest;
extern crate strum;
extern crate uuid;

pub mod components;
pub mod config;
pub mod engine;
pub mod entities;
pub mod registry;
pub mod systems;
pub mod test_utils;
