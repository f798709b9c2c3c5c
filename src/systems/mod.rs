pub mod health;
pub mod helpers;
pub mod progression;
pub mod spells;
pub mod validation;
