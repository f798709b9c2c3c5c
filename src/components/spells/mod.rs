pub mod spell;
pub mod spellcasting;
