pub mod apply_mods;
pub mod generate;
pub mod resolve;
pub mod search;
pub mod verify;
