//! Built-in mods.

pub mod app_config;
pub mod navigation_bar;
pub mod status_bar;

use crate::registry::ModDefinition;

/// Applied when the app config does not list `plugins`
pub const DEFAULT_MODS: [&str; 3] = [
    status_bar::MOD_NAME,
    navigation_bar::MOD_NAME,
    app_config::MOD_NAME,
];

pub fn builtin() -> [ModDefinition; 3] {
    [
        status_bar::definition(),
        navigation_bar::definition(),
        app_config::definition(),
    ]
}
