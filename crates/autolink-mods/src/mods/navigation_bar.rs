use crate::errors::ModError;
use crate::expo_config::ExpoConfig;
use crate::registry::{ModDefinition, ModKey, ModResult};
use crate::resources::ResourceXml;
use crate::styles::{app_theme_group, assign_styles_value};
use autolink_config::{Diagnostics, Platform};

pub const MOD_NAME: &str = "navigationBar";
pub const TAG: &str = "androidNavigationBar";

pub fn definition() -> ModDefinition {
    ModDefinition {
        name: MOD_NAME,
        key: ModKey::AndroidStyles,
        apply,
    }
}

fn apply(
    config: &ExpoConfig,
    result: &mut ModResult,
    diagnostics: &mut Diagnostics,
) -> Result<(), ModError> {
    if config.android_navigation_bar.is_some() {
        diagnostics.warn_platform(
            Platform::Android,
            TAG,
            "property is deprecated. Use the `expo-navigation-bar` plugin configuration instead.",
        );
    }
    set_navigation_bar_styles(config, result.as_resources_mut()?);
    Ok(())
}

pub fn get_navigation_bar_style(config: &ExpoConfig) -> &str {
    config
        .android_navigation_bar
        .as_ref()
        .and_then(|bar| bar.bar_style.as_deref())
        .filter(|style| !style.is_empty())
        .unwrap_or("light-content")
}

pub fn set_navigation_bar_styles(config: &ExpoConfig, styles: &mut ResourceXml) {
    assign_styles_value(
        styles,
        app_theme_group(),
        "android:windowLightNavigationBar",
        "true",
        get_navigation_bar_style(config) == "dark-content",
    );
    assign_styles_value(
        styles,
        app_theme_group(),
        "android:navigationBarColor",
        "@android:color/transparent",
        true,
    );
}
