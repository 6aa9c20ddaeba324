use crate::errors::ModError;
use crate::expo_config::ExpoConfig;
use crate::registry::{ModDefinition, ModKey, ModResult};
use crate::resources::ResourceXml;
use crate::styles::{app_theme_group, assign_styles_value};
use autolink_config::{Diagnostics, Platform};

pub const MOD_NAME: &str = "statusBar";
pub const TAG: &str = "STATUS_BAR_PLUGIN";

const WINDOW_LIGHT_STATUS_BAR: &str = "android:windowLightStatusBar";
const STATUS_BAR_COLOR: &str = "android:statusBarColor";
const TRANSPARENT: &str = "@android:color/transparent";

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
    if let Some(status_bar) = &config.android_status_bar {
        if status_bar.background_color.is_some() {
            diagnostics.warn_platform(
                Platform::Android,
                TAG,
                "Due to Android edge-to-edge enforcement, `androidStatusBar.backgroundColor` is deprecated and has no effect.",
            );
        }
        if status_bar.translucent.is_some() {
            diagnostics.warn_platform(
                Platform::Android,
                TAG,
                "Due to Android edge-to-edge enforcement, `androidStatusBar.translucent` is deprecated and has no effect.",
            );
        }
    }
    set_status_bar_styles(config, result.as_resources_mut()?);
    Ok(())
}

/// `androidStatusBar.barStyle`, `light-content` when unset
pub fn get_status_bar_style(config: &ExpoConfig) -> &str {
    config
        .android_status_bar
        .as_ref()
        .and_then(|bar| bar.bar_style.as_deref())
        .filter(|style| !style.is_empty())
        .unwrap_or("light-content")
}

pub fn set_status_bar_styles(config: &ExpoConfig, styles: &mut ResourceXml) {
    // light-content is the platform default and needs no item
    assign_styles_value(
        styles,
        app_theme_group(),
        WINDOW_LIGHT_STATUS_BAR,
        "true",
        get_status_bar_style(config) == "dark-content",
    );
    assign_styles_value(styles, app_theme_group(), STATUS_BAR_COLOR, TRANSPARENT, true);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expo_config::AndroidStatusBar;
    use crate::styles::get_styles_group_as_map;

    fn config(status_bar: Option<AndroidStatusBar>) -> ExpoConfig {
        ExpoConfig {
            name: Some("foo".to_string()),
            slug: Some("bar".to_string()),
            android_status_bar: status_bar,
            ..ExpoConfig::default()
        }
    }

    #[test]
    fn test_status_bar_style_defaults_to_light_content() {
        assert_eq!(get_status_bar_style(&config(None)), "light-content");
        let dark = config(Some(AndroidStatusBar {
            bar_style: Some("dark-content".to_string()),
            ..AndroidStatusBar::default()
        }));
        assert_eq!(get_status_bar_style(&dark), "dark-content");
        let empty = config(Some(AndroidStatusBar {
            bar_style: Some(String::new()),
            ..AndroidStatusBar::default()
        }));
        assert_eq!(get_status_bar_style(&empty), "light-content");
    }

    #[test]
    fn test_dark_content_sets_light_status_bar() {
        let dark = config(Some(AndroidStatusBar {
            bar_style: Some("dark-content".to_string()),
            ..AndroidStatusBar::default()
        }));
        let mut styles = ResourceXml::default();
        set_status_bar_styles(&dark, &mut styles);

        let group = get_styles_group_as_map(&styles, app_theme_group()).unwrap_or_default();
        assert_eq!(group.get(STATUS_BAR_COLOR).map(String::as_str), Some(TRANSPARENT));
        assert_eq!(group.get(WINDOW_LIGHT_STATUS_BAR).map(String::as_str), Some("true"));
    }

    #[test]
    fn test_default_style_omits_light_status_bar() {
        let mut styles = ResourceXml::default();
        set_status_bar_styles(&config(None), &mut styles);

        let group = get_styles_group_as_map(&styles, app_theme_group()).unwrap_or_default();
        assert_eq!(group.get(STATUS_BAR_COLOR).map(String::as_str), Some(TRANSPARENT));
        assert!(!group.contains_key(WINDOW_LIGHT_STATUS_BAR));
    }

    #[test]
    fn test_deprecated_fields_warn() -> anyhow::Result<()> {
        let deprecated = config(Some(AndroidStatusBar {
            background_color: Some("#000000".to_string()),
            translucent: Some(true),
            ..AndroidStatusBar::default()
        }));
        let mut result = ModResult::empty(ModKey::AndroidStyles);
        let mut diagnostics = Diagnostics::new();
        apply(&deprecated, &mut result, &mut diagnostics)?;
        assert_eq!(diagnostics.with_tag(TAG).count(), 2);
        Ok(())
    }
}
