use crate::resources::{Resource, ResourceXml, StyleGroup, StyleItem};
use std::collections::BTreeMap;

/// Identifies a style group and the parent it is created with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StyleParent<'a> {
    pub name: &'a str,
    pub parent: &'a str,
}

/// The theme the app's main activity uses
pub fn app_theme_group() -> StyleParent<'static> {
    StyleParent {
        name: "AppTheme",
        parent: "Theme.AppCompat.Light.NoActionBar",
    }
}

/// Set (`add = true`) or remove (`add = false`) an item of a style group.
///
/// The group is created with its parent when an item is added to a missing
/// group. An item already holding `value` is left untouched.
pub fn assign_styles_value(
    doc: &mut ResourceXml,
    group: StyleParent<'_>,
    name: &str,
    value: &str,
    add: bool,
) {
    if !add {
        if let Some(style) = doc.style_mut(group.name) {
            style.items.retain(|item| item.name != name);
        }
        return;
    }

    if doc.style(group.name).is_none() {
        doc.resources.push(Resource::Style(StyleGroup {
            name: group.name.to_string(),
            parent: Some(group.parent.to_string()),
            items: Vec::new(),
        }));
    }
    let Some(style) = doc.style_mut(group.name) else {
        return;
    };
    match style.items.iter_mut().find(|item| item.name == name) {
        Some(item) if item.value == value => {}
        Some(item) => item.value = value.to_string(),
        None => style.items.push(StyleItem::new(name, value)),
    }
}

/// Items of a style group keyed by name; `None` when the group is missing
pub fn get_styles_group_as_map(
    doc: &ResourceXml,
    group: StyleParent<'_>,
) -> Option<BTreeMap<String, String>> {
    doc.style(group.name).map(|style| {
        style
            .items
            .iter()
            .map(|item| (item.name.clone(), item.value.clone()))
            .collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assign_creates_group_with_parent() {
        let mut doc = ResourceXml::default();
        assign_styles_value(
            &mut doc,
            app_theme_group(),
            "android:statusBarColor",
            "@android:color/transparent",
            true,
        );
        let style = doc.style("AppTheme");
        assert_eq!(
            style.and_then(|s| s.parent.as_deref()),
            Some("Theme.AppCompat.Light.NoActionBar")
        );
        assert_eq!(style.map(|s| s.items.len()), Some(1));
    }

    #[test]
    fn test_assign_updates_and_removes() {
        let mut doc = ResourceXml::default();
        let theme = app_theme_group();
        assign_styles_value(&mut doc, theme, "android:windowLightStatusBar", "false", true);
        assign_styles_value(&mut doc, theme, "android:windowLightStatusBar", "true", true);
        assert_eq!(
            get_styles_group_as_map(&doc, theme)
                .and_then(|map| map.get("android:windowLightStatusBar").cloned()),
            Some("true".to_string())
        );

        assign_styles_value(&mut doc, theme, "android:windowLightStatusBar", "true", false);
        assert_eq!(get_styles_group_as_map(&doc, theme).map(|map| map.len()), Some(0));
    }

    #[test]
    fn test_updating_value_keeps_item_attributes() -> anyhow::Result<()> {
        let mut doc = ResourceXml::parse(
            r#"<resources xmlns:tools="http://schemas.android.com/tools">
  <style name="AppTheme" parent="Theme.AppCompat.Light.NoActionBar">
    <item name="android:windowLightStatusBar" tools:targetApi="23">false</item>
  </style>
</resources>"#,
        )?;
        assign_styles_value(&mut doc, app_theme_group(), "android:windowLightStatusBar", "true", true);
        assert!(doc.to_xml_string().contains(
            r#"<item name="android:windowLightStatusBar" tools:targetApi="23">true</item>"#
        ));
        Ok(())
    }

    #[test]
    fn test_removing_from_missing_group_is_noop() {
        let mut doc = ResourceXml::default();
        assign_styles_value(&mut doc, app_theme_group(), "android:foo", "1", false);
        assert!(doc.is_empty());
    }
}
