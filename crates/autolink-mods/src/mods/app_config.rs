use crate::errors::ModError;
use crate::expo_config::ExpoConfig;
use crate::registry::{ModDefinition, ModKey, ModResult};
use autolink_config::Diagnostics;

pub const MOD_NAME: &str = "appConfig";

pub fn definition() -> ModDefinition {
    ModDefinition {
        name: MOD_NAME,
        key: ModKey::AppConfigJson,
        apply,
    }
}

/// Embed the app config so the runtime can read it from the app's assets
fn apply(
    config: &ExpoConfig,
    result: &mut ModResult,
    _diagnostics: &mut Diagnostics,
) -> Result<(), ModError> {
    let embedded = serde_json::to_value(config)
        .map_err(|e| ModError::Invalid(format!("app config is not serializable: {}", e)))?;
    *result.as_json_mut()? = embedded;
    Ok(())
}
