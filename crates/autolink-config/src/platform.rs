use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Target platform of a native module.
///
/// `Web` is the platform without a native build system: modules are resolved
/// for it but no provider source is generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Android,
    Ios,
    Web,
}

impl Platform {
    pub const ALL: [Platform; 3] = [Platform::Android, Platform::Ios, Platform::Web];

    pub fn as_str(self) -> &'static str {
        match self {
            Platform::Android => "android",
            Platform::Ios => "ios",
            Platform::Web => "web",
        }
    }

    /// Map a platform name as written in a module marker.
    ///
    /// Apple platforms all link through the same CocoaPods path.
    pub fn from_marker_name(name: &str) -> Option<Self> {
        match name {
            "android" => Some(Platform::Android),
            "ios" | "apple" | "macos" | "tvos" => Some(Platform::Ios),
            "web" => Some(Platform::Web),
            _ => None,
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Platform::from_marker_name(&s.to_ascii_lowercase())
            .ok_or_else(|| format!("Unknown platform '{}' (expected android, ios or web)", s))
    }
}
