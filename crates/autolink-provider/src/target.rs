use crate::errors::GenerateError;
use autolink_config::Platform;
use std::fmt;
use std::path::{Path, PathBuf};

/// Provider source flavour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Target {
    IosSwift,
    AndroidJava,
}

impl Target {
    pub fn for_platform(platform: Platform) -> Result<Self, GenerateError> {
        match platform {
            Platform::Ios => Ok(Target::IosSwift),
            Platform::Android => Ok(Target::AndroidJava),
            Platform::Web => Err(GenerateError::UnsupportedPlatform(platform)),
        }
    }

    pub fn platform(self) -> Platform {
        match self {
            Target::IosSwift => Platform::Ios,
            Target::AndroidJava => Platform::Android,
        }
    }

    pub fn file_name(self) -> &'static str {
        match self {
            Target::IosSwift => "ExpoModulesProvider.swift",
            Target::AndroidJava => "ExpoModulesPackageList.java",
        }
    }

    /// Where the build expects the provider when no output path is given
    pub fn default_output(self, project_root: &Path) -> PathBuf {
        let dir = match self {
            Target::IosSwift => project_root.join("ios/build/generated/autolinking"),
            Target::AndroidJava => project_root
                .join("android/app/build/generated/autolinking/src/main/java/expo/modules"),
        };
        dir.join(self.file_name())
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Target::IosSwift => "Swift",
            Target::AndroidJava => "Java",
        })
    }
}
