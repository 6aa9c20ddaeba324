//! Diagnostics collector passed through the resolver, generator and mod engine.
//!
//! Soft failures never abort an invocation; they are collected here and handed
//! back to the caller next to the (partial) result.

use crate::platform::Platform;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Short origin tag, e.g. `STATUS_BAR_PLUGIN` or `duplicate-module`
    pub tag: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<Platform>,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.platform {
            Some(platform) => write!(f, "[{}] {}: {}", platform, self.tag, self.message),
            None => write!(f, "{}: {}", self.tag, self.message),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.entries.push(diagnostic);
    }

    pub fn warn(&mut self, tag: impl Into<String>, message: impl Into<String>) {
        self.push(Diagnostic {
            severity: Severity::Warning,
            tag: tag.into(),
            platform: None,
            message: message.into(),
        });
    }

    pub fn warn_platform(
        &mut self,
        platform: Platform,
        tag: impl Into<String>,
        message: impl Into<String>,
    ) {
        self.push(Diagnostic {
            severity: Severity::Warning,
            tag: tag.into(),
            platform: Some(platform),
            message: message.into(),
        });
    }

    pub fn error(&mut self, tag: impl Into<String>, message: impl Into<String>) {
        self.push(Diagnostic {
            severity: Severity::Error,
            tag: tag.into(),
            platform: None,
            message: message.into(),
        });
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.entries.extend(other.entries);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn has_errors(&self) -> bool {
        self.entries.iter().any(|d| d.severity == Severity::Error)
    }

    /// Diagnostics carrying the given tag
    pub fn with_tag<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a Diagnostic> + 'a {
        self.entries.iter().filter(move |d| d.tag == tag)
    }
}
