//! Common types and utilities shared across commands

use crate::logger;
use anyhow::Context;
use autolink_config::{
    AutolinkingOptions, CancelToken, Diagnostics, MemoScope, Memoizer, Platform, Severity,
};
use autolink_manifest::ResolutionResult;
use clap::{Args, Parser};
use std::path::PathBuf;
use tracing::debug;

/// Global CLI options available to all commands
#[derive(Parser, Debug, Clone)]
pub struct GlobalOpts {
    #[arg(short, long, global = true, help = "Decrease verbosity")]
    pub quiet: bool,

    #[arg(short, long, global = true, action = clap::ArgAction::Count, help = "Increase verbosity (-v for debug, -vv for trace)")]
    pub verbose: u8,
}

impl GlobalOpts {
    /// Get the effective verbosity level
    /// - 0: quiet/warn only
    /// - 1: debug (-v)
    /// - 2: trace (-vv)
    pub fn verbosity_level(&self) -> u8 {
        if self.quiet {
            0
        } else {
            self.verbose
        }
    }
}

/// Project selection shared by every command
#[derive(Args, Debug, Clone)]
pub struct ProjectOpts {
    /// Directory holding the app's package.json
    #[arg(long, default_value = ".")]
    pub project_root: PathBuf,

    /// Upper bound on parallel manifest reads
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Leave a module out of the result (repeatable)
    #[arg(long, value_name = "MODULE")]
    pub exclude: Vec<String>,
}

/// Project selection for commands that do not resolve modules
#[derive(Args, Debug, Clone)]
pub struct ProjectRootOpts {
    /// Directory holding the app's package.json
    #[arg(long, default_value = ".")]
    pub project_root: PathBuf,
}

impl ProjectOpts {
    /// Effective options: project config files, then command-line flags
    pub fn options(&self, scope: &MemoScope<'_>) -> anyhow::Result<AutolinkingOptions> {
        let options = AutolinkingOptions::load(&self.project_root, scope).with_context(|| {
            format!(
                "Failed to load autolinking options from {}",
                self.project_root.display()
            )
        })?;
        let options = options.with_cli(self.exclude.clone(), self.concurrency)?;
        debug!("Effective autolinking options: {:?}", options);
        Ok(options)
    }

    /// Resolve the project for `platforms` inside a fresh memoization scope
    pub fn resolve(
        &self,
        platforms: &[Platform],
    ) -> anyhow::Result<(ResolutionResult, Diagnostics)> {
        let memoizer = Memoizer::new();
        let scope = memoizer.acquire()?;
        let options = self.options(&scope)?;

        logger::spinner_start("Resolving native modules");
        let resolved = autolink_manifest::resolve(
            &self.project_root,
            platforms,
            &options,
            &scope,
            &CancelToken::new(),
        );
        scope.release();
        let (result, diagnostics) = match resolved {
            Ok(resolved) => resolved,
            Err(e) => {
                logger::spinner_error("Failed to resolve native modules");
                return Err(e.into());
            }
        };

        logger::spinner_success(&format!(
            "Found {} native packages",
            result.graph().candidates().count()
        ));
        for (platform, _) in result.platforms() {
            logger::step(&format!(
                "{}: {} linked, {} excluded",
                platform,
                result.modules(platform).len(),
                result.excluded(platform).len()
            ));
        }
        Ok((result, diagnostics))
    }
}

/// One platform, or all of them when none was asked for
pub fn platforms_or_all(platform: Option<Platform>) -> Vec<Platform> {
    platform.map_or_else(|| Platform::ALL.to_vec(), |p| vec![p])
}

/// Print collected diagnostics on stderr
pub fn report_diagnostics(diagnostics: &Diagnostics) {
    for diagnostic in diagnostics.iter() {
        match diagnostic.severity {
            Severity::Warning => logger::warn(&diagnostic.to_string()),
            Severity::Error => logger::error(&diagnostic.to_string()),
        }
    }
}

/// Write `value` to stdout as pretty JSON
pub fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", json);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quiet_overrides_verbose() {
        let opts = GlobalOpts {
            quiet: true,
            verbose: 2,
        };
        assert_eq!(opts.verbosity_level(), 0);
    }

    #[test]
    fn test_platforms_or_all() {
        assert_eq!(platforms_or_all(Some(Platform::Web)), vec![Platform::Web]);
        assert_eq!(platforms_or_all(None).len(), 3);
    }
}
