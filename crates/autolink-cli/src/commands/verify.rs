//! `verify`: report everything that would make linking surprising.

use crate::common::{platforms_or_all, ProjectOpts};
use autolink_config::Platform;
use autolink_manifest::{ExclusionReason, ResolutionResult};
use clap::Args;
use colored::Colorize;

#[derive(Args, Debug, Clone)]
pub struct VerifyCommand {
    #[command(flatten)]
    pub project: ProjectOpts,

    /// Platform to verify; all platforms when omitted
    #[arg(long)]
    pub platform: Option<Platform>,
}

pub fn handle_verify(cmd: VerifyCommand) -> anyhow::Result<()> {
    let (result, _) = cmd.project.resolve(&platforms_or_all(cmd.platform))?;

    let problems = print_report(&result);
    if result.has_failures() {
        anyhow::bail!("Some native modules are broken and were not linked");
    }
    if problems == 0 {
        println!("{}", "No problems found.".green());
    }
    Ok(())
}

/// Print duplicates, exclusions and unresolved dependencies; returns how many were shown
fn print_report(result: &ResolutionResult) -> usize {
    let mut count = 0;
    for (platform, resolution) in result.platforms() {
        if resolution.excluded.is_empty() {
            continue;
        }
        println!("{}", format!("{}:", platform).bold());
        for entry in &resolution.excluded {
            count += 1;
            let reason = if entry.reason.is_failure() {
                entry.reason.to_string().red()
            } else {
                entry.reason.to_string().yellow()
            };
            println!(" {} {}", entry.name.bold().blue(), reason);
            match entry.reason {
                ExclusionReason::DuplicateModule => {
                    println!("   ignored:  {}", entry.package_path.display());
                    println!("   selected: {}", entry.detail);
                }
                _ => println!("   {}", entry.detail.dimmed()),
            }
        }
    }

    if !result.unresolved().is_empty() {
        println!("{}", "Unresolved dependencies:".bold());
        for dependency in result.unresolved() {
            count += 1;
            println!(
                " {} {}",
                dependency.name.bold(),
                format!("(required by {})", dependency.requested_by).dimmed()
            );
        }
    }
    count
}
