use crate::common::{report_diagnostics, ProjectRootOpts};
use crate::logger;
use autolink_config::{Diagnostics, Memoizer};
use autolink_mods::FailurePolicy;
use clap::Args;
use colored::Colorize;

#[derive(Args, Debug, Clone)]
pub struct ApplyModsCommand {
    #[command(flatten)]
    pub project: ProjectRootOpts,

    /// Keep going when a mod fails instead of discarding every change
    #[arg(long)]
    pub skip_failed: bool,
}

pub fn handle_apply_mods(cmd: ApplyModsCommand) -> anyhow::Result<()> {
    let policy = if cmd.skip_failed {
        FailurePolicy::SkipAndContinue
    } else {
        FailurePolicy::Abort
    };

    let memoizer = Memoizer::new();
    let scope = memoizer.acquire()?;
    let mut diagnostics = Diagnostics::new();
    let outcome =
        autolink_mods::apply_mods(&cmd.project.project_root, policy, &scope, &mut diagnostics);
    scope.release();
    report_diagnostics(&diagnostics);
    let outcome = outcome?;

    for run in outcome.report.applied() {
        logger::debug(&format!("Applied '{}' to {}", run.name, run.key));
    }
    for run in outcome.report.failed() {
        println!(
            " {} {} {}",
            "skipped".yellow(),
            run.name.bold(),
            run.error.as_deref().unwrap_or_default().dimmed()
        );
    }

    if outcome.written.is_empty() {
        println!("Native project files are up to date.");
    } else {
        for path in &outcome.written {
            println!(" {} {}", "updated".green(), path.display());
        }
        logger::success(&format!("Updated {} files", outcome.written.len()));
    }
    Ok(())
}
