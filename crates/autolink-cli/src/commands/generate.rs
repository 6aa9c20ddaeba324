use crate::common::{report_diagnostics, ProjectOpts};
use crate::logger;
use autolink_config::Platform;
use autolink_provider::{Target, WriteOutcome};
use clap::Args;
use std::path::PathBuf;

#[derive(Args, Debug, Clone)]
pub struct GenerateCommand {
    #[command(flatten)]
    pub project: ProjectOpts,

    /// Platform to generate the provider for (ios or android)
    #[arg(long)]
    pub platform: Platform,

    /// Output file; defaults to the location the native build reads
    #[arg(long)]
    pub output: Option<PathBuf>,
}

pub fn handle_generate(cmd: GenerateCommand) -> anyhow::Result<()> {
    // Fail before touching the project when there is nothing to generate
    let target = Target::for_platform(cmd.platform)?;

    let (result, diagnostics) = cmd.project.resolve(&[cmd.platform])?;
    report_diagnostics(&diagnostics);

    let generated = autolink_provider::generate(&result, cmd.platform, cmd.output.as_deref())?;
    for error in &generated.rendered.errors {
        logger::warn(&error.to_string());
    }

    match generated.outcome {
        WriteOutcome::Written => logger::success(&format!(
            "Generated {} provider with {} modules: {}",
            target,
            generated.rendered.module_count,
            generated.path.display()
        )),
        WriteOutcome::Unchanged => logger::info(&format!(
            "{} is up to date",
            generated.path.display()
        )),
    }
    println!("{}", generated.path.display());

    if !generated.rendered.errors.is_empty() {
        anyhow::bail!(
            "{} module identifier(s) were rejected and left out of the provider",
            generated.rendered.errors.len()
        );
    }
    Ok(())
}
