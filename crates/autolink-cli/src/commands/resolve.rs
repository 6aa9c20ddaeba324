use crate::common::{print_json, report_diagnostics, ProjectOpts};
use autolink_config::Platform;
use autolink_manifest::{ExcludedModule, ModuleDescriptor, UnresolvedDependency};
use clap::Args;
use colored::Colorize;
use serde::Serialize;

#[derive(Args, Debug, Clone)]
pub struct ResolveCommand {
    #[command(flatten)]
    pub project: ProjectOpts,

    /// Platform to resolve for
    #[arg(long)]
    pub platform: Platform,

    /// Print the resolution as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ResolveOutput<'a> {
    platform: Platform,
    modules: &'a [ModuleDescriptor],
    excluded: &'a [ExcludedModule],
    unresolved: &'a [UnresolvedDependency],
}

pub fn handle_resolve(cmd: ResolveCommand) -> anyhow::Result<()> {
    let (result, diagnostics) = cmd.project.resolve(&[cmd.platform])?;
    report_diagnostics(&diagnostics);

    let modules = result.modules(cmd.platform);
    let excluded = result.excluded(cmd.platform);

    if cmd.json {
        return print_json(&ResolveOutput {
            platform: cmd.platform,
            modules,
            excluded,
            unresolved: result.unresolved(),
        });
    }

    println!(
        "{}",
        format!("Modules linked for {}:", cmd.platform).bold().green()
    );
    if modules.is_empty() {
        println!("  (none)");
    }
    for module in modules {
        println!(
            " {} {}",
            module.name.bold().blue(),
            format!("{}@{}", module.package_name, module.package_version).dimmed()
        );
    }

    if !excluded.is_empty() {
        println!("\n{}", "Excluded:".bold().yellow());
        for entry in excluded {
            println!(
                " {} {} {}",
                entry.name.bold(),
                format!("({})", entry.reason).yellow(),
                entry.package_path.display().to_string().dimmed()
            );
        }
    }
    Ok(())
}
