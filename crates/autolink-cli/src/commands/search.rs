use crate::common::{print_json, ProjectOpts};
use autolink_config::{CancelToken, Memoizer, Platform};
use autolink_manifest::SearchEntry;
use clap::Args;
use colored::Colorize;

#[derive(Args, Debug, Clone)]
pub struct SearchCommand {
    #[command(flatten)]
    pub project: ProjectOpts,

    /// Only list modules that support this platform
    #[arg(long)]
    pub platform: Option<Platform>,

    /// Print the candidates as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn handle_search(cmd: SearchCommand) -> anyhow::Result<()> {
    let memoizer = Memoizer::new();
    let scope = memoizer.acquire()?;
    let options = cmd.project.options(&scope)?;
    let entries = autolink_manifest::search(
        &cmd.project.project_root,
        &options,
        &scope,
        &CancelToken::new(),
    )?;
    scope.release();

    let entries: Vec<SearchEntry> = entries
        .into_iter()
        .filter(|entry| {
            cmd.platform
                .map_or(true, |platform| entry.platforms.contains(&platform))
        })
        .collect();

    if cmd.json {
        return print_json(&entries);
    }

    if entries.is_empty() {
        println!("No native modules found.");
        return Ok(());
    }

    println!("{}", "Native modules:".bold().green());
    for entry in &entries {
        let platforms: Vec<&str> = entry.platforms.iter().map(|p| p.as_str()).collect();
        println!(
            " {} {} {}",
            entry.module_name.bold().blue(),
            format!("{}@{}", entry.package_name, entry.version).dimmed(),
            format!("[{}]", platforms.join(", ")).cyan()
        );
        println!("   {}", entry.path.display().to_string().dimmed());
    }
    Ok(())
}
