use autolink::{
    commands::{
        apply_mods::{self, ApplyModsCommand},
        generate::{self, GenerateCommand},
        resolve::{self, ResolveCommand},
        search::{self, SearchCommand},
        verify::{self, VerifyCommand},
    },
    init_tracing, logger, GlobalOpts,
};
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "autolink")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(
    about = "Native module autolinking",
    long_about = "autolink finds the native modules installed in a JavaScript app, generates the provider sources the iOS and Android builds compile, and applies config plugins to the native projects."
)]
struct Cli {
    #[command(flatten)]
    global: GlobalOpts,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List every installed package that ships a native module
    Search(SearchCommand),
    /// Resolve the modules to link for a platform
    Resolve(ResolveCommand),
    /// Report duplicate, excluded and broken modules
    Verify(VerifyCommand),
    /// Write the provider source for the iOS or Android build
    GenerateModulesProvider(GenerateCommand),
    /// Apply config plugins to the native project files
    ApplyMods(ApplyModsCommand),
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = logger::init_with_verbosity(cli.global.verbosity_level()) {
        eprintln!("Warning: Failed to initialize logger: {}", e);
    }
    init_tracing();

    let (name, result) = match cli.command {
        Commands::Search(cmd) => ("Search", search::handle_search(cmd)),
        Commands::Resolve(cmd) => ("Resolve", resolve::handle_resolve(cmd)),
        Commands::Verify(cmd) => ("Verify", verify::handle_verify(cmd)),
        Commands::GenerateModulesProvider(cmd) => ("Generate", generate::handle_generate(cmd)),
        Commands::ApplyMods(cmd) => ("Apply mods", apply_mods::handle_apply_mods(cmd)),
    };

    if let Err(e) = result {
        logger::error(&format!("{} failed: {:#}", name, e));
        std::process::exit(1);
    }
}
