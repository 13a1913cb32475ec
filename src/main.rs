//! External Properties CLI
//!
//! Inspects the resolver chains of a unit hierarchy and looks up property
//! values the way a build would see them.

use anyhow::Result;
use clap::Parser;
use external_properties::cli::commands::{
    run_exists, run_get, run_properties, run_resolvers, select_unit,
};
use external_properties::cli::migrate::run_migrate;
use external_properties::cli::{Cli, Command};
use external_properties::config::{ManifestPaths, load_workspace};
use external_properties::logging::{self, LogTarget};
use tracing::debug;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on --log option
    logging::init(&LogTarget::parse(&cli.log), cli.verbose)?;

    let working_dir = std::env::current_dir()?;
    let paths = ManifestPaths::discover().with_explicit(cli.manifest.clone());
    let mut workspace = load_workspace(&paths, &working_dir)?.with_home(cli.home.clone());
    if let Some(policy) = cli.policy {
        workspace.locations.policy = policy;
    }

    debug!(
        manifest = ?workspace.manifest_path,
        units = workspace.tree.len(),
        home = ?workspace.locations.home,
        policy = %workspace.locations.policy,
        "Loaded workspace"
    );

    let unit = select_unit(&workspace.tree, cli.unit.as_deref())?;
    let resolver = workspace.into_resolver();

    let output = match cli.command.unwrap_or(Command::Resolvers) {
        Command::Resolvers => run_resolvers(&resolver, unit, cli.format)?,
        Command::Properties(args) => run_properties(&resolver, unit, &args, cli.format)?,
        Command::Get(args) => run_get(&resolver, unit, &args, cli.format)?,
        Command::Exists(args) => run_exists(&resolver, unit, &args, cli.format)?,
        Command::Migrate(args) => {
            run_migrate(&args, resolver.units(), resolver.defaults().locations())?;
            return Ok(());
        }
    };

    if output.text.ends_with('\n') {
        print!("{}", output.text);
    } else {
        println!("{}", output.text);
    }

    if !output.success {
        std::process::exit(1);
    }
    Ok(())
}
