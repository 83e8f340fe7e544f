//! Stratum CLI - build orchestration for C-family and Fortran projects

use anyhow::Result;
use clap::Parser;
use miette::Diagnostic;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Cli, Commands};
use stratum::builder::{Aggregate, BuildError};
use stratum::core::PlanError;

fn main() {
    if let Err(e) = run() {
        eprintln!("error: {:#}", e);
        if let Some(help) = diagnostic_help(&e) {
            eprintln!("help: {}", help);
        }
        std::process::exit(1);
    }
}

fn diagnostic_help(e: &anyhow::Error) -> Option<String> {
    let help = if let Some(plan) = e.downcast_ref::<PlanError>() {
        plan.help()
    } else if let Some(build) = e.downcast_ref::<BuildError>() {
        build.help()
    } else {
        None
    };
    help.map(|h| h.to_string())
}

fn run() -> Result<()> {
    // Parse CLI
    let cli = Cli::parse();

    // Set up logging
    let filter = if cli.global.verbose {
        EnvFilter::new("stratum=debug")
    } else {
        EnvFilter::new("stratum=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    let global = &cli.global;

    // Execute command
    match cli.command {
        Commands::BuildAll => commands::build::execute_aggregate(global, Aggregate::All),
        Commands::BuildLibraries => commands::build::execute_aggregate(global, Aggregate::Libraries),
        Commands::BuildPrograms => commands::build::execute_aggregate(global, Aggregate::Programs),
        Commands::BuildTests => commands::build::execute_aggregate(global, Aggregate::TestPrograms),
        Commands::BuildGenerated => commands::build::execute_aggregate(global, Aggregate::Generated),
        Commands::Build(args) => commands::build::execute(global, args),
        Commands::Install(args) => commands::install::execute(global, args),
        Commands::InstallBin(args) => commands::install::execute_bin(global, args),
        Commands::InstallLib(args) => commands::install::execute_lib(global, args),
        Commands::InstallInclude(args) => commands::install::execute_include(global, args),
        Commands::Package(args) => commands::package::execute(global, args),
        Commands::Clean => commands::clean::execute(global),
        Commands::Report(args) => commands::report::execute(global, args),
    }
}
