//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Stratum - build orchestration for multi-module C-family and Fortran projects
#[derive(Parser)]
#[command(name = "stratum")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Options shared by every command.
#[derive(Args, Clone, Debug)]
pub struct GlobalArgs {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Number of parallel jobs
    #[arg(short, long, global = true, env = "STRATUM_JOBS")]
    pub jobs: Option<usize>,

    /// Path to Stratum.toml (defaults to searching upward from the current directory)
    #[arg(long, global = true)]
    pub manifest_path: Option<PathBuf>,

    /// Build a single module on its own
    #[arg(long, global = true, value_name = "MODULE")]
    pub module: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build libraries, programs and generated files
    BuildAll,

    /// Build every library
    BuildLibraries,

    /// Build every non-test program
    BuildPrograms,

    /// Build every test program
    BuildTests,

    /// Build every generated file
    BuildGenerated,

    /// Build one target: an aggregate, a shorthand name, or a path
    Build(BuildArgs),

    /// Install programs, then run the post-install hook
    Install(InstallArgs),

    /// Install programs into <prefix>/bin
    InstallBin(InstallArgs),

    /// Install static libraries into <prefix>/lib
    InstallLib(InstallArgs),

    /// Install headers into <prefix>/include (not provided)
    InstallInclude(InstallArgs),

    /// Create a source distribution archive next to the project
    Package(PackageArgs),

    /// Remove build outputs
    Clean,

    /// Describe the project plan
    Report(ReportArgs),
}

#[derive(Args)]
pub struct BuildArgs {
    /// Target to build
    pub target: String,
}

#[derive(Args)]
pub struct InstallArgs {
    /// Install prefix (defaults to [install].prefix, then <root>/install)
    #[arg(long)]
    pub prefix: Option<PathBuf>,
}

#[derive(Args)]
pub struct PackageArgs {
    /// Archive tag (defaults to today's date as YYMMDD)
    #[arg(long)]
    pub tag: Option<String>,
}

#[derive(Args)]
pub struct ReportArgs {
    /// Emit JSON instead of text
    #[arg(long)]
    pub json: bool,
}
