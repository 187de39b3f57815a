//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

/// ymake - a parallel, incremental build orchestrator for C and C++
#[derive(Parser)]
#[command(name = "ymake")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Build file to read
    #[arg(short, long, global = true, default_value = "build.ymk")]
    pub file: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build projects
    Build(BuildArgs),

    /// Show the compile and link command lines for a project
    Flags(FlagsArgs),

    /// Run a task and its prerequisites
    Task(TaskArgs),

    /// Remove object files
    Clean(CleanArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum MessageFormat {
    #[default]
    Human,
    Json,
}

#[derive(Args)]
pub struct BuildArgs {
    /// Named configuration to activate (default: tool config, then `debug`)
    #[arg(short, long = "config", value_name = "NAME")]
    pub configuration: Option<String>,

    /// Number of parallel jobs
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Build only these projects and their dependencies
    #[arg(short, long = "project", value_name = "NAME")]
    pub projects: Vec<String>,

    /// Output format for the build report
    #[arg(long, value_enum, default_value_t = MessageFormat::Human)]
    pub message_format: MessageFormat,
}

#[derive(Args)]
pub struct FlagsArgs {
    /// Project to show commands for
    pub project: String,

    /// Named configuration to activate
    #[arg(short, long = "config", value_name = "NAME")]
    pub configuration: Option<String>,

    /// Source file to show the compile command for (default: first source)
    #[arg(long, value_name = "PATH")]
    pub source: Option<PathBuf>,
}

#[derive(Args)]
pub struct TaskArgs {
    /// Task to run
    pub name: String,

    /// Named configuration used for project prerequisites
    #[arg(short, long = "config", value_name = "NAME")]
    pub configuration: Option<String>,
}

#[derive(Args)]
pub struct CleanArgs {
    /// Also remove the build cache
    #[arg(long)]
    pub cache: bool,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}
