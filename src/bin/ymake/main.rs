//! ymake CLI - a parallel, incremental build orchestrator for C and C++

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Cli, Commands};
use ymake::frontend::FrontendError;

fn main() {
    let cli = Cli::parse();

    if cli.no_color {
        let _ = miette::set_hook(Box::new(|_| {
            Box::new(miette::MietteHandlerOpts::new().color(false).build())
        }));
    }

    if let Err(e) = run(cli) {
        match e.downcast::<FrontendError>() {
            Ok(parse_error) => eprintln!("{:?}", miette::Report::new(parse_error)),
            Err(e) => eprintln!("error: {:#}", e),
        }
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let filter = if cli.verbose {
        EnvFilter::new("ymake=debug")
    } else {
        EnvFilter::new("ymake=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(!cli.no_color)
        .with_writer(std::io::stderr)
        .without_time()
        .init();

    let global = commands::GlobalArgs {
        file: cli.file,
        verbose: cli.verbose,
    };

    match cli.command {
        Commands::Build(args) => commands::build::execute(&global, args),
        Commands::Flags(args) => commands::flags::execute(&global, args),
        Commands::Task(args) => commands::task::execute(&global, args),
        Commands::Clean(args) => commands::clean::execute(&global, args),
        Commands::Completions(args) => commands::completions::execute(args),
    }
}
