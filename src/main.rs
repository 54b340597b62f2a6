mod cli;
mod commands;
mod config;
mod progress;
mod ui;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use cli::{Cli, Command};
use commands::lifecycle::Lifecycle;
use std::io;

/// Global context for the application
pub struct Context {
    pub verbose: u8,
    pub quiet: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.debug {
        log::LevelFilter::Trace
    } else if cli.quiet {
        log::LevelFilter::Error
    } else {
        match cli.verbose {
            0 => log::LevelFilter::Info,
            1 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    };

    env_logger::Builder::new()
        .filter_level(log_level)
        .format_timestamp(None)
        .init();

    let ctx = Context {
        verbose: cli.verbose,
        quiet: cli.quiet,
    };

    match cli.command {
        Command::Cluster(args) => commands::cluster::run(&ctx, args),
        Command::Channels(args) => commands::channels::run(&ctx, args),
        Command::Create(args) => commands::lifecycle::run(&ctx, Lifecycle::Create, args),
        Command::Update(args) => commands::lifecycle::run(&ctx, Lifecycle::Update, args),
        Command::Delete(args) => commands::lifecycle::run(&ctx, Lifecycle::Delete, args),
        Command::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "wk", &mut io::stdout());
            Ok(())
        }
        Command::EditCluster(args) => commands::edit::cluster(args),
        Command::EditInstanceGroup(args) => commands::edit::instance_group(args),
    }
}
