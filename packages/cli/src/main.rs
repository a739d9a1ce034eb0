mod commands;
mod config;

use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::{
    blocks, edit, init, lessons, pages, BlocksArgs, EditArgs, InitArgs, LessonsArgs, PagesArgs,
};

/// Lessonkit CLI - block-based lesson editing from the terminal
#[derive(Parser, Debug)]
#[command(name = "lessonkit")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Initialize a new Lessonkit project
    Init(InitArgs),

    /// List available block types
    Blocks(BlocksArgs),

    /// Show how a lesson splits into pages
    Pages(PagesArgs),

    /// Apply a list of operations to a lesson and save it
    Edit(EditArgs),

    /// List lessons or a course outline
    Lessons(LessonsArgs),
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    let cwd = match std::env::current_dir() {
        Ok(dir) => dir.display().to_string(),
        Err(err) => {
            eprintln!("{} cannot read current directory: {}", "Error:".red().bold(), err);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Command::Init(args) => init(args, &cwd).await,
        Command::Blocks(args) => blocks(args),
        Command::Pages(args) => pages(args, &cwd).await,
        Command::Edit(args) => edit(args, &cwd).await,
        Command::Lessons(args) => lessons(args, &cwd).await,
    };

    if let Err(err) = result {
        eprintln!();
        eprintln!("{} {:#}", "Error:".red().bold(), err);
        eprintln!();
        std::process::exit(1);
    }
}
