mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "charref")]
#[command(about = "Escape and unescape HTML5 character references", long_about = None)]
struct Cli {
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[arg(long, global = true)]
    cache: Option<PathBuf>,

    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    Escape {
        text: Option<String>,

        #[arg(long)]
        named_only: bool,
    },
    Unescape {
        text: Option<String>,
    },
    Names {
        character: char,
    },
    Refresh,
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    let options = commands::LoadOptions {
        config: cli.config,
        cache: cli.cache,
    };

    let result = match cli.command {
        Commands::Escape { text, named_only } => {
            commands::escape(&options, text.as_deref(), named_only)
        }
        Commands::Unescape { text } => commands::unescape(&options, text.as_deref()),
        Commands::Names { character } => commands::names(&options, character),
        Commands::Refresh => commands::refresh(&options),
    };

    if let Err(error) = result {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}
