use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use std::path::PathBuf;

use chatrelay::config::{self, CliOverrides};
use chatrelay::gateway;

#[derive(Parser, Debug)]
#[command(name = "chatrelay")]
#[command(about = "chatrelay - Telegram to GigaChat conversation relay")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to the JSON configuration file (default: ~/.chatrelay/config.json)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the relay and serve Telegram users until interrupted
    Run {
        /// Completion model name
        #[arg(short, long)]
        model: Option<String>,

        /// Directory with the knowledge files appended to the system prompt
        #[arg(long, value_name = "DIR")]
        knowledge_dir: Option<PathBuf>,
    },
    /// Display version information
    Version,
}

pub fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Some(Commands::Run {
            model,
            knowledge_dir,
        }) => {
            config::load_dotenv();
            let overrides = CliOverrides {
                model,
                knowledge_dir,
            };
            let config = config::load_config(overrides, cli.config)?;
            config.validate().context("Cannot start the relay")?;

            let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
            runtime.block_on(gateway::run_gateway(&config))
        }
        Some(Commands::Version) => {
            print_version();
            Ok(())
        }
        None => {
            Cli::command().print_help()?;
            println!();
            Ok(())
        }
    }
}

fn print_version() {
    println!("chatrelay {}", env!("CARGO_PKG_VERSION"));
}
