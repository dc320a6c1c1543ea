//! Syncboard CLI
//!
//! Launcher for the syncboard relay server.
//!
//! # Commands
//!
//! - `serve` - Run the server until Ctrl-C or SIGTERM
//! - `seed` - Print the built-in seed board as JSON

mod commands;

use clap::{Parser, Subcommand};
use commands::serve::ServeArgs;
use tracing_subscriber::EnvFilter;

/// Real-time shared board server.
#[derive(Debug, Parser)]
#[command(name = "syncboard")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run the server
    Serve(ServeArgs),

    /// Print the built-in seed board
    Seed {
        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<std::path::PathBuf>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // RUST_LOG wins over -v
    let level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Serve(args) => {
            let config = args.config();
            let seed = commands::seed::load(args.seed.as_deref())?;
            tokio::runtime::Runtime::new()?.block_on(commands::serve::run(config, seed))?;
        }
        Commands::Seed { output } => {
            commands::seed::print(output.as_deref())?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn serve_flags() {
        let cli = Cli::try_parse_from([
            "syncboard",
            "-v",
            "serve",
            "--port",
            "4100",
            "--origin",
            "https://board.example",
            "--heartbeat-secs",
            "5",
        ])
        .unwrap();

        assert!(cli.verbose);
        let Commands::Serve(args) = cli.command else {
            panic!("expected serve");
        };
        let config = args.config();
        assert_eq!(config.bind_addr.port(), 4100);
        assert_eq!(config.allowed_origin, "https://board.example");
        assert_eq!(config.heartbeat_interval.as_secs(), 5);
    }

    #[test]
    fn seed_subcommand() {
        let cli = Cli::try_parse_from(["syncboard", "seed"]).unwrap();
        assert!(matches!(cli.command, Commands::Seed { output: None }));
    }
}
