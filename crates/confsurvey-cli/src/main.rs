//! confsurvey - confidential survey tooling
//!
//! Replays scripted survey sessions against the transparent clear engine,
//! validates configuration files and verifies exported audit logs.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

mod commands;

/// confsurvey - confidential survey tooling
#[derive(Parser, Debug)]
#[command(name = "confsurvey")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Replay a scripted survey session
    Replay(commands::replay::ReplayArgs),

    /// Validate a survey configuration file and print the effective limits
    CheckConfig {
        /// Path to the configuration file
        file: PathBuf,
    },

    /// Verify the hash chain of an exported audit log (JSON lines)
    VerifyLog {
        /// Path to the audit log
        file: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = EnvFilter::try_new(&cli.log_level).unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    match cli.command {
        Commands::Replay(args) => {
            // Step failures under --strict map to a non-zero exit code
            // rather than an error.
            let exit_code = commands::replay::run(&args)?;
            if exit_code != commands::replay::exit_codes::SUCCESS {
                std::process::exit(i32::from(exit_code));
            }
            Ok(())
        },
        Commands::CheckConfig { file } => {
            let rendered = commands::config::check(&file)?;
            print!("{rendered}");
            Ok(())
        },
        Commands::VerifyLog { file } => commands::audit::verify(&file),
    }
}
