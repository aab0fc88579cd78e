pub mod commands;
pub mod config;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to a configuration file (defaults to the user config dir)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Use the priority-tiered scheduler instead of plain FIFO
    #[arg(short, long, global = true)]
    pub priority_queue: bool,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Write logs to a file as well as stderr
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Push a request onto a task's queue
    Push {
        /// Task identifier namespacing the queue
        #[arg(required = true)]
        task: String,

        /// URL to enqueue
        #[arg(required = true)]
        url: String,

        /// Priority tier (positive = high, negative = low)
        #[arg(short = 'P', long, default_value_t = 0)]
        priority: i64,

        /// Crawl depth to record on the request
        #[arg(short, long, default_value_t = 0)]
        depth: u32,

        /// Request header as name=value (repeatable)
        #[arg(short = 'H', long = "header")]
        headers: Vec<String>,

        /// Cookie as name=value (repeatable)
        #[arg(long = "cookie")]
        cookies: Vec<String>,

        /// HTTP method override
        #[arg(short, long)]
        method: Option<String>,
    },

    /// Poll the next request for a task
    Poll {
        /// Task identifier to poll from
        #[arg(required = true)]
        task: String,
    },

    /// Show pending and total request counts for a task
    Status {
        /// Task identifier to inspect
        #[arg(required = true)]
        task: String,
    },

    /// Clear a task's duplicate-check set
    Reset {
        /// Task identifier to reset
        #[arg(required = true)]
        task: String,
    },
}

/// Parse command line arguments
pub fn parse_args() -> Cli {
    Cli::parse()
}

/// Process the command
pub async fn process_command(cli: Cli) -> Result<()> {
    let config = commands::load_config(cli.config.as_deref())?;
    let priority = cli.priority_queue;

    match cli.command {
        Commands::Push {
            task,
            url,
            priority: request_priority,
            depth,
            headers,
            cookies,
            method,
        } => {
            info!("Pushing {} for task {}", url, task);
            commands::push(
                &config,
                priority,
                &task,
                &url,
                request_priority,
                depth,
                &headers,
                &cookies,
                method,
            )
            .await
        }
        Commands::Poll { task } => {
            info!("Polling next request for task {}", task);
            commands::poll(&config, priority, &task).await
        }
        Commands::Status { task } => commands::status(&config, priority, &task).await,
        Commands::Reset { task } => {
            info!("Resetting duplicate check for task {}", task);
            commands::reset(&config, priority, &task).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert()
    }
}
