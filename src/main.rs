use anyhow::Result;
use tracing::{error, info};

use crawl_scheduler::cli;
use crawl_scheduler::utils::logging;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = cli::parse_args();

    // Initialize logging
    logging::init_logging(args.verbose, args.log_file.clone())?;

    info!("Starting crawl scheduler v{}", env!("CARGO_PKG_VERSION"));

    // Process commands
    match cli::process_command(args).await {
        Ok(_) => {
            info!("Command completed successfully");
            Ok(())
        }
        Err(e) => {
            error!("Command failed: {}", e);
            Err(e)
        }
    }
}
