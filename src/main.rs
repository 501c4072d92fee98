use anyhow::Result;
use clap::Parser;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use voice_notes::app::logging::init_logging;
use voice_notes::cli::commands::{load_cli_config, run};
use voice_notes::cli::Cli;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = load_cli_config(cli.config.as_deref(), cli.data_dir.as_deref())?;
    init_logging(&config.log_level)?;

    // Ctrl+C stops a running recording instead of killing the process
    let interrupted = Arc::new(AtomicBool::new(false));
    {
        let interrupted = interrupted.clone();
        if let Err(e) = ctrlc::set_handler(move || interrupted.store(true, Ordering::SeqCst)) {
            log::warn!("Failed to install Ctrl+C handler: {}", e);
        }
    }

    run(cli, config, interrupted)
}
