//! Distforge CLI - production builds for full-stack JavaScript apps
//!
//! Entry point for the distforge command-line application.

use anyhow::Result;
use clap::Parser;

use distforge::cli::output::{display_error, OutputConfig};
use distforge::cli::Cli;
use distforge::error::DistforgeError;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Apply output configuration globally
    let output_config = OutputConfig::new(cli.quiet, cli.json, cli.verbose);
    output_config.apply_global();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(output_config.log_level().into()),
        )
        .init();

    // Run the command and handle errors
    match cli.run().await {
        Ok(()) => Ok(()),
        Err(e) => {
            display_error(&e);
            let code = e
                .downcast_ref::<DistforgeError>()
                .map_or(1, DistforgeError::exit_code);
            std::process::exit(code);
        }
    }
}
