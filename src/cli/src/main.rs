//! Autorun CLI entry point.

use clap::Parser;

use autorun_cli::commands::{dispatch, Cli};
use autorun_cli::logging;
use autorun_core::{AutoRunConfig, AutoRunError};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let logging = logging::init();

    let config = match AutoRunConfig::load_with_env(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("autorun: {e}");
            std::process::exit(e.exit_code());
        }
    };
    logging.apply(config.log_level);

    match dispatch(cli, &config).await {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("autorun: {e}");
            if matches!(e, AutoRunError::ConfigError(_)) {
                eprintln!("See 'autorun auto-run --help'.");
            }
            std::process::exit(e.exit_code());
        }
    }
}
