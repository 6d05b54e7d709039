//! Foreground monitor agent.
//!
//! Talks to its controller over stdin/stdout with length-prefixed JSON
//! frames, so all logging goes to stderr.

use appwarden_lib::error::AppError;
use tracing_subscriber::EnvFilter;

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    init_logging();

    match appwarden_lib::run() {
        Ok(()) => log::info!("Controller disconnected, exiting"),
        Err(AppError::Channel(e)) if e.is_eof() => {}
        Err(e) => {
            log::error!("appwarden failed: {e}");
            std::process::exit(1);
        }
    }
}
