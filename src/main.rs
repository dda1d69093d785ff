pub mod capture;
pub mod cli;
pub mod cmd;
pub mod config;
pub mod db;
pub mod dep;
pub mod dns;
pub mod endpoint;
pub mod log;
pub mod matrix;
pub mod output;
pub mod probe;
pub mod scan;
pub mod sys;
pub mod thumbnail;
pub mod util;

use clap::Parser;
use cli::Cli;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(e) = log::init_logger(&cli) {
        eprintln!("Failed to initialize logger: {e:#}");
    }
    tracing::info!(
        "rtspscan v{} scanning {} (ports {})",
        env!("CARGO_PKG_VERSION"),
        cli.scan.address,
        cli.scan.ports
    );
    let started = std::time::Instant::now();
    match cmd::scan::run(cli.scan.clone(), cli.no_stdout, cli.output.clone()).await {
        Ok(()) => tracing::info!("Done in {:?}", started.elapsed()),
        Err(e) => {
            tracing::error!("{:#}", e);
            if cli.no_stdout {
                eprintln!("Error: {e:#}");
            }
            std::process::exit(1);
        }
    }
}
