pub mod capture;
pub mod cli;
pub mod models;
pub mod notify;
pub mod paths;
pub mod quotes;
pub mod scheduler;
pub mod sensing;
pub mod settings;
pub mod store;
pub mod utils;

use clap::Parser;
use log::error;

use cli::Cli;
use paths::AppPaths;

pub fn run() {
    // Initialize logging (reads RUST_LOG env var)
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    if let Err(err) = dotenvy::dotenv() {
        log::debug!("No .env loaded: {err}");
    }

    let cli = Cli::parse();

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => {
            error!("Failed to start async runtime: {err}");
            std::process::exit(1);
        }
    };

    if let Err(err) = runtime.block_on(cli::execute(cli, AppPaths::resolve())) {
        error!("{err:#}");
        std::process::exit(1);
    }
}
