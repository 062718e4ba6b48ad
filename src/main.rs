mod config;
mod db;
mod lookup;
mod server;
mod types;

use config::Config;
use env_logger::Env;
use log::{error, info};

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    info!("Starting plate-lookup");

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };
    if let Err(e) = server::run(config).await {
        error!("Server failed: {}", e);
        std::process::exit(1);
    }
    info!("Exiting main");
}
