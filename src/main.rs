use std::path::Path;
use std::process;
use std::sync::Arc;
use strata::client::{client, ClientConfig};
use strata::logger::LogSeverity::{Fatal, Info};
use strata::logger::{log, ConsoleLogger, Logger};

#[tokio::main]
async fn main() {
    log("Strata init".to_owned(), Info);

    let config = match std::env::args().nth(1) {
        Some(path) => ClientConfig::load(Path::new(&path)),
        None => Ok(ClientConfig::default()),
    };
    let config = match config {
        Ok(config) => config,
        Err(err) => {
            log(err.to_string(), Fatal);
            process::exit(1);
        }
    };

    let logger: Arc<dyn Logger> = Arc::new(ConsoleLogger::new(config.log_level));
    match client::run(&config, logger).await {
        Ok(world) => log(
            format!("Disconnected with {} chunks loaded", world.chunk_count()),
            Info,
        ),
        Err(err) => {
            log(err.to_string(), Fatal);
            process::exit(1);
        }
    }
}
