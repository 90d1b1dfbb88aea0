use crate::config::ClientConfig;
use crate::connection::Connection;
use crate::handler::PacketHandler;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use strata_common::Result;
use strata_logger::Logger;
use strata_world::World;

/// Game-tick thread applying the world's queued events.
struct Ticker {
    running: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

impl Ticker {
    fn start(world: Arc<World>, interval: Duration) -> Self {
        let running = Arc::new(AtomicBool::new(true));
        let flag = running.clone();
        let handle = thread::spawn(move || {
            while flag.load(Ordering::SeqCst) {
                thread::sleep(interval);
                let updates = world.process_batch(None);
                if !updates.is_empty() {
                    world
                        .logger()
                        .debug(&format!("Applied {} world updates", updates.len()));
                }
            }
            world.process_batch(None);
        });
        Ticker { running, handle }
    }

    fn stop(self, logger: &dyn Logger) {
        self.running.store(false, Ordering::SeqCst);
        if self.handle.join().is_err() {
            logger.error("Tick thread panicked");
        }
    }
}

/// Builds a world, connects, logs in and streams the world until the
/// server disconnects. Returns the world as it was left.
pub async fn run(config: &ClientConfig, logger: Arc<dyn Logger>) -> Result<Arc<World>> {
    let registry = Arc::new(config.load_registry()?);
    let world = Arc::new(World::new(registry.clone(), logger.clone()));
    if config.batching {
        world.enable_batching();
    }

    let ticker = Ticker::start(world.clone(), config.tick_interval());
    let result = async {
        let mut connection = Connection::connect(&config.address(), registry, logger.clone()).await?;
        connection.login(config).await?;
        let handler = PacketHandler::new(world.clone(), config.max_consecutive_decode_failures);
        connection.run(handler).await
    }
    .await;
    ticker.stop(logger.as_ref());

    result.map(|_| world)
}
