pub mod client;
pub mod config;
pub mod connection;
pub mod handler;

pub use config::ClientConfig;
pub use connection::Connection;
pub use handler::PacketHandler;
