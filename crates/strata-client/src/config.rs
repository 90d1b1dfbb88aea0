use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use strata_common::{Result, StrataError};
use strata_logger::LogSeverity;
use strata_protocol::packets::PROTOCOL_VERSION;
use strata_world::BlockRegistry;

/// Client settings, read from a JSON file. Missing fields take their
/// default.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub protocol_version: i32,
    /// Queue world mutations and apply them once per tick.
    pub batching: bool,
    pub tick_interval_ms: u64,
    /// Packets in a row that may fail to decode before the connection is
    /// treated as broken.
    pub max_consecutive_decode_failures: u32,
    pub log_level: LogSeverity,
    /// JSON block registry. Without one every non-air block is opaque.
    pub block_registry: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            host: "127.0.0.1".to_string(),
            port: 25565,
            username: "Player".to_string(),
            protocol_version: PROTOCOL_VERSION,
            batching: true,
            tick_interval_ms: 50,
            max_consecutive_decode_failures: 16,
            log_level: LogSeverity::Info,
            block_registry: None,
        }
    }
}

impl ClientConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|err| StrataError::ConfigError(format!("Invalid config: {}", err)))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path).map_err(|err| {
            StrataError::ConfigError(format!("Failed to read {}: {}", path.display(), err))
        })?;
        Self::from_json(&json)
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn load_registry(&self) -> Result<BlockRegistry> {
        let path = match &self.block_registry {
            Some(path) => path,
            None => return Ok(BlockRegistry::new()),
        };
        let json = fs::read_to_string(path).map_err(|err| {
            StrataError::ConfigError(format!("Failed to read {}: {}", path.display(), err))
        })?;
        BlockRegistry::from_json(&json).map_err(|err| {
            StrataError::ConfigError(format!("Invalid block registry {}: {}", path.display(), err))
        })
    }
}
