//! Client-side world streaming for Minecraft 1.16.1: decodes the server's
//! chunk, light and block packets into a shared, lockable world.

pub use strata_client as client;
pub use strata_common as common;
pub use strata_logger as logger;
pub use strata_nbt as nbt;
pub use strata_protocol as protocol;
pub use strata_world as world;

pub use strata_client::ClientConfig;
pub use strata_common::{BlockPosition, ChunkPosition, Result, StrataError};
pub use strata_world::World;
