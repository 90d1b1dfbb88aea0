//! Packets for protocol 736 (Minecraft 1.16.1).

pub mod block_change;
pub mod chunk_data;
pub mod keep_alive;
pub mod login;
pub mod time_update;
pub mod unload_chunk;
pub mod update_light;

pub use block_change::{BlockChangePacket, MultiBlockChangePacket};
pub use chunk_data::ChunkDataPacket;
pub use keep_alive::{KeepAlivePacket, KeepAliveResponsePacket};
pub use login::{
    HandshakePacket, LoginDisconnectPacket, LoginStartPacket, LoginSuccessPacket, NextState,
    SetCompressionPacket, ENCRYPTION_REQUEST_ID, PROTOCOL_VERSION,
};
pub use time_update::TimeUpdatePacket;
pub use unload_chunk::UnloadChunkPacket;
pub use update_light::UpdateLightPacket;
