//! Wire format for the client side of protocol 736: the packet buffer,
//! framing and the clientbound world packets.

pub mod buffer;
pub mod error;
pub mod frame;
pub mod packet;
pub mod packets;

pub use buffer::{BufferError, PacketBuffer};
pub use error::DecodeError;
pub use frame::{Frame, PacketFrameCodec};
pub use packet::{decode_packet, encode_packet, ClientboundPacket, DecodeContext, Packet};
