use crate::buffer::PacketBuffer;
use crate::error::DecodeError;
use crate::packet::{ClientboundPacket, DecodeContext, Packet};
use byteorder::BigEndian;
use std::io;
use uuid::Uuid;

pub const PROTOCOL_VERSION: i32 = 736;

/// State the connection moves to after a handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextState {
    Status = 1,
    Login = 2,
}

/// Handshake packet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandshakePacket {
    pub protocol_version: i32,
    pub server_address: String,
    pub server_port: u16,
    pub next_state: NextState,
}

impl HandshakePacket {
    pub fn login(server_address: &str, server_port: u16) -> Self {
        HandshakePacket {
            protocol_version: PROTOCOL_VERSION,
            server_address: server_address.to_string(),
            server_port,
            next_state: NextState::Login,
        }
    }
}

impl Packet for HandshakePacket {
    fn packet_id() -> i32 {
        0x00
    }

    fn write_to_buffer(&self, buffer: &mut PacketBuffer) -> io::Result<()> {
        buffer.write_varint(self.protocol_version);
        buffer.write_string(&self.server_address);
        buffer.write_u16::<BigEndian>(self.server_port);
        buffer.write_varint(self.next_state as i32);
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginStartPacket {
    pub username: String,
}

impl Packet for LoginStartPacket {
    fn packet_id() -> i32 {
        0x00
    }

    fn write_to_buffer(&self, buffer: &mut PacketBuffer) -> io::Result<()> {
        buffer.write_string(&self.username);
        Ok(())
    }
}

/// The server refused the login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginDisconnectPacket {
    /// JSON chat component.
    pub reason: String,
}

impl Packet for LoginDisconnectPacket {
    fn packet_id() -> i32 {
        0x00
    }

    fn write_to_buffer(&self, buffer: &mut PacketBuffer) -> io::Result<()> {
        buffer.write_string(&self.reason);
        Ok(())
    }
}

impl ClientboundPacket for LoginDisconnectPacket {
    fn read_from_buffer(
        buffer: &mut PacketBuffer,
        _context: &DecodeContext<'_>,
    ) -> Result<Self, DecodeError> {
        Ok(LoginDisconnectPacket {
            reason: buffer.read_string()?,
        })
    }
}

/// Only sent by servers in online mode, which this client does not support.
pub const ENCRYPTION_REQUEST_ID: i32 = 0x01;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginSuccessPacket {
    pub uuid: Uuid,
    pub username: String,
}

impl Packet for LoginSuccessPacket {
    fn packet_id() -> i32 {
        0x02
    }

    fn write_to_buffer(&self, buffer: &mut PacketBuffer) -> io::Result<()> {
        buffer.write_uuid(self.uuid);
        buffer.write_string(&self.username);
        Ok(())
    }
}

impl ClientboundPacket for LoginSuccessPacket {
    fn read_from_buffer(
        buffer: &mut PacketBuffer,
        _context: &DecodeContext<'_>,
    ) -> Result<Self, DecodeError> {
        Ok(LoginSuccessPacket {
            uuid: buffer.read_uuid()?,
            username: buffer.read_string()?,
        })
    }
}

/// Frames from now on carry a data length and are compressed when at least
/// `threshold` bytes long. A negative threshold turns compression off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetCompressionPacket {
    pub threshold: i32,
}

impl Packet for SetCompressionPacket {
    fn packet_id() -> i32 {
        0x03
    }

    fn write_to_buffer(&self, buffer: &mut PacketBuffer) -> io::Result<()> {
        buffer.write_varint(self.threshold);
        Ok(())
    }
}

impl ClientboundPacket for SetCompressionPacket {
    fn read_from_buffer(
        buffer: &mut PacketBuffer,
        _context: &DecodeContext<'_>,
    ) -> Result<Self, DecodeError> {
        Ok(SetCompressionPacket {
            threshold: buffer.read_varint()?,
        })
    }
}
