use crate::buffer::PacketBuffer;
use crate::error::DecodeError;
use crate::packet::{ClientboundPacket, DecodeContext, Packet};
use byteorder::BigEndian;
use std::io;

/// Sent by the server; the client must echo the id back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeepAlivePacket {
    pub keep_alive_id: i64,
}

impl KeepAlivePacket {
    pub fn new(keep_alive_id: i64) -> Self {
        Self { keep_alive_id }
    }

    pub fn response(&self) -> KeepAliveResponsePacket {
        KeepAliveResponsePacket {
            keep_alive_id: self.keep_alive_id,
        }
    }
}

impl Packet for KeepAlivePacket {
    fn packet_id() -> i32 {
        0x20
    }

    fn write_to_buffer(&self, buffer: &mut PacketBuffer) -> io::Result<()> {
        buffer.write_i64::<BigEndian>(self.keep_alive_id);
        Ok(())
    }
}

impl ClientboundPacket for KeepAlivePacket {
    fn read_from_buffer(
        buffer: &mut PacketBuffer,
        _context: &DecodeContext<'_>,
    ) -> Result<Self, DecodeError> {
        Ok(KeepAlivePacket {
            keep_alive_id: buffer.read_i64::<BigEndian>()?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeepAliveResponsePacket {
    pub keep_alive_id: i64,
}

impl Packet for KeepAliveResponsePacket {
    fn packet_id() -> i32 {
        0x10
    }

    fn write_to_buffer(&self, buffer: &mut PacketBuffer) -> io::Result<()> {
        buffer.write_i64::<BigEndian>(self.keep_alive_id);
        Ok(())
    }
}
