use crate::buffer::PacketBuffer;
use crate::error::DecodeError;
use crate::packet::{ClientboundPacket, DecodeContext, Packet};
use byteorder::BigEndian;
use std::io;
use strata_common::ChunkPosition;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnloadChunkPacket {
    pub position: ChunkPosition,
}

impl Packet for UnloadChunkPacket {
    fn packet_id() -> i32 {
        0x1D
    }

    fn write_to_buffer(&self, buffer: &mut PacketBuffer) -> io::Result<()> {
        buffer.write_i32::<BigEndian>(self.position.x);
        buffer.write_i32::<BigEndian>(self.position.z);
        Ok(())
    }
}

impl ClientboundPacket for UnloadChunkPacket {
    fn read_from_buffer(
        buffer: &mut PacketBuffer,
        _context: &DecodeContext<'_>,
    ) -> Result<Self, DecodeError> {
        Ok(UnloadChunkPacket {
            position: ChunkPosition::new(
                buffer.read_i32::<BigEndian>()?,
                buffer.read_i32::<BigEndian>()?,
            ),
        })
    }
}
