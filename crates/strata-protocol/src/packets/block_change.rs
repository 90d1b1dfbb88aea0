use crate::buffer::PacketBuffer;
use crate::error::DecodeError;
use crate::packet::{ClientboundPacket, DecodeContext, Packet};
use byteorder::BigEndian;
use std::io;
use strata_common::{BlockPosition, ChunkPosition};
use strata_world::BlockId;

/// One block replaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockChangePacket {
    pub position: BlockPosition,
    pub block_id: BlockId,
}

impl Packet for BlockChangePacket {
    fn packet_id() -> i32 {
        0x0B
    }

    fn write_to_buffer(&self, buffer: &mut PacketBuffer) -> io::Result<()> {
        buffer.write_block_position(self.position);
        buffer.write_varint(self.block_id as i32);
        Ok(())
    }
}

impl ClientboundPacket for BlockChangePacket {
    fn read_from_buffer(
        buffer: &mut PacketBuffer,
        _context: &DecodeContext<'_>,
    ) -> Result<Self, DecodeError> {
        Ok(BlockChangePacket {
            position: buffer.read_block_position()?,
            block_id: buffer.read_varint()? as BlockId,
        })
    }
}

/// Several blocks replaced within one chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultiBlockChangePacket {
    pub chunk: ChunkPosition,
    /// World positions.
    pub changes: Vec<(BlockPosition, BlockId)>,
}

impl Packet for MultiBlockChangePacket {
    fn packet_id() -> i32 {
        0x0F
    }

    fn write_to_buffer(&self, buffer: &mut PacketBuffer) -> io::Result<()> {
        buffer.write_i32::<BigEndian>(self.chunk.x);
        buffer.write_i32::<BigEndian>(self.chunk.z);
        buffer.write_varint(self.changes.len() as i32);
        for (position, block_id) in &self.changes {
            let relative = position.relative_to_chunk();
            buffer.write_u8(((relative.x << 4) | relative.z) as u8);
            buffer.write_u8(position.y as u8);
            buffer.write_varint(*block_id as i32);
        }
        Ok(())
    }
}

impl ClientboundPacket for MultiBlockChangePacket {
    fn read_from_buffer(
        buffer: &mut PacketBuffer,
        _context: &DecodeContext<'_>,
    ) -> Result<Self, DecodeError> {
        let chunk = ChunkPosition::new(
            buffer.read_i32::<BigEndian>()?,
            buffer.read_i32::<BigEndian>()?,
        );
        let count = buffer.read_length()?;

        let mut changes = Vec::new();
        for _ in 0..count {
            let horizontal = buffer.read_u8()? as i32;
            let y = buffer.read_u8()? as i32;
            let block_id = buffer.read_varint()? as BlockId;
            let relative = BlockPosition::new(horizontal >> 4, y, horizontal & 0x0F);
            changes.push((chunk.block_position(relative), block_id));
        }

        Ok(MultiBlockChangePacket { chunk, changes })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::BufferError;
    use crate::packet::{decode_packet, encode_packet};
    use assert_matches::assert_matches;
    use strata_logger::NullLogger;
    use strata_world::BlockRegistry;

    #[test]
    fn test_block_change() {
        let registry = BlockRegistry::new();
        let context = DecodeContext::new(&registry, &NullLogger);
        let packet = BlockChangePacket {
            position: BlockPosition::new(-20, 70, 300),
            block_id: 1342,
        };

        let bytes = encode_packet(&packet).unwrap();
        assert_eq!(bytes[0], 0x0B);
        assert_eq!(decode_packet::<BlockChangePacket>(bytes, &context).unwrap(), packet);
    }

    #[test]
    fn test_multi_block_change_positions() {
        let registry = BlockRegistry::new();
        let context = DecodeContext::new(&registry, &NullLogger);

        let mut buffer = PacketBuffer::new();
        buffer.write_i32::<BigEndian>(-2);
        buffer.write_i32::<BigEndian>(3);
        buffer.write_varint(2);
        buffer.write_u8(0x1F);
        buffer.write_u8(64);
        buffer.write_varint(5);
        buffer.write_u8(0x00);
        buffer.write_u8(255);
        buffer.write_varint(0);

        let packet = MultiBlockChangePacket::read_from_buffer(&mut buffer, &context).unwrap();
        assert_eq!(packet.chunk, ChunkPosition::new(-2, 3));
        assert_eq!(
            packet.changes,
            vec![
                (BlockPosition::new(-31, 64, 63), 5),
                (BlockPosition::new(-32, 255, 48), 0),
            ]
        );

        let bytes = encode_packet(&packet).unwrap();
        assert_eq!(decode_packet::<MultiBlockChangePacket>(bytes, &context).unwrap(), packet);
    }

    #[test]
    fn test_multi_block_change_truncated() {
        let registry = BlockRegistry::new();
        let context = DecodeContext::new(&registry, &NullLogger);

        let mut buffer = PacketBuffer::new();
        buffer.write_i32::<BigEndian>(0);
        buffer.write_i32::<BigEndian>(0);
        buffer.write_varint(3);
        buffer.write_u8(0);

        assert_matches!(
            MultiBlockChangePacket::read_from_buffer(&mut buffer, &context),
            Err(DecodeError::Buffer(BufferError::OutOfBounds { .. }))
        );
    }
}
