use crate::buffer::PacketBuffer;
use crate::error::DecodeError;
use std::io;
use strata_logger::Logger;
use strata_world::BlockRegistry;

/// What a decoder needs besides the bytes: the block registry for section
/// expansion and a logger for recoverable oddities in the payload.
#[derive(Clone, Copy)]
pub struct DecodeContext<'a> {
    pub registry: &'a BlockRegistry,
    pub logger: &'a dyn Logger,
}

impl<'a> DecodeContext<'a> {
    pub fn new(registry: &'a BlockRegistry, logger: &'a dyn Logger) -> Self {
        DecodeContext { registry, logger }
    }
}

/// A packet with an id and a body that can be written.
pub trait Packet {
    fn packet_id() -> i32
    where
        Self: Sized;

    /// Writes the body, without the packet id.
    fn write_to_buffer(&self, buffer: &mut PacketBuffer) -> io::Result<()>;
}

/// A packet the server sends and this client reads.
pub trait ClientboundPacket: Packet + Sized {
    /// Reads the body. The packet id has already been consumed.
    fn read_from_buffer(
        buffer: &mut PacketBuffer,
        context: &DecodeContext<'_>,
    ) -> Result<Self, DecodeError>;
}

/// Id followed by body, ready for framing.
pub fn encode_packet<P: Packet>(packet: &P) -> io::Result<Vec<u8>> {
    let mut buffer = PacketBuffer::new();
    buffer.write_varint(P::packet_id());
    packet.write_to_buffer(&mut buffer)?;
    Ok(buffer.into_inner())
}

/// Reads the id from an unframed packet, checks it is `P`'s and decodes
/// the body.
pub fn decode_packet<P: ClientboundPacket>(
    bytes: Vec<u8>,
    context: &DecodeContext<'_>,
) -> Result<P, DecodeError> {
    let mut buffer = PacketBuffer::from_bytes(bytes);
    let id = buffer.read_varint()?;
    if id != P::packet_id() {
        return Err(DecodeError::UnexpectedPacketId {
            expected: P::packet_id(),
            found: id,
        });
    }
    P::read_from_buffer(&mut buffer, context)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use strata_logger::NullLogger;

    #[derive(Debug, PartialEq)]
    struct TestPacket {
        value: i32,
    }

    impl Packet for TestPacket {
        fn packet_id() -> i32 {
            0x42
        }

        fn write_to_buffer(&self, buffer: &mut PacketBuffer) -> io::Result<()> {
            buffer.write_varint(self.value);
            Ok(())
        }
    }

    impl ClientboundPacket for TestPacket {
        fn read_from_buffer(
            buffer: &mut PacketBuffer,
            _context: &DecodeContext<'_>,
        ) -> Result<Self, DecodeError> {
            Ok(TestPacket {
                value: buffer.read_varint()?,
            })
        }
    }

    #[test]
    fn test_encode_and_decode() {
        let registry = BlockRegistry::new();
        let context = DecodeContext::new(&registry, &NullLogger);

        let bytes = encode_packet(&TestPacket { value: 300 }).unwrap();
        assert_eq!(bytes, vec![0x42, 0xAC, 0x02]);
        assert_eq!(
            decode_packet::<TestPacket>(bytes, &context).unwrap(),
            TestPacket { value: 300 }
        );
    }

    #[test]
    fn test_decode_rejects_other_ids() {
        let registry = BlockRegistry::new();
        let context = DecodeContext::new(&registry, &NullLogger);

        assert_matches!(
            decode_packet::<TestPacket>(vec![0x41, 0x00], &context),
            Err(DecodeError::UnexpectedPacketId {
                expected: 0x42,
                found: 0x41
            })
        );
        assert_matches!(
            decode_packet::<TestPacket>(vec![], &context),
            Err(DecodeError::Buffer(_))
        );
    }
}
