use crate::buffer::PacketBuffer;
use crate::error::DecodeError;
use crate::packet::{ClientboundPacket, DecodeContext, Packet};
use byteorder::BigEndian;
use std::io;

/// World age and time of day in ticks. A negative time of day means the
/// daylight cycle is stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeUpdatePacket {
    pub world_age: i64,
    pub time_of_day: i64,
}

impl Packet for TimeUpdatePacket {
    fn packet_id() -> i32 {
        0x4E
    }

    fn write_to_buffer(&self, buffer: &mut PacketBuffer) -> io::Result<()> {
        buffer.write_i64::<BigEndian>(self.world_age);
        buffer.write_i64::<BigEndian>(self.time_of_day);
        Ok(())
    }
}

impl ClientboundPacket for TimeUpdatePacket {
    fn read_from_buffer(
        buffer: &mut PacketBuffer,
        _context: &DecodeContext<'_>,
    ) -> Result<Self, DecodeError> {
        Ok(TimeUpdatePacket {
            world_age: buffer.read_i64::<BigEndian>()?,
            time_of_day: buffer.read_i64::<BigEndian>()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packet::{decode_packet, encode_packet};
    use strata_logger::NullLogger;
    use strata_world::BlockRegistry;

    #[test]
    fn test_time_update() {
        let registry = BlockRegistry::new();
        let context = DecodeContext::new(&registry, &NullLogger);
        let packet = TimeUpdatePacket {
            world_age: 123456,
            time_of_day: -6000,
        };

        let bytes = encode_packet(&packet).unwrap();
        assert_eq!(bytes.len(), 17);
        assert_eq!(decode_packet::<TimeUpdatePacket>(bytes, &context).unwrap(), packet);
    }
}
