use std::sync::Arc;
use strata_common::{Result, StrataError};
use strata_protocol::packets::{
    BlockChangePacket, ChunkDataPacket, KeepAlivePacket, MultiBlockChangePacket,
    TimeUpdatePacket, UnloadChunkPacket, UpdateLightPacket,
};
use strata_protocol::{
    encode_packet, ClientboundPacket, DecodeContext, DecodeError, Frame, Packet, PacketBuffer,
};
use strata_world::World;

/// Turns play-state packets into world mutations.
///
/// Each packet is fully decoded before the world is touched, so the world's
/// lock is only held to install the result.
pub struct PacketHandler {
    world: Arc<World>,
    consecutive_failures: u32,
    max_consecutive_failures: u32,
}

impl PacketHandler {
    /// `max_consecutive_failures` undecodable packets in a row are tolerated;
    /// one more is a connection error.
    pub fn new(world: Arc<World>, max_consecutive_failures: u32) -> Self {
        PacketHandler {
            world,
            consecutive_failures: 0,
            max_consecutive_failures,
        }
    }

    pub fn world(&self) -> &Arc<World> {
        &self.world
    }

    /// Failures since the last packet that decoded.
    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    /// Handles one frame read off the connection. A corrupt frame counts as
    /// a packet that failed to decode.
    pub fn handle_frame(&mut self, frame: Frame) -> Result<Option<Vec<u8>>> {
        match frame {
            Frame::Packet(packet) => self.handle(packet),
            Frame::Corrupt(reason) => {
                self.record_failure(format!("frame: {}", reason))?;
                Ok(None)
            }
        }
    }

    /// Handles one unframed packet and returns the bytes of any packet that
    /// must be sent back. A packet that fails to decode is dropped; only a
    /// run of such failures longer than the configured limit is an error.
    pub fn handle(&mut self, packet: Vec<u8>) -> Result<Option<Vec<u8>>> {
        let mut buffer = PacketBuffer::from_bytes(packet);
        let outcome = match buffer.read_varint() {
            Ok(id) => self
                .dispatch(id, &mut buffer)
                .map_err(|err| format!("packet {:#04x}: {}", id, err)),
            Err(err) => Err(format!("packet id: {}", err)),
        };

        match outcome {
            Ok(response) => {
                self.consecutive_failures = 0;
                Ok(response)
            }
            Err(err) => {
                self.record_failure(err)?;
                Ok(None)
            }
        }
    }

    fn record_failure(&mut self, reason: String) -> Result<()> {
        self.consecutive_failures += 1;
        self.world.diagnostics().record_dropped_packet();
        self.world
            .logger()
            .warning(&format!("Dropping undecodable {}", reason));

        if self.consecutive_failures > self.max_consecutive_failures {
            return Err(StrataError::ConnectionError(format!(
                "{} consecutive packets failed to decode",
                self.consecutive_failures
            )));
        }
        Ok(())
    }

    fn decode<P: ClientboundPacket>(
        &self,
        buffer: &mut PacketBuffer,
    ) -> std::result::Result<P, DecodeError> {
        let context = DecodeContext::new(self.world.registry(), self.world.logger().as_ref());
        P::read_from_buffer(buffer, &context)
    }

    fn dispatch(
        &self,
        id: i32,
        buffer: &mut PacketBuffer,
    ) -> std::result::Result<Option<Vec<u8>>, DecodeError> {
        let world = &self.world;

        if id == ChunkDataPacket::packet_id() {
            let packet: ChunkDataPacket = self.decode(buffer)?;
            if packet.palette_misses > 0 {
                world.diagnostics().record_palette_misses(packet.palette_misses as u64);
            }
            let position = packet.position;
            if packet.full_chunk {
                world.add_chunk(position, packet.into_chunk());
            } else {
                world.update_chunk(position, packet.into_update());
            }
        } else if id == UpdateLightPacket::packet_id() {
            let packet: UpdateLightPacket = self.decode(buffer)?;
            world.update_chunk_lighting(packet.position, packet.data);
        } else if id == BlockChangePacket::packet_id() {
            let packet: BlockChangePacket = self.decode(buffer)?;
            world.set_block_id(packet.position, packet.block_id);
        } else if id == MultiBlockChangePacket::packet_id() {
            let packet: MultiBlockChangePacket = self.decode(buffer)?;
            world.set_blocks(packet.changes);
        } else if id == UnloadChunkPacket::packet_id() {
            let packet: UnloadChunkPacket = self.decode(buffer)?;
            world.remove_chunk(packet.position);
        } else if id == TimeUpdatePacket::packet_id() {
            let packet: TimeUpdatePacket = self.decode(buffer)?;
            world.set_time(packet.world_age, packet.time_of_day);
        } else if id == KeepAlivePacket::packet_id() {
            let packet: KeepAlivePacket = self.decode(buffer)?;
            let response = encode_packet(&packet.response())
                .map_err(|err| DecodeError::InvalidData(err.to_string()))?;
            return Ok(Some(response));
        }
        Ok(None)
    }
}
