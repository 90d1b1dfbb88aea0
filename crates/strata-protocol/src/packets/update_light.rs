use crate::buffer::PacketBuffer;
use crate::error::DecodeError;
use crate::packet::{ClientboundPacket, DecodeContext, Packet};
use std::collections::HashMap;
use std::io;
use strata_common::ChunkPosition;
use strata_world::lighting::{MAX_LIGHT_SECTION, MIN_LIGHT_SECTION};
use strata_world::section::SECTION_VOLUME;
use strata_world::ChunkLightingUpdateData;

/// Bytes in one packed light array, two levels per byte.
pub const LIGHT_ARRAY_LENGTH: usize = SECTION_VOLUME / 2;

/// Sections covered by the light masks, one below and one above the world.
const LIGHT_SECTIONS: i32 = MAX_LIGHT_SECTION - MIN_LIGHT_SECTION + 1;

/// Server-computed light for one chunk.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateLightPacket {
    pub position: ChunkPosition,
    pub data: ChunkLightingUpdateData,
}

fn mask_bit(section: i32) -> i32 {
    1 << (section - MIN_LIGHT_SECTION)
}

fn sections_in(mask: i32) -> impl Iterator<Item = i32> {
    (0..LIGHT_SECTIONS)
        .filter(move |bit| mask & (1 << bit) != 0)
        .map(|bit| bit + MIN_LIGHT_SECTION)
}

fn mask_of<'a>(sections: impl Iterator<Item = &'a i32>) -> i32 {
    sections
        .filter(|section| (MIN_LIGHT_SECTION..=MAX_LIGHT_SECTION).contains(*section))
        .fold(0, |mask, section| mask | mask_bit(*section))
}

/// Expands 2048 bytes into 4096 levels, low nibble first.
pub fn unpack_nibbles(packed: &[u8]) -> Vec<u8> {
    packed
        .iter()
        .flat_map(|byte| [byte & 0x0F, byte >> 4])
        .collect()
}

pub fn pack_nibbles(levels: &[u8]) -> Vec<u8> {
    levels
        .chunks(2)
        .map(|pair| (pair[0] & 0x0F) | (pair.get(1).copied().unwrap_or(0) << 4))
        .collect()
}

fn read_arrays(
    buffer: &mut PacketBuffer,
    mask: i32,
    channel: &str,
) -> Result<HashMap<i32, Vec<u8>>, DecodeError> {
    let mut arrays = HashMap::new();
    for section in sections_in(mask) {
        let length = buffer.read_length()?;
        if length != LIGHT_ARRAY_LENGTH {
            return Err(DecodeError::InvalidData(format!(
                "{} light array for section {} is {} bytes, expected {}",
                channel, section, length, LIGHT_ARRAY_LENGTH
            )));
        }
        arrays.insert(section, unpack_nibbles(&buffer.read_bytes(length)?));
    }
    Ok(arrays)
}

fn write_arrays(buffer: &mut PacketBuffer, arrays: &HashMap<i32, Vec<u8>>) {
    for section in sections_in(mask_of(arrays.keys())) {
        if let Some(levels) = arrays.get(&section) {
            buffer.write_byte_array(&pack_nibbles(levels));
        }
    }
}

impl Packet for UpdateLightPacket {
    fn packet_id() -> i32 {
        0x24
    }

    fn write_to_buffer(&self, buffer: &mut PacketBuffer) -> io::Result<()> {
        let data = &self.data;
        buffer.write_varint(self.position.x);
        buffer.write_varint(self.position.z);
        buffer.write_bool(data.trust_edges);
        buffer.write_varint(mask_of(data.sky_light_arrays.keys()));
        buffer.write_varint(mask_of(data.block_light_arrays.keys()));
        buffer.write_varint(mask_of(data.empty_sky_light_sections.iter()));
        buffer.write_varint(mask_of(data.empty_block_light_sections.iter()));
        write_arrays(buffer, &data.sky_light_arrays);
        write_arrays(buffer, &data.block_light_arrays);
        Ok(())
    }
}

impl ClientboundPacket for UpdateLightPacket {
    fn read_from_buffer(
        buffer: &mut PacketBuffer,
        _context: &DecodeContext<'_>,
    ) -> Result<Self, DecodeError> {
        let position = ChunkPosition::new(buffer.read_varint()?, buffer.read_varint()?);
        let trust_edges = buffer.read_bool()?;
        let sky_light_mask = buffer.read_varint()?;
        let block_light_mask = buffer.read_varint()?;
        let empty_sky_light_mask = buffer.read_varint()?;
        let empty_block_light_mask = buffer.read_varint()?;

        let sky_light_arrays = read_arrays(buffer, sky_light_mask, "Sky")?;
        let block_light_arrays = read_arrays(buffer, block_light_mask, "Block")?;

        Ok(UpdateLightPacket {
            position,
            data: ChunkLightingUpdateData {
                trust_edges,
                empty_sky_light_sections: sections_in(empty_sky_light_mask).collect(),
                empty_block_light_sections: sections_in(empty_block_light_mask).collect(),
                sky_light_arrays,
                block_light_arrays,
            },
        })
    }
}
