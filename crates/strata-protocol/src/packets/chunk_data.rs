use crate::buffer::PacketBuffer;
use crate::error::DecodeError;
use crate::packet::{ClientboundPacket, DecodeContext, Packet};
use byteorder::BigEndian;
use std::io;
use strata_common::{BlockPosition, ChunkPosition};
use strata_nbt::{Compound, CompoundExt, NbtError, Tag};
use strata_world::chunk::NUM_BIOMES;
use strata_world::packed;
use strata_world::section::{MAX_INDIRECT_BITS, SECTION_VOLUME};
use strata_world::{
    BlockEntity, BlockId, Chunk, ChunkUpdate, HeightMap, Section, AIR, NUM_SECTIONS,
};

const MOTION_BLOCKING: &str = "MOTION_BLOCKING";
const MIN_INDIRECT_BITS: u8 = 4;
const DIRECT_BITS: u8 = 15;

/// Blocks, biomes and block entities for one chunk column.
///
/// Decoding expands every section present in the payload, so the result can
/// be installed into the world without further work.
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkDataPacket {
    pub position: ChunkPosition,
    /// Whether the packet carries the whole column. A partial packet only
    /// replaces the sections it lists.
    pub full_chunk: bool,
    pub ignore_old_data: bool,
    pub heightmap: HeightMap,
    /// 1024 biome ids, present for full chunks only.
    pub biomes: Option<Vec<i32>>,
    /// Present sections, by index, in ascending order.
    pub sections: Vec<(usize, Section)>,
    pub block_entities: Vec<BlockEntity>,
    /// Blocks that referenced an index outside their section's palette.
    pub palette_misses: usize,
}

impl ChunkDataPacket {
    /// One bit per present section.
    pub fn primary_bit_mask(&self) -> i32 {
        self.sections
            .iter()
            .fold(0, |mask, (index, _)| mask | (1 << index))
    }

    /// All 16 sections, empty where the packet had none.
    fn all_sections(sections: &[(usize, Section)]) -> Vec<Section> {
        let mut all = vec![Section::empty(); NUM_SECTIONS];
        for (index, section) in sections {
            all[*index] = section.clone();
        }
        all
    }

    pub fn into_chunk(self) -> Chunk {
        let sections = Self::all_sections(&self.sections);
        Chunk::new(
            sections,
            self.heightmap,
            self.biomes.unwrap_or_default(),
            self.block_entities,
        )
    }

    pub fn into_update(self) -> ChunkUpdate {
        ChunkUpdate {
            sections: self.sections,
            heightmap: self.heightmap,
            block_entities: self.block_entities,
        }
    }
}

fn read_section(
    data: &mut PacketBuffer,
    index: usize,
    context: &DecodeContext<'_>,
) -> Result<(Section, usize), DecodeError> {
    let block_count = data.read_i16::<BigEndian>()?;
    let bits_per_block = data.read_u8()?;

    let palette = if bits_per_block <= MAX_INDIRECT_BITS {
        let length = data.read_length()?;
        let palette = (0..length)
            .map(|_| data.read_varint().map(|id| id as BlockId))
            .collect::<Result<Vec<_>, _>>()?;
        Some(palette)
    } else {
        None
    };

    let long_count = data.read_length()?;
    let longs = data.read_long_array(long_count)?;
    let decoded = Section::decode(
        bits_per_block,
        palette.as_deref(),
        &longs,
        context.registry,
        context.logger,
    )?;

    if decoded.section.block_count() as i32 != block_count as i32 {
        context.logger.debug(&format!(
            "Section {} claims {} blocks, counted {}",
            index,
            block_count,
            decoded.section.block_count()
        ));
    }
    Ok((decoded.section, decoded.palette_misses))
}

fn block_entity_from_nbt(nbt: Compound) -> Result<BlockEntity, NbtError> {
    let position = BlockPosition::new(nbt.get_int("x")?, nbt.get_int("y")?, nbt.get_int("z")?);
    let identifier = nbt.get_string("id")?.to_string();
    Ok(BlockEntity {
        position,
        identifier,
        nbt,
    })
}

fn read_block_entities(
    buffer: &mut PacketBuffer,
    context: &DecodeContext<'_>,
) -> Result<Vec<BlockEntity>, DecodeError> {
    let count = buffer.read_length()?;
    let mut block_entities = Vec::new();

    for read in 0..count {
        let nbt = match buffer.read_nbt() {
            Ok((_, nbt)) => nbt,
            Err(err) => {
                context.logger.warning(&format!(
                    "Stopped reading block entities after {} of {}: {}",
                    read, count, err
                ));
                break;
            }
        };

        match block_entity_from_nbt(nbt) {
            Ok(block_entity) => block_entities.push(block_entity),
            Err(err) => context
                .logger
                .warning(&format!("Skipping block entity: {}", err)),
        }
    }
    Ok(block_entities)
}

fn palette_for(blocks: &[BlockId]) -> Vec<BlockId> {
    let mut palette = Vec::new();
    for block in blocks {
        if !palette.contains(block) {
            palette.push(*block);
        }
    }
    palette
}

fn bits_for(palette_length: usize) -> u8 {
    let needed = (usize::BITS - palette_length.saturating_sub(1).leading_zeros()) as u8;
    if needed <= MAX_INDIRECT_BITS {
        needed.max(MIN_INDIRECT_BITS)
    } else {
        DIRECT_BITS
    }
}

fn write_section(data: &mut PacketBuffer, section: &Section) {
    let air = [AIR; SECTION_VOLUME];
    let blocks = section.block_ids().unwrap_or(&air);
    let palette = palette_for(blocks);
    let bits = bits_for(palette.len());

    data.write_i16::<BigEndian>(section.block_count() as i16);
    data.write_u8(bits);

    let entries: Vec<u32> = if bits <= MAX_INDIRECT_BITS {
        data.write_varint(palette.len() as i32);
        for id in &palette {
            data.write_varint(*id as i32);
        }
        blocks
            .iter()
            .map(|block| palette.iter().position(|id| id == block).unwrap_or(0) as u32)
            .collect()
    } else {
        blocks.to_vec()
    };

    let longs = packed::pack(bits, &entries);
    data.write_varint(longs.len() as i32);
    data.write_long_array(&longs);
}

impl Packet for ChunkDataPacket {
    fn packet_id() -> i32 {
        0x21
    }

    fn write_to_buffer(&self, buffer: &mut PacketBuffer) -> io::Result<()> {
        buffer.write_i32::<BigEndian>(self.position.x);
        buffer.write_i32::<BigEndian>(self.position.z);
        buffer.write_bool(self.full_chunk);
        buffer.write_bool(self.ignore_old_data);
        buffer.write_varint(self.primary_bit_mask());

        let mut heightmaps = Compound::new();
        heightmaps.insert(
            MOTION_BLOCKING.to_string(),
            Tag::LongArray(self.heightmap.to_motion_blocking()),
        );
        buffer
            .write_nbt("", &heightmaps)
            .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))?;

        if self.full_chunk {
            let biomes = self.biomes.clone().unwrap_or_else(|| vec![0; NUM_BIOMES]);
            for biome in biomes.iter().chain(std::iter::repeat(&0)).take(NUM_BIOMES) {
                buffer.write_i32::<BigEndian>(*biome);
            }
        }

        let mut data = PacketBuffer::new();
        for (_, section) in &self.sections {
            write_section(&mut data, section);
        }
        buffer.write_byte_array(data.as_bytes());

        buffer.write_varint(self.block_entities.len() as i32);
        for block_entity in &self.block_entities {
            let mut nbt = block_entity.nbt.clone();
            nbt.insert("x".to_string(), Tag::Int(block_entity.position.x));
            nbt.insert("y".to_string(), Tag::Int(block_entity.position.y));
            nbt.insert("z".to_string(), Tag::Int(block_entity.position.z));
            nbt.insert("id".to_string(), Tag::String(block_entity.identifier.clone()));
            buffer
                .write_nbt("", &nbt)
                .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))?;
        }
        Ok(())
    }
}

impl ClientboundPacket for ChunkDataPacket {
    fn read_from_buffer(
        buffer: &mut PacketBuffer,
        context: &DecodeContext<'_>,
    ) -> Result<Self, DecodeError> {
        let position = ChunkPosition::new(
            buffer.read_i32::<BigEndian>()?,
            buffer.read_i32::<BigEndian>()?,
        );
        let full_chunk = buffer.read_bool()?;
        let ignore_old_data = buffer.read_bool()?;
        let primary_bit_mask = buffer.read_varint()?;
        let (_, heightmaps) = buffer.read_nbt()?;

        let biomes = if full_chunk {
            let biomes = (0..NUM_BIOMES)
                .map(|_| buffer.read_i32::<BigEndian>())
                .collect::<Result<Vec<_>, _>>()?;
            Some(biomes)
        } else {
            None
        };

        let data_length = buffer.read_length()?;
        let mut data = PacketBuffer::from_bytes(buffer.read_bytes(data_length)?);

        let mut sections = Vec::new();
        let mut palette_misses = 0;
        for index in 0..NUM_SECTIONS {
            if primary_bit_mask & (1 << index) == 0 {
                continue;
            }
            let (section, misses) = read_section(&mut data, index, context)?;
            palette_misses += misses;
            sections.push((index, section));
        }

        let heightmap = match heightmaps
            .get_long_array(MOTION_BLOCKING)
            .ok()
            .and_then(HeightMap::from_motion_blocking)
        {
            Some(heightmap) => heightmap,
            None => {
                context.logger.warning(&format!(
                    "Chunk {} has no usable {} height map, recomputing it",
                    position, MOTION_BLOCKING
                ));
                HeightMap::from_sections(&ChunkDataPacket::all_sections(&sections), context.registry)
            }
        };

        let block_entities = read_block_entities(buffer, context)?;

        Ok(ChunkDataPacket {
            position,
            full_chunk,
            ignore_old_data,
            heightmap,
            biomes,
            sections,
            block_entities,
            palette_misses,
        })
    }
}
