use crate::block::{BlockId, BlockRegistry, AIR};
use crate::error::ChunkError;
use crate::heightmap::HeightMap;
use crate::lighting::{ChunkLighting, ChunkLightingUpdateData, LightLevel};
use crate::section::{Section, SECTION_HEIGHT};
use strata_common::BlockPosition;
use strata_nbt::Compound;

pub const NUM_SECTIONS: usize = 16;
pub const CHUNK_WIDTH: i32 = 16;
pub const CHUNK_HEIGHT: i32 = (NUM_SECTIONS * SECTION_HEIGHT) as i32;
pub const NUM_BIOMES: usize = 1024;

/// Extra data attached to a block, such as a chest's contents.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockEntity {
    /// World coordinates.
    pub position: BlockPosition,
    pub identifier: String,
    pub nbt: Compound,
}

/// Section replacements from a chunk packet that does not carry a full
/// chunk. Sections not listed are left as they are.
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkUpdate {
    pub sections: Vec<(usize, Section)>,
    pub heightmap: HeightMap,
    pub block_entities: Vec<BlockEntity>,
}

/// A 16x256x16 column of blocks. All positions taken by its methods are
/// relative to the chunk.
#[derive(Debug, Clone)]
pub struct Chunk {
    sections: Vec<Section>,
    heightmap: HeightMap,
    block_entities: Vec<BlockEntity>,
    biomes: Vec<i32>,
    lighting: ChunkLighting,
}

impl Default for Chunk {
    fn default() -> Self {
        Chunk {
            sections: vec![Section::empty(); NUM_SECTIONS],
            heightmap: HeightMap::default(),
            block_entities: Vec::new(),
            biomes: vec![0; NUM_BIOMES],
            lighting: ChunkLighting::new(),
        }
    }
}

impl Chunk {
    /// # Panics
    ///
    /// If `sections` does not hold exactly 16 sections.
    pub fn new(
        sections: Vec<Section>,
        heightmap: HeightMap,
        biomes: Vec<i32>,
        block_entities: Vec<BlockEntity>,
    ) -> Self {
        assert_eq!(sections.len(), NUM_SECTIONS, "a chunk holds exactly 16 sections");
        Chunk {
            sections,
            heightmap,
            block_entities,
            biomes,
            lighting: ChunkLighting::new(),
        }
    }

    pub fn is_valid_position(position: BlockPosition) -> bool {
        (0..CHUNK_WIDTH).contains(&position.x)
            && (0..CHUNK_HEIGHT).contains(&position.y)
            && (0..CHUNK_WIDTH).contains(&position.z)
    }

    /// Air for positions outside the chunk.
    pub fn block_id(&self, position: BlockPosition) -> BlockId {
        if !Self::is_valid_position(position) {
            return AIR;
        }
        self.sections[position.section_index() as usize].block_id_at(position)
    }

    /// Places a block and updates the height map. Returns the id that was
    /// replaced.
    pub fn set_block_id(
        &mut self,
        position: BlockPosition,
        id: BlockId,
        registry: &BlockRegistry,
    ) -> Result<BlockId, ChunkError> {
        if !Self::is_valid_position(position) {
            return Err(ChunkError::PositionOutOfRange(position));
        }

        let section = &mut self.sections[position.section_index() as usize];
        let previous = section.set_block_id(position.section_block_index(), id, registry);
        self.heightmap
            .handle_block_update(position, &self.sections, registry);
        Ok(previous)
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn section(&self, index: usize) -> Option<&Section> {
        self.sections.get(index)
    }

    pub fn non_empty_section_count(&self) -> usize {
        self.sections.iter().filter(|s| !s.is_empty()).count()
    }

    pub fn heightmap(&self) -> &HeightMap {
        &self.heightmap
    }

    /// Biome of the 4x4x4 cell containing `position`, if the chunk has
    /// biome data.
    pub fn biome_id(&self, position: BlockPosition) -> Option<i32> {
        if !Self::is_valid_position(position) {
            return None;
        }
        self.biomes.get(position.biome_index()).copied()
    }

    pub fn block_entities(&self) -> &[BlockEntity] {
        &self.block_entities
    }

    /// Looks up a block entity by world position.
    pub fn block_entity(&self, position: BlockPosition) -> Option<&BlockEntity> {
        self.block_entities.iter().find(|e| e.position == position)
    }

    pub fn lighting(&self) -> &ChunkLighting {
        &self.lighting
    }

    pub fn lighting_mut(&mut self) -> &mut ChunkLighting {
        &mut self.lighting
    }

    pub fn update_lighting(&mut self, data: &ChunkLightingUpdateData) {
        self.lighting.update(data);
    }

    pub fn is_lit(&self) -> bool {
        self.lighting.is_populated()
    }

    pub fn light_level(&self, position: BlockPosition) -> LightLevel {
        self.lighting.light_level(position)
    }

    /// Applies a partial chunk packet: listed sections, the height map and
    /// the block entities are replaced.
    pub fn apply_update(&mut self, update: ChunkUpdate) {
        for (index, section) in update.sections {
            if let Some(slot) = self.sections.get_mut(index) {
                *slot = section;
            }
        }
        self.heightmap = update.heightmap;
        self.block_entities = update.block_entities;
    }
}
