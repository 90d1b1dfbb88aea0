use crate::block::{BlockId, AIR};
use crate::chunk::{Chunk, CHUNK_HEIGHT};
use crate::lighting::{
    ChunkLightingUpdateData, LightLevel, DEFAULT_BLOCK_LIGHT_LEVEL, DEFAULT_SKY_LIGHT_LEVEL,
};
use std::collections::HashMap;
use strata_common::{BlockPosition, ChunkPosition};

/// Where [`Terrain::add_chunk`] put a chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkPlacement {
    /// The chunk has light data and is visible. `replaced` is set when it
    /// took the place of a visible chunk.
    Visible { replaced: bool },
    /// Held back until its light data arrives. `hid` is set when a visible
    /// chunk at the same position was dropped for it.
    Unlit { hid: bool },
}

/// What [`Terrain::apply_lighting`] did with a light update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightingOutcome {
    /// Applied to a visible chunk.
    Updated,
    /// Applied to a held chunk, which is now visible.
    Revealed,
    /// No chunk yet; kept until one arrives.
    Deferred,
}

/// Everything the world's terrain lock protects: the visible chunks, chunks
/// still waiting for light, and light data that arrived before its chunk.
///
/// Only visible chunks answer block and light queries. Those accessors take
/// world coordinates.
#[derive(Debug, Default)]
pub struct Terrain {
    chunks: HashMap<ChunkPosition, Chunk>,
    unlit_chunks: HashMap<ChunkPosition, Chunk>,
    chunkless_lighting: HashMap<ChunkPosition, Vec<ChunkLightingUpdateData>>,
}

impl Terrain {
    pub fn new() -> Self {
        Terrain::default()
    }

    /// A visible chunk.
    pub fn chunk(&self, position: ChunkPosition) -> Option<&Chunk> {
        self.chunks.get(&position)
    }

    pub fn chunk_mut(&mut self, position: ChunkPosition) -> Option<&mut Chunk> {
        self.chunks.get_mut(&position)
    }

    /// A chunk held back until its light data arrives.
    pub fn unlit_chunk_mut(&mut self, position: ChunkPosition) -> Option<&mut Chunk> {
        self.unlit_chunks.get_mut(&position)
    }

    pub fn contains_chunk(&self, position: ChunkPosition) -> bool {
        self.chunks.contains_key(&position)
    }

    pub fn is_chunk_unlit(&self, position: ChunkPosition) -> bool {
        self.unlit_chunks.contains_key(&position)
    }

    /// Visible chunks only.
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Applies any light data held for the position, then makes the chunk
    /// visible if it is lit and holds it back otherwise. Either way it
    /// replaces whatever chunk was at the position.
    pub fn add_chunk(&mut self, position: ChunkPosition, mut chunk: Chunk) -> ChunkPlacement {
        if let Some(pending) = self.chunkless_lighting.remove(&position) {
            for data in &pending {
                chunk.update_lighting(data);
            }
        }

        if chunk.is_lit() {
            self.unlit_chunks.remove(&position);
            let replaced = self.chunks.insert(position, chunk).is_some();
            ChunkPlacement::Visible { replaced }
        } else {
            let hid = self.chunks.remove(&position).is_some();
            self.unlit_chunks.insert(position, chunk);
            ChunkPlacement::Unlit { hid }
        }
    }

    /// Applies server light data to the chunk at `position`. A held chunk
    /// becomes visible; without any chunk the data waits for one.
    pub fn apply_lighting(
        &mut self,
        position: ChunkPosition,
        data: ChunkLightingUpdateData,
    ) -> LightingOutcome {
        if let Some(chunk) = self.chunks.get_mut(&position) {
            chunk.update_lighting(&data);
            return LightingOutcome::Updated;
        }

        match self.unlit_chunks.remove(&position) {
            Some(mut chunk) => {
                chunk.update_lighting(&data);
                self.chunks.insert(position, chunk);
                LightingOutcome::Revealed
            }
            None => {
                self.chunkless_lighting.entry(position).or_default().push(data);
                LightingOutcome::Deferred
            }
        }
    }

    /// Drops everything stored for the position. Returns the chunk only if
    /// it was visible.
    pub fn remove_chunk(&mut self, position: ChunkPosition) -> Option<Chunk> {
        self.chunkless_lighting.remove(&position);
        self.unlit_chunks.remove(&position);
        self.chunks.remove(&position)
    }

    /// Whether light data is waiting for a chunk that has not arrived.
    pub fn has_pending_lighting(&self, position: ChunkPosition) -> bool {
        self.chunkless_lighting.contains_key(&position)
    }

    pub fn clear(&mut self) {
        self.chunks.clear();
        self.unlit_chunks.clear();
        self.chunkless_lighting.clear();
    }

    /// Loaded chunk and a y inside the world.
    pub fn is_position_loaded(&self, position: BlockPosition) -> bool {
        (0..CHUNK_HEIGHT).contains(&position.y) && self.contains_chunk(position.chunk())
    }

    /// Air when the chunk is missing.
    pub fn block_id(&self, position: BlockPosition) -> BlockId {
        self.chunk(position.chunk())
            .map(|chunk| chunk.block_id(position.relative_to_chunk()))
            .unwrap_or(AIR)
    }

    /// Height map lookup for the column containing `position`; `-1` for an
    /// empty column.
    pub fn highest_light_blocking(&self, position: BlockPosition) -> Option<i32> {
        self.chunk(position.chunk())
            .map(|chunk| chunk.heightmap().highest_at(position.relative_to_chunk()))
    }

    pub fn sky_light_level(&self, position: BlockPosition) -> u8 {
        self.chunk(position.chunk())
            .map(|chunk| chunk.lighting().sky_light_level(position.relative_to_chunk()))
            .unwrap_or(DEFAULT_SKY_LIGHT_LEVEL)
    }

    pub fn block_light_level(&self, position: BlockPosition) -> u8 {
        self.chunk(position.chunk())
            .map(|chunk| chunk.lighting().block_light_level(position.relative_to_chunk()))
            .unwrap_or(DEFAULT_BLOCK_LIGHT_LEVEL)
    }

    /// Defaults for both channels when the chunk is missing.
    pub fn light_level(&self, position: BlockPosition) -> LightLevel {
        LightLevel {
            sky: self.sky_light_level(position),
            block: self.block_light_level(position),
        }
    }

    /// Ignored when the chunk is missing.
    pub fn set_sky_light_level(&mut self, position: BlockPosition, level: u8) {
        if let Some(chunk) = self.chunk_mut(position.chunk()) {
            chunk
                .lighting_mut()
                .set_sky_light_level(position.relative_to_chunk(), level);
        }
    }

    /// Ignored when the chunk is missing.
    pub fn set_block_light_level(&mut self, position: BlockPosition, level: u8) {
        if let Some(chunk) = self.chunk_mut(position.chunk()) {
            chunk
                .lighting_mut()
                .set_block_light_level(position.relative_to_chunk(), level);
        }
    }
}
