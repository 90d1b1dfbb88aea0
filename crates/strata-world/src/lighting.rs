use crate::section::SECTION_VOLUME;
use std::collections::HashMap;
use strata_common::BlockPosition;

pub const MAX_LIGHT_LEVEL: u8 = 15;
pub const DEFAULT_SKY_LIGHT_LEVEL: u8 = 0;
pub const DEFAULT_BLOCK_LIGHT_LEVEL: u8 = 0;

/// Lowest and highest section index with light data: one below and one
/// above the 16 block sections.
pub const MIN_LIGHT_SECTION: i32 = -1;
pub const MAX_LIGHT_SECTION: i32 = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LightLevel {
    pub sky: u8,
    pub block: u8,
}

impl Default for LightLevel {
    fn default() -> Self {
        LightLevel {
            sky: DEFAULT_SKY_LIGHT_LEVEL,
            block: DEFAULT_BLOCK_LIGHT_LEVEL,
        }
    }
}

/// Light sent by the server for one chunk. Arrays are unpacked to one level
/// per block, 4096 entries, keyed by section index (`-1..=16`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChunkLightingUpdateData {
    pub trust_edges: bool,
    pub empty_sky_light_sections: Vec<i32>,
    pub empty_block_light_sections: Vec<i32>,
    pub sky_light_arrays: HashMap<i32, Vec<u8>>,
    pub block_light_arrays: HashMap<i32, Vec<u8>>,
}

/// Per-section sky and block light for one chunk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChunkLighting {
    sky_light: HashMap<i32, Vec<u8>>,
    block_light: HashMap<i32, Vec<u8>>,
    populated: bool,
}

#[derive(Clone, Copy)]
enum Channel {
    Sky,
    Block,
}

impl ChunkLighting {
    pub fn new() -> Self {
        ChunkLighting::default()
    }

    /// Overwrites sections with server data. Sections marked empty lose
    /// their array and read back as the default level.
    pub fn update(&mut self, data: &ChunkLightingUpdateData) {
        for index in &data.empty_sky_light_sections {
            self.sky_light.remove(index);
        }
        for index in &data.empty_block_light_sections {
            self.block_light.remove(index);
        }

        // Arrays of any other length never leave the packet decoder.
        for (index, array) in &data.sky_light_arrays {
            if array.len() == SECTION_VOLUME {
                self.sky_light.insert(*index, array.clone());
            }
        }
        for (index, array) in &data.block_light_arrays {
            if array.len() == SECTION_VOLUME {
                self.block_light.insert(*index, array.clone());
            }
        }

        self.populated = true;
    }

    /// Whether any light data has been applied.
    pub fn is_populated(&self) -> bool {
        self.populated
    }

    /// x and z in `0..16`, y covering the sections below and above the world.
    pub fn is_valid_position(position: BlockPosition) -> bool {
        (0..16).contains(&position.x)
            && (0..16).contains(&position.z)
            && (MIN_LIGHT_SECTION..=MAX_LIGHT_SECTION).contains(&position.section_index())
    }

    pub fn sky_light_level(&self, position: BlockPosition) -> u8 {
        self.level(Channel::Sky, position)
    }

    pub fn block_light_level(&self, position: BlockPosition) -> u8 {
        self.level(Channel::Block, position)
    }

    pub fn light_level(&self, position: BlockPosition) -> LightLevel {
        LightLevel {
            sky: self.sky_light_level(position),
            block: self.block_light_level(position),
        }
    }

    pub fn set_sky_light_level(&mut self, position: BlockPosition, level: u8) {
        self.set_level(Channel::Sky, position, level);
    }

    pub fn set_block_light_level(&mut self, position: BlockPosition, level: u8) {
        self.set_level(Channel::Block, position, level);
    }

    pub fn sky_light_section(&self, index: i32) -> Option<&[u8]> {
        self.sky_light.get(&index).map(Vec::as_slice)
    }

    pub fn block_light_section(&self, index: i32) -> Option<&[u8]> {
        self.block_light.get(&index).map(Vec::as_slice)
    }

    fn level(&self, channel: Channel, position: BlockPosition) -> u8 {
        let (arrays, default) = match channel {
            Channel::Sky => (&self.sky_light, DEFAULT_SKY_LIGHT_LEVEL),
            Channel::Block => (&self.block_light, DEFAULT_BLOCK_LIGHT_LEVEL),
        };
        if !Self::is_valid_position(position) {
            return default;
        }
        arrays
            .get(&position.section_index())
            .map(|array| array[position.section_block_index()])
            .unwrap_or(default)
    }

    fn set_level(&mut self, channel: Channel, position: BlockPosition, level: u8) {
        if !Self::is_valid_position(position) {
            return;
        }

        let section = position.section_index();
        // A section gets both arrays at once so the channels stay aligned.
        self.sky_light
            .entry(section)
            .or_insert_with(|| vec![DEFAULT_SKY_LIGHT_LEVEL; SECTION_VOLUME]);
        self.block_light
            .entry(section)
            .or_insert_with(|| vec![DEFAULT_BLOCK_LIGHT_LEVEL; SECTION_VOLUME]);

        let arrays = match channel {
            Channel::Sky => &mut self.sky_light,
            Channel::Block => &mut self.block_light,
        };
        if let Some(array) = arrays.get_mut(&section) {
            array[position.section_block_index()] = level.min(MAX_LIGHT_LEVEL);
        }
    }
}
