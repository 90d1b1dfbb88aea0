use crate::block::BlockRegistry;
use crate::packed;
use crate::section::{Section, SECTION_HEIGHT};
use strata_common::BlockPosition;

const COLUMNS: usize = 256;
const ENTRY_BITS: u8 = 9;

/// Height of the highest light-blocking block in each of a chunk's 256
/// columns, `-1` for a column with none. Only lighting reads it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeightMap {
    heights: Vec<i32>,
}

impl Default for HeightMap {
    fn default() -> Self {
        HeightMap {
            heights: vec![-1; COLUMNS],
        }
    }
}

fn column_index(x: i32, z: i32) -> usize {
    (z.rem_euclid(16) * 16 + x.rem_euclid(16)) as usize
}

fn block_at(sections: &[Section], x: i32, y: i32, z: i32) -> u32 {
    let position = BlockPosition::new(x, y, z);
    sections
        .get(position.section_index() as usize)
        .map(|section| section.block_id_at(position))
        .unwrap_or(0)
}

impl HeightMap {
    /// Unpacks a `MOTION_BLOCKING` long array: 9 bit entries, 7 per long,
    /// each storing the height above the highest blocking block. `None` if
    /// the array is too short for 256 columns.
    pub fn from_motion_blocking(longs: &[i64]) -> Option<Self> {
        let words: Vec<u64> = longs.iter().map(|l| *l as u64).collect();
        let values = packed::unpack(ENTRY_BITS, &words, COLUMNS).ok()?;
        Some(HeightMap {
            heights: values.into_iter().map(|value| value as i32 - 1).collect(),
        })
    }

    pub fn to_motion_blocking(&self) -> Vec<i64> {
        let values: Vec<u32> = self.heights.iter().map(|h| (h + 1) as u32).collect();
        packed::pack(ENTRY_BITS, &values)
            .into_iter()
            .map(|word| word as i64)
            .collect()
    }

    /// Scans each column from the top for the first block with non-zero opacity.
    pub fn from_sections(sections: &[Section], registry: &BlockRegistry) -> Self {
        let top = (sections.len() * SECTION_HEIGHT) as i32;
        let mut heights = vec![-1; COLUMNS];
        for z in 0..16 {
            for x in 0..16 {
                heights[column_index(x, z)] = (0..top)
                    .rev()
                    .find(|y| registry.opacity(block_at(sections, x, *y, z)) != 0)
                    .unwrap_or(-1);
            }
        }
        HeightMap { heights }
    }

    pub fn highest(&self, x: i32, z: i32) -> i32 {
        self.heights[column_index(x, z)]
    }

    pub fn highest_at(&self, position: BlockPosition) -> i32 {
        self.highest(position.x, position.z)
    }

    /// Adjusts the column containing `position` after the block there has
    /// already been replaced in `sections`.
    pub fn handle_block_update(
        &mut self,
        position: BlockPosition,
        sections: &[Section],
        registry: &BlockRegistry,
    ) {
        let index = column_index(position.x, position.z);
        let highest = self.heights[index];
        let opacity = registry.opacity(block_at(sections, position.x, position.y, position.z));

        if position.y > highest {
            if opacity != 0 {
                self.heights[index] = position.y;
            }
        } else if position.y == highest && opacity == 0 {
            self.heights[index] = (0..position.y)
                .rev()
                .find(|y| registry.opacity(block_at(sections, position.x, *y, position.z)) != 0)
                .unwrap_or(-1);
        }
    }
}
