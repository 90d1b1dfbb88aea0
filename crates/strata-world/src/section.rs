use crate::block::{BlockId, BlockRegistry, AIR};
use crate::error::DecodeSectionError;
use crate::packed;
use strata_common::BlockPosition;
use strata_logger::Logger;

pub const SECTION_WIDTH: usize = 16;
pub const SECTION_HEIGHT: usize = 16;
pub const SECTION_VOLUME: usize = SECTION_WIDTH * SECTION_WIDTH * SECTION_HEIGHT;

/// Bits per block above which the wire format sends global ids directly.
pub const MAX_INDIRECT_BITS: u8 = 8;

/// 16x16x16 block ids plus a running count of non-air blocks.
///
/// An all-air section keeps no block array until something is placed in it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Section {
    blocks: Vec<BlockId>,
    block_count: u16,
}

/// Result of expanding one section from the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedSection {
    pub section: Section,
    /// Entries whose palette index was out of range and became air.
    pub palette_misses: usize,
}

impl Section {
    pub fn empty() -> Self {
        Section::default()
    }

    /// Builds a section from exactly 4096 ids in `(y * 16 + z) * 16 + x` order.
    ///
    /// # Panics
    ///
    /// If `blocks` does not hold exactly 4096 ids.
    pub fn from_block_ids(blocks: Vec<BlockId>, registry: &BlockRegistry) -> Self {
        assert_eq!(
            blocks.len(),
            SECTION_VOLUME,
            "a section holds exactly {} blocks",
            SECTION_VOLUME
        );

        if blocks.iter().all(|id| *id == AIR) {
            return Section::empty();
        }
        let block_count = blocks.iter().filter(|id| !registry.is_air(**id)).count() as u16;
        Section {
            blocks,
            block_count,
        }
    }

    /// Expands a packed section. `palette` is present for indirect sections
    /// (bits per block up to 8) and maps local ids to global ids; without it
    /// entries are global ids. Local ids past the end of the palette become
    /// air and are counted in [`DecodedSection::palette_misses`].
    pub fn decode(
        bits_per_block: u8,
        palette: Option<&[BlockId]>,
        data: &[u64],
        registry: &BlockRegistry,
        logger: &dyn Logger,
    ) -> Result<DecodedSection, DecodeSectionError> {
        if bits_per_block == 0 {
            return Ok(DecodedSection {
                section: Section::empty(),
                palette_misses: 0,
            });
        }

        let mut blocks = packed::unpack(bits_per_block, data, SECTION_VOLUME)?;
        let mut palette_misses = 0;
        if let Some(palette) = palette {
            for block in blocks.iter_mut() {
                *block = match palette.get(*block as usize) {
                    Some(id) => *id,
                    None => {
                        palette_misses += 1;
                        AIR
                    }
                };
            }
        }

        if palette_misses > 0 {
            logger.warning(&format!(
                "{} block(s) referenced indices outside a palette of {} entries, replaced with air",
                palette_misses,
                palette.map(|p| p.len()).unwrap_or(0)
            ));
        }

        Ok(DecodedSection {
            section: Section::from_block_ids(blocks, registry),
            palette_misses,
        })
    }

    pub fn block_count(&self) -> u16 {
        self.block_count
    }

    pub fn is_empty(&self) -> bool {
        self.block_count == 0
    }

    /// Block at an index in `0..4096`. Out of range reads are air.
    pub fn block_id(&self, index: usize) -> BlockId {
        self.blocks.get(index).copied().unwrap_or(AIR)
    }

    pub fn block_id_at(&self, position: BlockPosition) -> BlockId {
        self.block_id(position.section_block_index())
    }

    /// Replaces the block at `index` and returns the previous id, keeping
    /// the non-air count in step.
    pub fn set_block_id(&mut self, index: usize, id: BlockId, registry: &BlockRegistry) -> BlockId {
        if index >= SECTION_VOLUME {
            return AIR;
        }
        if self.blocks.is_empty() {
            if id == AIR {
                return AIR;
            }
            self.blocks = vec![AIR; SECTION_VOLUME];
        }

        let previous = std::mem::replace(&mut self.blocks[index], id);
        match (registry.is_air(previous), registry.is_air(id)) {
            (true, false) => self.block_count += 1,
            (false, true) => self.block_count -= 1,
            _ => {}
        }
        previous
    }

    /// Dense block ids, or `None` for a section that has never held a block.
    pub fn block_ids(&self) -> Option<&[BlockId]> {
        if self.blocks.is_empty() {
            None
        } else {
            Some(&self.blocks)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use strata_logger::{LogSeverity, MemoryLogger, NullLogger};

    fn registry() -> BlockRegistry {
        BlockRegistry::new()
    }

    #[test]
    fn test_set_block_keeps_count() {
        let registry = registry();
        let mut section = Section::empty();
        assert!(section.is_empty());

        assert_eq!(section.set_block_id(10, 1, &registry), AIR);
        assert_eq!(section.block_count(), 1);

        // same id again leaves the count alone
        assert_eq!(section.set_block_id(10, 1, &registry), 1);
        assert_eq!(section.block_count(), 1);

        // non-air to non-air
        section.set_block_id(10, 2, &registry);
        assert_eq!(section.block_count(), 1);

        assert_eq!(section.set_block_id(10, AIR, &registry), 2);
        assert_eq!(section.block_count(), 0);
        assert!(section.is_empty());
    }

    #[test]
    fn test_air_into_empty_section_does_not_allocate() {
        let mut section = Section::empty();
        section.set_block_id(0, AIR, &registry());
        assert!(section.block_ids().is_none());
    }

    #[test]
    fn test_from_block_ids_counts() {
        let mut blocks = vec![AIR; SECTION_VOLUME];
        blocks[0] = 1;
        blocks[4095] = 9671; // cave air
        blocks[100] = 3;
        let section = Section::from_block_ids(blocks, &registry());
        assert_eq!(section.block_count(), 2);
        assert_eq!(section.block_id(100), 3);
        assert_eq!(section.block_id_at(BlockPosition::new(0, 0, 0)), 1);
    }

    #[test]
    #[should_panic]
    fn test_from_block_ids_wrong_length() {
        Section::from_block_ids(vec![1; 100], &registry());
    }

    #[test]
    fn test_decode_all_widths() {
        let registry = registry();
        for bits in [1u8, 4, 5, 6, 7, 8, 9, 15] {
            let limit = 1u32 << bits.min(8);
            let locals: Vec<u32> = (0..SECTION_VOLUME as u32).map(|n| n % limit).collect();
            let data = packed::pack(bits, &locals);

            let decoded = if bits <= MAX_INDIRECT_BITS {
                let palette: Vec<BlockId> = (0..limit).map(|n| n * 3).collect();
                let decoded =
                    Section::decode(bits, Some(&palette), &data, &registry, &NullLogger).unwrap();
                for (n, local) in locals.iter().enumerate() {
                    assert_eq!(decoded.section.block_id(n), palette[*local as usize]);
                }
                decoded
            } else {
                let decoded = Section::decode(bits, None, &data, &registry, &NullLogger).unwrap();
                for (n, local) in locals.iter().enumerate() {
                    assert_eq!(decoded.section.block_id(n), *local);
                }
                decoded
            };

            assert_eq!(decoded.palette_misses, 0);
            let non_air = (0..SECTION_VOLUME)
                .filter(|n| !registry.is_air(decoded.section.block_id(*n)))
                .count();
            assert_eq!(decoded.section.block_count() as usize, non_air, "bits {}", bits);
        }
    }

    #[test]
    fn test_decode_zero_bits() {
        let decoded = Section::decode(0, Some(&[]), &[], &registry(), &NullLogger).unwrap();
        assert!(decoded.section.is_empty());
        assert_eq!(decoded.section.block_id(4095), AIR);
    }

    #[test]
    fn test_decode_palette_miss_becomes_air() {
        let logger = MemoryLogger::new();
        let palette = [0, 1, 5];
        let mut locals = vec![2u32; SECTION_VOLUME];
        locals[7] = 3;
        locals[8] = 15;
        let data = packed::pack(4, &locals);

        let decoded = Section::decode(4, Some(&palette), &data, &registry(), &logger).unwrap();
        assert_eq!(decoded.palette_misses, 2);
        assert_eq!(decoded.section.block_id(7), AIR);
        assert_eq!(decoded.section.block_id(8), AIR);
        assert_eq!(decoded.section.block_id(9), 5);
        assert_eq!(decoded.section.block_count(), SECTION_VOLUME as u16 - 2);
        assert!(logger.contains(LogSeverity::Warning, "palette of 3 entries"));
    }

    #[test]
    fn test_decode_short_array() {
        let result = Section::decode(5, Some(&[1; 32]), &[0; 341], &registry(), &NullLogger);
        assert_matches!(
            result,
            Err(DecodeSectionError::PackedArrayTooShort {
                expected: 342,
                found: 341
            })
        );
    }
}
