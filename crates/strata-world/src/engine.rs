//! Incremental light propagation after block changes.
//!
//! Light is spread with two queues. The decrease queue walks outward from a
//! position whose light dropped and clears every cell that took its level
//! from there; cells lit from elsewhere are handed to the increase queue,
//! which then floods light back in. Each step costs at least one level, more
//! through blocks with higher opacity.

use crate::block::BlockRegistry;
use crate::lighting::MAX_LIGHT_LEVEL;
use crate::terrain::Terrain;
use std::collections::VecDeque;
use strata_common::{BlockPosition, Direction};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Channel {
    Sky,
    Block,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Directions(u8);

impl Directions {
    const NONE: Directions = Directions(0);

    fn bit(direction: Direction) -> u8 {
        match direction {
            Direction::Down => 1,
            Direction::Up => 1 << 1,
            Direction::North => 1 << 2,
            Direction::South => 1 << 3,
            Direction::West => 1 << 4,
            Direction::East => 1 << 5,
        }
    }

    fn only(direction: Direction) -> Directions {
        Directions(Self::bit(direction))
    }

    fn with(self, direction: Direction) -> Directions {
        Directions(self.0 | Self::bit(direction))
    }

    fn contains(self, direction: Direction) -> bool {
        self.0 & Self::bit(direction) != 0
    }
}

#[derive(Debug, Clone, Copy)]
struct Increase {
    position: BlockPosition,
    level: u8,
    /// Store `level` at `position` before spreading.
    write_level: bool,
    /// Skip the entry if the stored level changed since it was queued.
    recheck_level: bool,
    skip: Directions,
}

#[derive(Debug, Clone, Copy)]
struct Decrease {
    position: BlockPosition,
    level: u8,
    skip: Directions,
}

/// Recomputes sky and block light around changed blocks. Runs against a
/// [`Terrain`] the caller holds exclusively; neighbours in chunks that are
/// not loaded are skipped.
#[derive(Debug, Default)]
pub struct LightingEngine {
    increase_queue: VecDeque<Increase>,
    decrease_queue: VecDeque<Decrease>,
}

impl LightingEngine {
    pub fn new() -> Self {
        LightingEngine::default()
    }

    /// Propagates light changes caused by the blocks at `positions`, which
    /// must already hold their new ids and height map entries.
    pub fn update_lighting(
        &mut self,
        terrain: &mut Terrain,
        registry: &BlockRegistry,
        positions: &[BlockPosition],
    ) {
        self.increase_queue.clear();
        self.decrease_queue.clear();

        for position in positions {
            if terrain.is_position_loaded(*position) {
                self.queue_block_light_update(terrain, registry, *position);
            }
        }
        self.propagate(terrain, registry, Channel::Block);

        for position in positions {
            if terrain.is_position_loaded(*position) {
                self.queue_sky_light_update(terrain, registry, *position);
            }
        }
        self.propagate(terrain, registry, Channel::Sky);
    }

    fn queue_block_light_update(
        &mut self,
        terrain: &mut Terrain,
        registry: &BlockRegistry,
        position: BlockPosition,
    ) {
        let current = terrain.block_light_level(position);
        let emitted = source_level(terrain, registry, Channel::Block, position);
        terrain.set_block_light_level(position, emitted);

        if emitted != 0 {
            self.increase_queue.push_back(Increase {
                position,
                level: emitted,
                write_level: false,
                recheck_level: false,
                skip: Directions::NONE,
            });
        }
        self.decrease_queue.push_back(Decrease {
            position,
            level: current,
            skip: Directions::NONE,
        });
    }

    fn queue_sky_light_update(
        &mut self,
        terrain: &mut Terrain,
        registry: &BlockRegistry,
        position: BlockPosition,
    ) {
        let highest = match terrain.highest_light_blocking(position) {
            Some(highest) => highest,
            None => return,
        };

        if position.y > highest {
            // The column below may have just been opened to the sky.
            let mut below = position;
            while below.y > 0 {
                below.y -= 1;
                let transparent = registry.opacity(terrain.block_id(below)) == 0;
                if !transparent || terrain.sky_light_level(below) == MAX_LIGHT_LEVEL {
                    break;
                }
                terrain.set_sky_light_level(below, MAX_LIGHT_LEVEL);
                self.increase_queue.push_back(Increase {
                    position: below,
                    level: MAX_LIGHT_LEVEL,
                    write_level: false,
                    recheck_level: false,
                    skip: Directions::only(Direction::Up).with(Direction::Down),
                });
            }
        } else if position.y == highest {
            // A new highest block shadows everything under it.
            let mut below = position;
            while below.y > 0 {
                below.y -= 1;
                let current = terrain.sky_light_level(below);
                if current == MAX_LIGHT_LEVEL && registry.opacity(terrain.block_id(below)) == 0 {
                    terrain.set_sky_light_level(below, 0);
                    self.decrease_queue.push_back(Decrease {
                        position: below,
                        level: current,
                        skip: Directions::NONE,
                    });
                }
            }
        }

        let current = terrain.sky_light_level(position);
        let exposed = source_level(terrain, registry, Channel::Sky, position);
        terrain.set_sky_light_level(position, exposed);
        if exposed != 0 {
            self.increase_queue.push_back(Increase {
                position,
                level: exposed,
                write_level: false,
                recheck_level: false,
                skip: Directions::NONE,
            });
        }
        self.decrease_queue.push_back(Decrease {
            position,
            level: current,
            skip: Directions::NONE,
        });
    }

    fn propagate(&mut self, terrain: &mut Terrain, registry: &BlockRegistry, channel: Channel) {
        self.perform_decrease(terrain, registry, channel);
        self.perform_increase(terrain, registry, channel);
    }

    fn perform_increase(&mut self, terrain: &mut Terrain, registry: &BlockRegistry, channel: Channel) {
        while let Some(entry) = self.increase_queue.pop_front() {
            if entry.write_level {
                set_level(terrain, channel, entry.position, entry.level);
            }
            if entry.recheck_level && level(terrain, channel, entry.position) != entry.level {
                continue;
            }

            for direction in Direction::ALL {
                if entry.skip.contains(direction) {
                    continue;
                }
                let neighbour = entry.position.neighbour(direction);
                if !terrain.is_position_loaded(neighbour) {
                    continue;
                }

                let neighbour_level = level(terrain, channel, neighbour);
                if neighbour_level >= entry.level {
                    continue;
                }

                let opacity = registry.opacity(terrain.block_id(neighbour)).max(1);
                let propagated = entry.level.saturating_sub(opacity);
                if propagated > neighbour_level {
                    set_level(terrain, channel, neighbour, propagated);
                    if propagated > 1 {
                        self.increase_queue.push_back(Increase {
                            position: neighbour,
                            level: propagated,
                            write_level: false,
                            recheck_level: false,
                            skip: Directions::only(direction.opposite()),
                        });
                    }
                }
            }
        }
    }

    fn perform_decrease(&mut self, terrain: &mut Terrain, registry: &BlockRegistry, channel: Channel) {
        while let Some(entry) = self.decrease_queue.pop_front() {
            for direction in Direction::ALL {
                if entry.skip.contains(direction) {
                    continue;
                }
                let neighbour = entry.position.neighbour(direction);
                if !terrain.is_position_loaded(neighbour) {
                    continue;
                }

                let neighbour_level = level(terrain, channel, neighbour);
                if neighbour_level == 0 {
                    continue;
                }

                let opacity = registry.opacity(terrain.block_id(neighbour)).max(1);
                let propagated = entry.level.saturating_sub(opacity);
                if neighbour_level > propagated {
                    // Lit from somewhere else; spread it back once clearing is done.
                    self.increase_queue.push_back(Increase {
                        position: neighbour,
                        level: neighbour_level,
                        write_level: false,
                        recheck_level: true,
                        skip: Directions::NONE,
                    });
                    continue;
                }

                let source = source_level(terrain, registry, channel, neighbour);
                if source != 0 {
                    self.increase_queue.push_back(Increase {
                        position: neighbour,
                        level: source,
                        write_level: true,
                        recheck_level: false,
                        skip: Directions::NONE,
                    });
                }
                set_level(terrain, channel, neighbour, source);

                if propagated > 0 {
                    self.decrease_queue.push_back(Decrease {
                        position: neighbour,
                        level: propagated,
                        skip: Directions::only(direction.opposite()),
                    });
                }
            }
        }
    }
}

/// Light a cell produces on its own: a block's luminance, or full sky light
/// for a transparent cell above its column's highest blocking block.
fn source_level(
    terrain: &Terrain,
    registry: &BlockRegistry,
    channel: Channel,
    position: BlockPosition,
) -> u8 {
    let material = registry.light_material(terrain.block_id(position));
    match channel {
        Channel::Block => material.luminance,
        Channel::Sky => match terrain.highest_light_blocking(position) {
            Some(highest) if position.y > highest && material.opacity == 0 => MAX_LIGHT_LEVEL,
            _ => 0,
        },
    }
}

fn level(terrain: &Terrain, channel: Channel, position: BlockPosition) -> u8 {
    match channel {
        Channel::Sky => terrain.sky_light_level(position),
        Channel::Block => terrain.block_light_level(position),
    }
}

fn set_level(terrain: &mut Terrain, channel: Channel, position: BlockPosition, level: u8) {
    match channel {
        Channel::Sky => terrain.set_sky_light_level(position, level),
        Channel::Block => terrain.set_block_light_level(position, level),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::{LightMaterial, AIR};
    use crate::chunk::Chunk;
    use crate::lighting::ChunkLightingUpdateData;
    use strata_common::ChunkPosition;

    const STONE: u32 = 1;
    const TORCH: u32 = 50;
    const GLOWSTONE: u32 = 89;

    fn registry() -> BlockRegistry {
        BlockRegistry::new()
            .with_block(TORCH, LightMaterial::new(0, 14))
            .with_block(GLOWSTONE, LightMaterial::new(15, 15))
    }

    fn terrain_with_chunks(positions: &[(i32, i32)]) -> Terrain {
        let mut terrain = Terrain::new();
        for (x, z) in positions {
            let mut chunk = Chunk::default();
            chunk.update_lighting(&ChunkLightingUpdateData::default());
            terrain.add_chunk(ChunkPosition::new(*x, *z), chunk);
        }
        terrain
    }

    fn place(
        terrain: &mut Terrain,
        engine: &mut LightingEngine,
        registry: &BlockRegistry,
        position: BlockPosition,
        id: u32,
    ) {
        let chunk = terrain.chunk_mut(position.chunk()).unwrap();
        chunk
            .set_block_id(position.relative_to_chunk(), id, registry)
            .unwrap();
        engine.update_lighting(terrain, registry, &[position]);
    }

    #[test]
    fn test_torch_spreads_and_fades() {
        let registry = registry();
        let mut terrain = terrain_with_chunks(&[(0, 0)]);
        let mut engine = LightingEngine::new();
        let torch = BlockPosition::new(8, 64, 8);

        place(&mut terrain, &mut engine, &registry, torch, TORCH);

        assert_eq!(terrain.block_light_level(torch), 14);
        assert_eq!(terrain.block_light_level(BlockPosition::new(9, 64, 8)), 13);
        assert_eq!(terrain.block_light_level(BlockPosition::new(8, 66, 8)), 12);
        assert_eq!(terrain.block_light_level(BlockPosition::new(11, 64, 10)), 9);
        assert_eq!(terrain.block_light_level(BlockPosition::new(8, 64, 30)), 0);
    }

    #[test]
    fn test_removing_torch_clears_light() {
        let registry = registry();
        let mut terrain = terrain_with_chunks(&[(0, 0)]);
        let mut engine = LightingEngine::new();
        let torch = BlockPosition::new(8, 64, 8);

        place(&mut terrain, &mut engine, &registry, torch, TORCH);
        place(&mut terrain, &mut engine, &registry, torch, AIR);

        for offset in 0..8 {
            assert_eq!(terrain.block_light_level(BlockPosition::new(8 + offset, 64, 8)), 0);
            assert_eq!(terrain.block_light_level(BlockPosition::new(8, 64 - offset, 8)), 0);
        }
    }

    #[test]
    fn test_two_sources_keep_the_brighter() {
        let registry = registry();
        let mut terrain = terrain_with_chunks(&[(0, 0)]);
        let mut engine = LightingEngine::new();
        let first = BlockPosition::new(2, 10, 2);
        let second = BlockPosition::new(6, 10, 2);

        place(&mut terrain, &mut engine, &registry, first, TORCH);
        place(&mut terrain, &mut engine, &registry, second, GLOWSTONE);
        assert_eq!(terrain.block_light_level(BlockPosition::new(4, 10, 2)), 13);

        place(&mut terrain, &mut engine, &registry, second, AIR);
        assert_eq!(terrain.block_light_level(BlockPosition::new(4, 10, 2)), 12);
        assert_eq!(terrain.block_light_level(second), 10);
    }

    #[test]
    fn test_light_crosses_chunk_borders() {
        let registry = registry();
        let mut terrain = terrain_with_chunks(&[(0, 0), (1, 0)]);
        let mut engine = LightingEngine::new();

        place(&mut terrain, &mut engine, &registry, BlockPosition::new(15, 64, 0), TORCH);
        assert_eq!(terrain.block_light_level(BlockPosition::new(16, 64, 0)), 13);
        assert_eq!(terrain.block_light_level(BlockPosition::new(20, 64, 0)), 9);
    }

    #[test]
    fn test_unloaded_neighbours_are_skipped() {
        let registry = registry();
        let mut terrain = terrain_with_chunks(&[(0, 0)]);
        let mut engine = LightingEngine::new();

        place(&mut terrain, &mut engine, &registry, BlockPosition::new(0, 64, 0), TORCH);
        assert_eq!(terrain.block_light_level(BlockPosition::new(-1, 64, 0)), 0);
        assert!(terrain.chunk(ChunkPosition::new(-1, 0)).is_none());
        assert_eq!(terrain.block_light_level(BlockPosition::new(1, 64, 0)), 13);
    }

    #[test]
    fn test_opaque_blocks_stop_light() {
        let registry = registry();
        let mut terrain = terrain_with_chunks(&[(0, 0)]);
        let mut engine = LightingEngine::new();

        place(&mut terrain, &mut engine, &registry, BlockPosition::new(5, 64, 5), STONE);
        place(&mut terrain, &mut engine, &registry, BlockPosition::new(4, 64, 5), TORCH);
        assert_eq!(terrain.block_light_level(BlockPosition::new(5, 64, 5)), 0);
        // around the stone instead of through it
        assert_eq!(terrain.block_light_level(BlockPosition::new(6, 64, 5)), 10);
    }

    #[test]
    fn test_roof_shadows_and_reopens_column() {
        let registry = registry();
        let mut terrain = terrain_with_chunks(&[(0, 0)]);
        let mut engine = LightingEngine::new();

        // give a small area full sky light, as the server would have
        for x in 0..16 {
            for z in 0..16 {
                for y in 0..80 {
                    terrain.set_sky_light_level(BlockPosition::new(x, y, z), 15);
                }
            }
        }

        let roof = BlockPosition::new(8, 70, 8);
        place(&mut terrain, &mut engine, &registry, roof, STONE);
        assert_eq!(terrain.sky_light_level(roof), 0);
        // the cell under the roof now gets light from the sides
        assert_eq!(terrain.sky_light_level(BlockPosition::new(8, 69, 8)), 14);
        assert_eq!(terrain.sky_light_level(BlockPosition::new(8, 40, 8)), 14);
        assert_eq!(terrain.sky_light_level(BlockPosition::new(8, 71, 8)), 15);

        place(&mut terrain, &mut engine, &registry, roof, AIR);
        assert_eq!(terrain.sky_light_level(roof), 15);
        assert_eq!(terrain.sky_light_level(BlockPosition::new(8, 40, 8)), 15);
    }

    #[test]
    fn test_directions_set() {
        let set = Directions::only(Direction::Up).with(Direction::Down);
        assert!(set.contains(Direction::Up));
        assert!(set.contains(Direction::Down));
        assert!(!set.contains(Direction::East));
        assert!(!Directions::NONE.contains(Direction::North));
    }
}
