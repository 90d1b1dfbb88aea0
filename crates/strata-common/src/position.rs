use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops;

/// One of the six axis-aligned directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Down,
    Up,
    North,
    South,
    West,
    East,
}

impl Direction {
    pub const ALL: [Direction; 6] = [
        Direction::Down,
        Direction::Up,
        Direction::North,
        Direction::South,
        Direction::West,
        Direction::East,
    ];

    pub fn opposite(self) -> Direction {
        match self {
            Direction::Down => Direction::Up,
            Direction::Up => Direction::Down,
            Direction::North => Direction::South,
            Direction::South => Direction::North,
            Direction::West => Direction::East,
            Direction::East => Direction::West,
        }
    }

    pub fn offset(self) -> (i32, i32, i32) {
        match self {
            Direction::Down => (0, -1, 0),
            Direction::Up => (0, 1, 0),
            Direction::North => (0, 0, -1),
            Direction::South => (0, 0, 1),
            Direction::West => (-1, 0, 0),
            Direction::East => (1, 0, 0),
        }
    }
}

/// Horizontal directions, used for chunk neighbours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CardinalDirection {
    North,
    East,
    South,
    West,
}

impl CardinalDirection {
    pub const ALL: [CardinalDirection; 4] = [
        CardinalDirection::North,
        CardinalDirection::East,
        CardinalDirection::South,
        CardinalDirection::West,
    ];
}

/// A block position in world coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct BlockPosition {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl BlockPosition {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        BlockPosition { x, y, z }
    }

    /// The chunk containing this position.
    pub fn chunk(&self) -> ChunkPosition {
        ChunkPosition::new(self.x >> 4, self.z >> 4)
    }

    /// x and z wrapped into `0..16`, y untouched.
    pub fn relative_to_chunk(&self) -> BlockPosition {
        BlockPosition::new(self.x.rem_euclid(16), self.y, self.z.rem_euclid(16))
    }

    /// All three axes wrapped into `0..16`.
    pub fn relative_to_section(&self) -> BlockPosition {
        BlockPosition::new(
            self.x.rem_euclid(16),
            self.y.rem_euclid(16),
            self.z.rem_euclid(16),
        )
    }

    /// Index of the 16 block tall section containing this position. May be
    /// negative or above 15 for positions outside the world.
    pub fn section_index(&self) -> i32 {
        self.y.div_euclid(16)
    }

    /// Index into a section's block array: `(y * 16 + z) * 16 + x`.
    pub fn section_block_index(&self) -> usize {
        let relative = self.relative_to_section();
        ((relative.y as usize * 16) + relative.z as usize) * 16 + relative.x as usize
    }

    /// Index into a chunk's 4x4x4 biome cells. Expects a chunk-relative position.
    pub fn biome_index(&self) -> usize {
        let relative = self.relative_to_chunk();
        (relative.y as usize / 4) * 16 + (relative.z as usize / 4) * 4 + relative.x as usize / 4
    }

    pub fn neighbour(self, direction: Direction) -> BlockPosition {
        self + direction.offset()
    }
}

impl ops::Add<(i32, i32, i32)> for BlockPosition {
    type Output = BlockPosition;

    fn add(self, (x, y, z): (i32, i32, i32)) -> BlockPosition {
        BlockPosition::new(self.x + x, self.y + y, self.z + z)
    }
}

impl fmt::Display for BlockPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// Position of a chunk column, in chunks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ChunkPosition {
    pub x: i32,
    pub z: i32,
}

impl ChunkPosition {
    pub const fn new(x: i32, z: i32) -> Self {
        ChunkPosition { x, z }
    }

    pub fn neighbour(self, direction: CardinalDirection) -> ChunkPosition {
        match direction {
            CardinalDirection::North => ChunkPosition::new(self.x, self.z - 1),
            CardinalDirection::East => ChunkPosition::new(self.x + 1, self.z),
            CardinalDirection::South => ChunkPosition::new(self.x, self.z + 1),
            CardinalDirection::West => ChunkPosition::new(self.x - 1, self.z),
        }
    }

    pub fn neighbours(self) -> [(CardinalDirection, ChunkPosition); 4] {
        CardinalDirection::ALL.map(|direction| (direction, self.neighbour(direction)))
    }

    pub fn is_neighbour(&self, other: &ChunkPosition) -> bool {
        (self.x - other.x).abs() + (self.z - other.z).abs() == 1
    }

    /// Converts a chunk-relative position into world coordinates.
    pub fn block_position(&self, relative: BlockPosition) -> BlockPosition {
        BlockPosition::new(self.x * 16 + relative.x, relative.y, self.z * 16 + relative.z)
    }
}

impl fmt::Display for ChunkPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.x, self.z)
    }
}
