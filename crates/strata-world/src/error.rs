use strata_common::BlockPosition;
use std::error::Error;
use std::fmt;

/// Failures decoding one section's packed block array. Either one aborts
/// the packet the section came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeSectionError {
    InvalidBitsPerBlock(u8),
    PackedArrayTooShort { expected: usize, found: usize },
}

impl fmt::Display for DecodeSectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeSectionError::InvalidBitsPerBlock(bits) => {
                write!(f, "Invalid bits per block: {}", bits)
            }
            DecodeSectionError::PackedArrayTooShort { expected, found } => write!(
                f,
                "Packed array too short: expected {} longs, found {}",
                expected, found
            ),
        }
    }
}

impl Error for DecodeSectionError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChunkError {
    /// A chunk-relative position outside `0..16, 0..256, 0..16`.
    PositionOutOfRange(BlockPosition),
}

impl fmt::Display for ChunkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChunkError::PositionOutOfRange(position) => {
                write!(f, "Position {} is outside the chunk", position)
            }
        }
    }
}

impl Error for ChunkError {}
