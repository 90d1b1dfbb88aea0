use crate::buffer::BufferError;
use std::error::Error;
use std::fmt;
use strata_common::StrataError;
use strata_nbt::NbtError;
use strata_world::DecodeSectionError;

/// Why a packet could not be decoded. Any of these abandons the packet;
/// none of them ends the connection on its own.
#[derive(Debug)]
pub enum DecodeError {
    Buffer(BufferError),
    Nbt(NbtError),
    Section(DecodeSectionError),
    UnexpectedPacketId { expected: i32, found: i32 },
    InvalidData(String),
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::Buffer(err) => write!(f, "Buffer error: {}", err),
            DecodeError::Nbt(err) => write!(f, "NBT error: {}", err),
            DecodeError::Section(err) => write!(f, "Section error: {}", err),
            DecodeError::UnexpectedPacketId { expected, found } => write!(
                f,
                "Unexpected packet id: expected {:#04x}, found {:#04x}",
                expected, found
            ),
            DecodeError::InvalidData(msg) => write!(f, "Invalid data: {}", msg),
        }
    }
}

impl Error for DecodeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            DecodeError::Buffer(err) => Some(err),
            DecodeError::Nbt(err) => Some(err),
            DecodeError::Section(err) => Some(err),
            _ => None,
        }
    }
}

impl From<BufferError> for DecodeError {
    fn from(err: BufferError) -> Self {
        DecodeError::Buffer(err)
    }
}

impl From<NbtError> for DecodeError {
    fn from(err: NbtError) -> Self {
        DecodeError::Nbt(err)
    }
}

impl From<DecodeSectionError> for DecodeError {
    fn from(err: DecodeSectionError) -> Self {
        DecodeError::Section(err)
    }
}

impl From<DecodeError> for StrataError {
    fn from(err: DecodeError) -> Self {
        StrataError::ProtocolError(err.to_string())
    }
}
