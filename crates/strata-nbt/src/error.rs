use std::error::Error;
use std::fmt;
use std::io;

#[derive(Debug)]
pub enum NbtError {
    Io(io::Error),
    InvalidTagType(u8),
    /// A list announced a negative element count.
    NegativeListLength(i32),
    NegativeArrayLength(i32),
    InvalidUtf8,
    /// A list whose items do not all share the declared element type.
    HeterogeneousList,
    /// A name or string payload longer than an unsigned 16-bit length prefix allows.
    StringTooLong(usize),
    MissingField(String),
    RootNotCompound,
    DepthLimitExceeded,
}

impl fmt::Display for NbtError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NbtError::Io(err) => write!(f, "IO error: {}", err),
            NbtError::InvalidTagType(id) => write!(f, "Invalid tag type: {}", id),
            NbtError::NegativeListLength(length) => {
                write!(f, "List has negative length {}", length)
            }
            NbtError::NegativeArrayLength(length) => {
                write!(f, "Array has negative length {}", length)
            }
            NbtError::InvalidUtf8 => write!(f, "String is not valid UTF-8"),
            NbtError::HeterogeneousList => write!(f, "List items do not share one tag type"),
            NbtError::StringTooLong(length) => write!(f, "String of {} bytes is too long", length),
            NbtError::MissingField(name) => write!(f, "Missing field '{}'", name),
            NbtError::RootNotCompound => write!(f, "Root tag is not a compound"),
            NbtError::DepthLimitExceeded => write!(f, "Tag nesting is too deep"),
        }
    }
}

impl Error for NbtError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            NbtError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for NbtError {
    fn from(err: io::Error) -> Self {
        NbtError::Io(err)
    }
}
