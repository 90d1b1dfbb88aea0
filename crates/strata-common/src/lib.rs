pub mod error;
pub mod position;
pub mod types;

pub use error::StrataError;
pub use position::{BlockPosition, CardinalDirection, ChunkPosition, Direction};
pub use types::Result;
