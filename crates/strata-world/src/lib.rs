//! In-memory voxel world: block storage, lighting and the update batch that
//! lets readers see a consistent snapshot while the network keeps writing.

pub mod block;
pub mod chunk;
pub mod diagnostics;
pub mod engine;
pub mod error;
pub mod event;
pub mod heightmap;
pub mod lighting;
pub mod packed;
pub mod section;
pub mod terrain;
pub mod world;

pub use block::{BlockId, BlockRegistry, LightMaterial, AIR};
pub use chunk::{BlockEntity, Chunk, ChunkUpdate, CHUNK_HEIGHT, NUM_SECTIONS};
pub use diagnostics::{Diagnostics, DiagnosticsSnapshot};
pub use engine::LightingEngine;
pub use error::{ChunkError, DecodeSectionError};
pub use event::{Event, EventBatch, WorldUpdate};
pub use heightmap::HeightMap;
pub use lighting::{ChunkLighting, ChunkLightingUpdateData, LightLevel};
pub use section::{DecodedSection, Section};
pub use terrain::{ChunkPlacement, LightingOutcome, Terrain};
pub use world::{World, WorldInfo, TICKS_PER_DAY};
