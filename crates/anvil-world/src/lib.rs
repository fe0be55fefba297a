//! Chunked voxel world store for a 1.7.10 server.
//!
//! Columns of 16 sparse sections with parallel block/metadata/light arrays,
//! persisted as zlib NBT inside sector-packed region files, cached by a
//! provider that loads from disk or a generator and evicts on a budget.

pub mod anvil;
pub mod chunk;
pub mod error;
pub mod generator;
pub mod level;
pub mod provider;
pub mod region;
pub mod registry;
pub mod tick;
pub mod wire;
pub mod world;

pub use chunk::{Chunk, ChunkSection, NibbleArray};
pub use error::WorldError;
pub use generator::{ChunkGenerator, FlatGenerator};
pub use level::LevelDat;
pub use provider::ChunkProvider;
pub use registry::{BlockRegistry, ItemRegistry};
pub use tick::TickScheduler;
pub use world::World;
