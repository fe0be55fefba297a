//! World storage error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorldError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("nbt error: {0}")]
    Nbt(#[from] anvil_nbt::NbtError),

    #[error("zlib error: {0}")]
    Zlib(String),

    #[error("chunk local coords ({x}, {z}) out of region bounds")]
    OutOfRegionBounds { x: i32, z: i32 },

    #[error("chunk needs {sectors} sectors, limit is 255")]
    ChunkTooLarge { sectors: usize },

    #[error("corrupt region header: {0}")]
    CorruptRegion(String),

    #[error("chunk NBT missing {0}")]
    MissingTag(&'static str),
}
