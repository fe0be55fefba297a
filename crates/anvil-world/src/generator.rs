//! Chunk generation interface and the built-in superflat generator.

use std::sync::Arc;

use crate::chunk::Chunk;
use crate::registry::BlockRegistry;

/// Produces a chunk for given coordinates. Terrain, caves, ores and the
/// rest live behind this trait; the core only ever asks for whole columns.
pub trait ChunkGenerator: Send + Sync {
    fn generate(&self, chunk_x: i32, chunk_z: i32) -> Chunk;

    /// Generator description, used for `level.dat` and logs.
    fn name(&self) -> &str;

    /// Ground level a new player spawns on.
    fn surface_y(&self) -> i32;
}

/// Superflat: bedrock, two dirt, grass on top.
pub struct FlatGenerator {
    layers: Vec<(u16, u8)>,
    registry: Arc<BlockRegistry>,
    has_sky: bool,
}

impl FlatGenerator {
    pub fn new(registry: Arc<BlockRegistry>, has_sky: bool) -> Self {
        Self {
            layers: vec![(7, 0), (3, 0), (3, 0), (2, 0)],
            registry,
            has_sky,
        }
    }

    /// Custom layer stack, bottom first.
    pub fn with_layers(registry: Arc<BlockRegistry>, has_sky: bool, layers: Vec<(u16, u8)>) -> Self {
        Self {
            layers,
            registry,
            has_sky,
        }
    }
}

impl ChunkGenerator for FlatGenerator {
    fn generate(&self, chunk_x: i32, chunk_z: i32) -> Chunk {
        let mut chunk = Chunk::new(chunk_x, chunk_z, self.has_sky);
        for (y, &(id, meta)) in self.layers.iter().enumerate() {
            for z in 0..16 {
                for x in 0..16 {
                    chunk.set_block(x, y as i32, z, id, meta, &self.registry);
                }
            }
        }
        // Plains everywhere, full daylight above the surface.
        chunk.biomes = [1; 256];
        if self.has_sky {
            let surface = self.layers.len() as i32;
            for section in chunk.sections.iter_mut().flatten() {
                let base = section.y_index() as i32 * 16;
                for y in 0..16 {
                    if base + y < surface {
                        continue;
                    }
                    for z in 0..16 {
                        for x in 0..16 {
                            section.set_sky_light(x, y as usize, z, 15);
                        }
                    }
                }
            }
        }
        chunk.terrain_populated = true;
        chunk.light_populated = true;
        chunk.dirty = true;
        chunk
    }

    fn name(&self) -> &str {
        "flat"
    }

    fn surface_y(&self) -> i32 {
        self.layers.len() as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_layers() {
        let reg = Arc::new(BlockRegistry::vanilla());
        let generator = FlatGenerator::new(reg, true);
        let chunk = generator.generate(0, 0);
        assert_eq!(chunk.block(0, 0, 0), (7, 0)); // bedrock
        assert_eq!(chunk.block(8, 1, 8), (3, 0)); // dirt
        assert_eq!(chunk.block(15, 3, 15), (2, 0)); // grass
        assert_eq!(chunk.block(0, 4, 0), (0, 0)); // air above
        assert_eq!(chunk.height(7, 7), 4);
        assert!(chunk.terrain_populated);
        assert_eq!(chunk.biomes[0], 1);
        assert_eq!(generator.surface_y(), 4);
    }

    #[test]
    fn coordinates_pass_through() {
        let reg = Arc::new(BlockRegistry::vanilla());
        let generator = FlatGenerator::new(reg, true);
        let chunk = generator.generate(-7, 12);
        assert_eq!(chunk.chunk_x, -7);
        assert_eq!(chunk.chunk_z, 12);
    }
}
