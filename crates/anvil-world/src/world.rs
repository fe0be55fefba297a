//! One world per dimension: clock, spawn, and block access over the
//! chunk provider.

use std::path::PathBuf;
use std::sync::Arc;

use crate::chunk::Chunk;
use crate::error::WorldError;
use crate::generator::ChunkGenerator;
use crate::provider::ChunkProvider;
use crate::registry::BlockRegistry;

pub const DAY_LENGTH: i64 = 24000;

pub struct World {
    dimension: i32,
    seed: i64,
    spawn: (i32, i32, i32),
    /// Total ticks this world has ever simulated.
    total_time: i64,
    /// Advances with the clock; commands may set it.
    day_time: i64,
    provider: ChunkProvider,
}

impl World {
    pub fn new(
        dimension: i32,
        seed: i64,
        region_dir: PathBuf,
        generator: Box<dyn ChunkGenerator>,
        registry: Arc<BlockRegistry>,
    ) -> Self {
        let has_sky = dimension != -1;
        Self {
            dimension,
            seed,
            spawn: (0, 64, 0),
            total_time: 0,
            day_time: 0,
            provider: ChunkProvider::new(region_dir, generator, registry, has_sky),
        }
    }

    pub fn dimension(&self) -> i32 {
        self.dimension
    }

    pub fn seed(&self) -> i64 {
        self.seed
    }

    /// The nether has no sky light.
    pub fn has_sky(&self) -> bool {
        self.dimension != -1
    }

    pub fn provider(&self) -> &ChunkProvider {
        &self.provider
    }

    pub fn registry(&self) -> &Arc<BlockRegistry> {
        self.provider.registry()
    }

    // --- clock -----------------------------------------------------------

    pub fn total_time(&self) -> i64 {
        self.total_time
    }

    pub fn time_of_day(&self) -> i64 {
        self.day_time.rem_euclid(DAY_LENGTH)
    }

    pub fn day_time(&self) -> i64 {
        self.day_time
    }

    pub fn set_day_time(&mut self, time: i64) {
        self.day_time = time;
    }

    pub fn set_clock(&mut self, total: i64, day: i64) {
        self.total_time = total;
        self.day_time = day;
    }

    /// Advance the clock one tick and process queued unloads.
    pub fn tick(&mut self, unload_budget: usize) -> usize {
        self.total_time += 1;
        self.day_time += 1;
        self.provider.tick_unloads(unload_budget)
    }

    // --- spawn -----------------------------------------------------------

    pub fn spawn(&self) -> (i32, i32, i32) {
        self.spawn
    }

    pub fn set_spawn(&mut self, x: i32, y: i32, z: i32) {
        self.spawn = (x, y, z);
        self.provider.set_spawn_chunk(x >> 4, z >> 4);
    }

    // --- block access ----------------------------------------------------

    /// Block id and metadata at world coordinates; air when y is out of
    /// range or the chunk is not loaded.
    pub fn get_block(&self, x: i32, y: i32, z: i32) -> (u16, u8) {
        if !(0..256).contains(&y) {
            return (0, 0);
        }
        self.provider
            .with_chunk(x >> 4, z >> 4, |chunk| {
                chunk.block((x & 15) as usize, y, (z & 15) as usize)
            })
            .unwrap_or((0, 0))
    }

    /// Write a block into a loaded chunk. Returns false when y is out of
    /// range or the chunk is not resident.
    pub fn set_block(&self, x: i32, y: i32, z: i32, id: u16, meta: u8) -> bool {
        if !(0..256).contains(&y) {
            return false;
        }
        let registry = self.provider.registry().clone();
        self.provider
            .with_chunk_mut(x >> 4, z >> 4, |chunk| {
                chunk.set_block((x & 15) as usize, y, (z & 15) as usize, id, meta, &registry)
            })
            .unwrap_or(false)
    }

    /// Height-map value at world coordinates (0 when unloaded).
    pub fn height(&self, x: i32, z: i32) -> i32 {
        self.provider
            .with_chunk(x >> 4, z >> 4, |chunk| {
                chunk.height((x & 15) as usize, (z & 15) as usize)
            })
            .unwrap_or(0)
    }

    pub fn load_chunk(&self, chunk_x: i32, chunk_z: i32) -> Result<(), WorldError> {
        self.provider.load(chunk_x, chunk_z)
    }

    pub fn with_chunk<R>(&self, chunk_x: i32, chunk_z: i32, f: impl FnOnce(&Chunk) -> R) -> Option<R> {
        self.provider.with_chunk(chunk_x, chunk_z, f)
    }

    pub fn save_all(&self) -> usize {
        self.provider.save_all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::FlatGenerator;
    use std::path::PathBuf;

    fn temp_world(tag: &str) -> (World, PathBuf) {
        let dir = std::env::temp_dir().join(format!("anvil_world_{}_{}", std::process::id(), tag));
        std::fs::create_dir_all(&dir).unwrap();
        let registry = Arc::new(BlockRegistry::vanilla());
        let generator = Box::new(FlatGenerator::new(registry.clone(), true));
        let world = World::new(0, 42, dir.join("region"), generator, registry);
        (world, dir)
    }

    #[test]
    fn clock_advances_and_wraps() {
        let (mut world, dir) = temp_world("clock");
        for _ in 0..DAY_LENGTH + 5 {
            world.tick(0);
        }
        assert_eq!(world.total_time(), DAY_LENGTH + 5);
        assert_eq!(world.time_of_day(), 5);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn negative_coordinates_map_to_chunks() {
        let (world, dir) = temp_world("negative");
        world.load_chunk(-1, -1).unwrap();
        assert_eq!(world.get_block(-1, 3, -1), (2, 0)); // grass in chunk (-1,-1)
        assert!(world.set_block(-5, 70, -5, 1, 0));
        assert_eq!(world.get_block(-5, 70, -5), (1, 0));
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn unloaded_reads_air_and_writes_fail() {
        let (world, dir) = temp_world("unloaded");
        assert_eq!(world.get_block(1000, 64, 1000), (0, 0));
        assert!(!world.set_block(1000, 64, 1000, 1, 0));
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn out_of_range_y() {
        let (world, dir) = temp_world("yrange");
        world.load_chunk(0, 0).unwrap();
        assert_eq!(world.get_block(0, -1, 0), (0, 0));
        assert_eq!(world.get_block(0, 256, 0), (0, 0));
        assert!(!world.set_block(0, 300, 0, 1, 0));
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn set_get_survives_region_cycle() {
        let (mut world, dir) = temp_world("cycle");
        world.set_spawn(2000, 4, 2000); // keep chunk (0,0) evictable
        world.load_chunk(0, 0).unwrap();
        assert!(world.set_block(5, 70, 3, 1, 0));
        assert_eq!(world.get_block(5, 70, 3), (1, 0));

        world.provider().drop_chunk(0, 0);
        world.provider().tick_unloads(16);
        assert_eq!(world.get_block(5, 70, 3), (0, 0)); // unloaded reads air

        world.load_chunk(0, 0).unwrap();
        assert_eq!(world.get_block(5, 70, 3), (1, 0));
        std::fs::remove_dir_all(&dir).ok();
    }
}
