//! Chunk cache: load, generate, evict.
//!
//! The chunk map is behind a reader-writer lock; disk reads and generation
//! happen outside any lock, with a re-check on insert. Region files live in
//! a pool with one mutex per file.

use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, RwLock};

use tracing::{debug, warn};

use crate::anvil;
use crate::chunk::Chunk;
use crate::error::WorldError;
use crate::generator::ChunkGenerator;
use crate::region::{region_file_name, RegionFile};
use crate::registry::BlockRegistry;

/// Chunks within this Chebyshev distance of spawn never unload.
pub const SPAWN_ANCHOR_RADIUS: i32 = 12;

/// Region files for one dimension, opened lazily and each behind its own
/// mutex.
pub struct RegionPool {
    dir: PathBuf,
    files: Mutex<HashMap<(i32, i32), Arc<Mutex<RegionFile>>>>,
}

impl RegionPool {
    pub fn new(dir: PathBuf) -> Self {
        Self {
            dir,
            files: Mutex::new(HashMap::new()),
        }
    }

    fn file_for_chunk(&self, chunk_x: i32, chunk_z: i32) -> Result<Arc<Mutex<RegionFile>>, WorldError> {
        let key = (chunk_x >> 5, chunk_z >> 5);
        let mut files = self.files.lock().expect("region pool lock");
        if let Some(file) = files.get(&key) {
            return Ok(file.clone());
        }
        let path = self.dir.join(region_file_name(key.0, key.1));
        let file = Arc::new(Mutex::new(RegionFile::open(&path)?));
        files.insert(key, file.clone());
        Ok(file)
    }

    /// Decompressed chunk NBT bytes, or `None` when never saved.
    pub fn read_chunk_nbt(&self, chunk_x: i32, chunk_z: i32) -> Result<Option<Vec<u8>>, WorldError> {
        let file = self.file_for_chunk(chunk_x, chunk_z)?;
        let mut file = file.lock().expect("region file lock");
        file.read_chunk(chunk_x & 31, chunk_z & 31)
    }

    pub fn write_chunk_nbt(&self, chunk_x: i32, chunk_z: i32, data: &[u8]) -> Result<(), WorldError> {
        let file = self.file_for_chunk(chunk_x, chunk_z)?;
        let mut file = file.lock().expect("region file lock");
        file.write_chunk(chunk_x & 31, chunk_z & 31, data)
    }
}

/// The chunk cache for one world.
pub struct ChunkProvider {
    chunks: RwLock<HashMap<(i32, i32), Chunk>>,
    unload_queue: Mutex<VecDeque<(i32, i32)>>,
    regions: RegionPool,
    generator: Box<dyn ChunkGenerator>,
    registry: Arc<BlockRegistry>,
    has_sky: bool,
    spawn_chunk: Mutex<(i32, i32)>,
}

impl ChunkProvider {
    pub fn new(
        region_dir: PathBuf,
        generator: Box<dyn ChunkGenerator>,
        registry: Arc<BlockRegistry>,
        has_sky: bool,
    ) -> Self {
        Self {
            chunks: RwLock::new(HashMap::new()),
            unload_queue: Mutex::new(VecDeque::new()),
            regions: RegionPool::new(region_dir),
            generator,
            registry,
            has_sky,
            spawn_chunk: Mutex::new((0, 0)),
        }
    }

    pub fn registry(&self) -> &Arc<BlockRegistry> {
        &self.registry
    }

    pub fn generator(&self) -> &dyn ChunkGenerator {
        self.generator.as_ref()
    }

    /// Anchor point for the unload exemption, in chunk coordinates.
    pub fn set_spawn_chunk(&self, chunk_x: i32, chunk_z: i32) {
        *self.spawn_chunk.lock().expect("spawn lock") = (chunk_x, chunk_z);
    }

    pub fn is_loaded(&self, chunk_x: i32, chunk_z: i32) -> bool {
        self.chunks
            .read()
            .expect("chunk map lock")
            .contains_key(&(chunk_x, chunk_z))
    }

    /// Run `f` against a loaded chunk under the shared lock. No I/O, no
    /// generation.
    pub fn with_chunk<R>(
        &self,
        chunk_x: i32,
        chunk_z: i32,
        f: impl FnOnce(&Chunk) -> R,
    ) -> Option<R> {
        let chunks = self.chunks.read().expect("chunk map lock");
        chunks.get(&(chunk_x, chunk_z)).map(f)
    }

    /// Run `f` against a loaded chunk under the exclusive lock.
    pub fn with_chunk_mut<R>(
        &self,
        chunk_x: i32,
        chunk_z: i32,
        f: impl FnOnce(&mut Chunk) -> R,
    ) -> Option<R> {
        let mut chunks = self.chunks.write().expect("chunk map lock");
        chunks.get_mut(&(chunk_x, chunk_z)).map(f)
    }

    /// Ensure a chunk is resident: cache hit, else disk, else generator.
    /// Cancels any pending eviction of the chunk.
    pub fn load(&self, chunk_x: i32, chunk_z: i32) -> Result<(), WorldError> {
        self.cancel_drop(chunk_x, chunk_z);
        if self.is_loaded(chunk_x, chunk_z) {
            return Ok(());
        }

        // Disk and generator work happen outside the map lock.
        let chunk = match self.regions.read_chunk_nbt(chunk_x, chunk_z) {
            Ok(Some(bytes)) => {
                match anvil_nbt::read_nbt(&mut bytes.as_slice())
                    .map_err(WorldError::from)
                    .and_then(|root| anvil::chunk_from_nbt(&root, self.has_sky, &self.registry))
                {
                    Ok(chunk) => chunk,
                    Err(e) => {
                        warn!(chunk_x, chunk_z, error = %e, "corrupt chunk on disk, regenerating");
                        self.generator.generate(chunk_x, chunk_z)
                    }
                }
            }
            Ok(None) => self.generator.generate(chunk_x, chunk_z),
            Err(e) => {
                warn!(chunk_x, chunk_z, error = %e, "region read failed, regenerating");
                self.generator.generate(chunk_x, chunk_z)
            }
        };

        let mut chunks = self.chunks.write().expect("chunk map lock");
        chunks.entry((chunk_x, chunk_z)).or_insert(chunk);
        Ok(())
    }

    /// Queue a chunk for eviction. Spawn-anchored chunks refuse silently.
    pub fn drop_chunk(&self, chunk_x: i32, chunk_z: i32) {
        let (sx, sz) = *self.spawn_chunk.lock().expect("spawn lock");
        if (chunk_x - sx).abs() <= SPAWN_ANCHOR_RADIUS && (chunk_z - sz).abs() <= SPAWN_ANCHOR_RADIUS
        {
            return;
        }
        let mut queue = self.unload_queue.lock().expect("unload queue lock");
        if !queue.contains(&(chunk_x, chunk_z)) {
            queue.push_back((chunk_x, chunk_z));
        }
    }

    fn cancel_drop(&self, chunk_x: i32, chunk_z: i32) {
        let mut queue = self.unload_queue.lock().expect("unload queue lock");
        queue.retain(|&coords| coords != (chunk_x, chunk_z));
    }

    /// Process up to `budget` queued evictions, writing dirty chunks back.
    /// A failed save keeps the chunk resident for the next cycle. Returns
    /// the number of chunks actually unloaded.
    pub fn tick_unloads(&self, budget: usize) -> usize {
        let mut unloaded = 0;
        for _ in 0..budget {
            let coords = {
                let mut queue = self.unload_queue.lock().expect("unload queue lock");
                match queue.pop_front() {
                    Some(c) => c,
                    None => break,
                }
            };

            let mut chunks = self.chunks.write().expect("chunk map lock");
            let Some(chunk) = chunks.remove(&coords) else {
                continue;
            };
            if chunk.dirty {
                if let Err(e) = self.save_chunk(&chunk) {
                    warn!(chunk_x = coords.0, chunk_z = coords.1, error = %e,
                          "chunk save failed, keeping loaded");
                    chunks.insert(coords, chunk);
                    continue;
                }
            }
            debug!(chunk_x = coords.0, chunk_z = coords.1, "chunk unloaded");
            unloaded += 1;
        }
        unloaded
    }

    fn save_chunk(&self, chunk: &Chunk) -> Result<(), WorldError> {
        let root = anvil::chunk_to_nbt(chunk);
        let mut bytes = Vec::new();
        anvil_nbt::write_nbt(&mut bytes, &root);
        self.regions
            .write_chunk_nbt(chunk.chunk_x, chunk.chunk_z, &bytes)
    }

    /// Write every dirty chunk back to disk, clearing dirty flags on
    /// success. Failures are logged and left dirty for the next cycle.
    pub fn save_all(&self) -> usize {
        let mut chunks = self.chunks.write().expect("chunk map lock");
        let mut saved = 0;
        for chunk in chunks.values_mut() {
            if !chunk.dirty {
                continue;
            }
            match self.save_chunk(chunk) {
                Ok(()) => {
                    chunk.dirty = false;
                    saved += 1;
                }
                Err(e) => {
                    warn!(chunk_x = chunk.chunk_x, chunk_z = chunk.chunk_z, error = %e,
                          "chunk save failed");
                }
            }
        }
        saved
    }

    pub fn loaded_count(&self) -> usize {
        self.chunks.read().expect("chunk map lock").len()
    }

    pub fn loaded_coords(&self) -> Vec<(i32, i32)> {
        self.chunks
            .read()
            .expect("chunk map lock")
            .keys()
            .copied()
            .collect()
    }

    pub fn pending_unloads(&self) -> usize {
        self.unload_queue.lock().expect("unload queue lock").len()
    }
}
