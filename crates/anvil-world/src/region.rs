//! Sector-packed region files (`r.<x>.<z>.mca`).
//!
//! One file holds a 32x32 grid of chunk columns. The first two 4096-byte
//! sectors are the offset and timestamp tables; each saved chunk occupies a
//! contiguous run of sectors holding a 5-byte header (`u32` payload length,
//! `u8` compression type) followed by the compressed NBT.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use flate2::read::{GzDecoder, ZlibDecoder};
use flate2::write::ZlibEncoder;
use flate2::Compression;
use tracing::warn;

use crate::error::WorldError;

pub const SECTOR_BYTES: usize = 4096;
pub const CHUNKS_PER_REGION: usize = 1024;

const COMPRESSION_GZIP: u8 = 1;
const COMPRESSION_ZLIB: u8 = 2;

/// Canonical file name for a region.
pub fn region_file_name(region_x: i32, region_z: i32) -> String {
    format!("r.{region_x}.{region_z}.mca")
}

pub struct RegionFile {
    file: File,
    /// `(sector_index << 8) | sector_count` per chunk slot; 0 = not saved.
    offsets: [u32; CHUNKS_PER_REGION],
    timestamps: [u32; CHUNKS_PER_REGION],
    /// One flag per sector in the file; true = free.
    sector_free: Vec<bool>,
}

fn table_slot(local_x: i32, local_z: i32) -> Result<usize, WorldError> {
    if !(0..32).contains(&local_x) || !(0..32).contains(&local_z) {
        return Err(WorldError::OutOfRegionBounds {
            x: local_x,
            z: local_z,
        });
    }
    Ok((local_x + local_z * 32) as usize)
}

impl RegionFile {
    /// Open or create the region file, reading both header tables and
    /// rebuilding the free-sector map.
    pub fn open(path: &Path) -> Result<Self, WorldError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;

        // Grow fresh or truncated files to the two header sectors, and pad
        // any file to a sector multiple.
        let mut len = file.metadata()?.len() as usize;
        if len < SECTOR_BYTES * 2 {
            file.seek(SeekFrom::Start(0))?;
            file.write_all(&vec![0u8; SECTOR_BYTES * 2])?;
            len = SECTOR_BYTES * 2;
        }
        if len % SECTOR_BYTES != 0 {
            let pad = SECTOR_BYTES - (len % SECTOR_BYTES);
            file.seek(SeekFrom::End(0))?;
            file.write_all(&vec![0u8; pad])?;
            len += pad;
        }

        let mut header = vec![0u8; SECTOR_BYTES * 2];
        file.seek(SeekFrom::Start(0))?;
        file.read_exact(&mut header)?;

        let mut offsets = [0u32; CHUNKS_PER_REGION];
        let mut timestamps = [0u32; CHUNKS_PER_REGION];
        for i in 0..CHUNKS_PER_REGION {
            offsets[i] = u32::from_be_bytes(header[i * 4..i * 4 + 4].try_into().unwrap());
            let t = SECTOR_BYTES + i * 4;
            timestamps[i] = u32::from_be_bytes(header[t..t + 4].try_into().unwrap());
        }

        let sector_count = len / SECTOR_BYTES;
        let mut sector_free = vec![true; sector_count];
        sector_free[0] = false;
        sector_free[1] = false;
        for slot in 0..offsets.len() {
            let offset = offsets[slot];
            if offset == 0 {
                continue;
            }
            let start = (offset >> 8) as usize;
            let count = (offset & 0xFF) as usize;
            if start + count > sector_count {
                warn!(slot, "region offset entry points past end of file, dropping");
                offsets[slot] = 0;
                continue;
            }
            for sector in start..start + count {
                sector_free[sector] = false;
            }
        }

        Ok(Self {
            file,
            offsets,
            timestamps,
            sector_free,
        })
    }

    pub fn is_chunk_saved(&self, local_x: i32, local_z: i32) -> bool {
        table_slot(local_x, local_z)
            .map(|slot| self.offsets[slot] != 0)
            .unwrap_or(false)
    }

    /// Read and decompress a chunk payload. `Ok(None)` means "not saved".
    pub fn read_chunk(&mut self, local_x: i32, local_z: i32) -> Result<Option<Vec<u8>>, WorldError> {
        let slot = table_slot(local_x, local_z)?;
        let offset = self.offsets[slot];
        if offset == 0 {
            return Ok(None);
        }
        let start = (offset >> 8) as usize;
        let count = (offset & 0xFF) as usize;

        self.file
            .seek(SeekFrom::Start((start * SECTOR_BYTES) as u64))?;
        let mut header = [0u8; 5];
        self.file.read_exact(&mut header)?;
        let length = u32::from_be_bytes(header[..4].try_into().unwrap()) as usize;
        let compression = header[4];

        if length < 1 || length > count * SECTOR_BYTES {
            return Err(WorldError::CorruptRegion(format!(
                "chunk ({local_x}, {local_z}) declares {length} bytes in {count} sectors"
            )));
        }

        let mut compressed = vec![0u8; length - 1];
        self.file.read_exact(&mut compressed)?;

        let mut raw = Vec::new();
        match compression {
            COMPRESSION_ZLIB => ZlibDecoder::new(compressed.as_slice())
                .read_to_end(&mut raw)
                .map_err(|e| WorldError::Zlib(e.to_string()))?,
            COMPRESSION_GZIP => GzDecoder::new(compressed.as_slice())
                .read_to_end(&mut raw)
                .map_err(|e| WorldError::Zlib(e.to_string()))?,
            other => {
                return Err(WorldError::CorruptRegion(format!(
                    "unknown compression type {other}"
                )))
            }
        };
        Ok(Some(raw))
    }

    /// Compress and write a chunk payload, reusing or reallocating its
    /// sector run, then update both header tables.
    pub fn write_chunk(
        &mut self,
        local_x: i32,
        local_z: i32,
        data: &[u8],
    ) -> Result<(), WorldError> {
        let slot = table_slot(local_x, local_z)?;

        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder
            .write_all(data)
            .map_err(|e| WorldError::Zlib(e.to_string()))?;
        let compressed = encoder
            .finish()
            .map_err(|e| WorldError::Zlib(e.to_string()))?;

        let total = 5 + compressed.len();
        let sectors_needed = total.div_ceil(SECTOR_BYTES);
        if sectors_needed >= 256 {
            return Err(WorldError::ChunkTooLarge {
                sectors: sectors_needed,
            });
        }

        let old = self.offsets[slot];
        let old_start = (old >> 8) as usize;
        let old_count = (old & 0xFF) as usize;

        let start = if old != 0 && old_count == sectors_needed {
            // Same footprint: overwrite in place.
            old_start
        } else {
            if old != 0 {
                for sector in old_start..old_start + old_count {
                    self.sector_free[sector] = true;
                }
            }
            match self.find_free_run(sectors_needed) {
                Some(start) => start,
                None => {
                    let start = self.sector_free.len();
                    self.sector_free
                        .extend(std::iter::repeat(true).take(sectors_needed));
                    start
                }
            }
        };

        for sector in start..start + sectors_needed {
            self.sector_free[sector] = false;
        }

        // Header + payload + zero padding to the sector boundary.
        let mut block = Vec::with_capacity(sectors_needed * SECTOR_BYTES);
        block.extend_from_slice(&((compressed.len() + 1) as u32).to_be_bytes());
        block.push(COMPRESSION_ZLIB);
        block.extend_from_slice(&compressed);
        block.resize(sectors_needed * SECTOR_BYTES, 0);

        self.file
            .seek(SeekFrom::Start((start * SECTOR_BYTES) as u64))?;
        self.file.write_all(&block)?;

        self.offsets[slot] = ((start as u32) << 8) | sectors_needed as u32;
        self.timestamps[slot] = unix_seconds();
        self.write_table_entry(slot)?;
        self.file.flush()?;
        Ok(())
    }

    fn write_table_entry(&mut self, slot: usize) -> Result<(), WorldError> {
        self.file.seek(SeekFrom::Start((slot * 4) as u64))?;
        self.file.write_all(&self.offsets[slot].to_be_bytes())?;
        self.file
            .seek(SeekFrom::Start((SECTOR_BYTES + slot * 4) as u64))?;
        self.file.write_all(&self.timestamps[slot].to_be_bytes())?;
        Ok(())
    }

    /// Smallest sufficient run of free sectors; ties break at the lowest
    /// start index. None when nothing fits and the file must grow.
    fn find_free_run(&self, needed: usize) -> Option<usize> {
        let mut best: Option<(usize, usize)> = None;
        let mut run_start = 0usize;
        let mut run_len = 0usize;
        for i in 2..=self.sector_free.len() {
            let free = i < self.sector_free.len() && self.sector_free[i];
            if free {
                if run_len == 0 {
                    run_start = i;
                }
                run_len += 1;
            } else {
                if run_len >= needed {
                    let better = match best {
                        Some((_, len)) => run_len < len,
                        None => true,
                    };
                    if better {
                        best = Some((run_start, run_len));
                    }
                }
                run_len = 0;
            }
        }
        best.map(|(start, _)| start)
    }

    /// Sector occupancy for a chunk slot, for tests and diagnostics.
    pub fn chunk_sectors(&self, local_x: i32, local_z: i32) -> Option<(usize, usize)> {
        let slot = table_slot(local_x, local_z).ok()?;
        let offset = self.offsets[slot];
        if offset == 0 {
            return None;
        }
        Some(((offset >> 8) as usize, (offset & 0xFF) as usize))
    }

    /// Whether a sector is free, for tests and diagnostics.
    pub fn is_sector_free(&self, sector: usize) -> bool {
        self.sector_free.get(sector).copied().unwrap_or(true)
    }
}

fn unix_seconds() -> u32 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as u32
}
