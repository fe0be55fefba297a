//! Network extraction of chunk section data for the chunk packets.
//!
//! Wire order per column: block id LSB arrays for every included section,
//! then metadata nibbles, block light, sky light (sky dimensions), the
//! high-nibble id arrays for sections that have one, and finally 256 biome
//! bytes for a full chunk.

use crate::chunk::{Chunk, NIBBLES_PER_SECTION};

/// Uncompressed section data plus the two bitmasks describing it.
pub struct ExtractedChunk {
    pub primary_bitmask: u16,
    pub add_bitmask: u16,
    pub data: Vec<u8>,
}

/// Extract the sections selected by `section_mask` (usually `0xFFFF`).
pub fn extract_chunk(chunk: &Chunk, full_chunk: bool, section_mask: u16) -> ExtractedChunk {
    let mut primary = 0u16;
    let mut add = 0u16;

    for (i, section) in chunk.sections.iter().enumerate() {
        let Some(section) = section else { continue };
        if section_mask & (1 << i) == 0 || section.is_empty() {
            continue;
        }
        primary |= 1 << i;
        if section.block_msb_array().is_some() {
            add |= 1 << i;
        }
    }

    let mut data = Vec::new();
    for (i, section) in chunk.sections.iter().enumerate() {
        if primary & (1 << i) != 0 {
            data.extend_from_slice(section.as_ref().unwrap().block_lsb_bytes());
        }
    }
    for (i, section) in chunk.sections.iter().enumerate() {
        if primary & (1 << i) != 0 {
            data.extend_from_slice(section.as_ref().unwrap().metadata_array().bytes());
        }
    }
    for (i, section) in chunk.sections.iter().enumerate() {
        if primary & (1 << i) != 0 {
            data.extend_from_slice(section.as_ref().unwrap().block_light_array().bytes());
        }
    }
    if chunk.has_sky() {
        for (i, section) in chunk.sections.iter().enumerate() {
            if primary & (1 << i) != 0 {
                match section.as_ref().unwrap().sky_light_array() {
                    Some(sky) => data.extend_from_slice(sky.bytes()),
                    None => data.extend_from_slice(&[0u8; NIBBLES_PER_SECTION]),
                }
            }
        }
    }
    for (i, section) in chunk.sections.iter().enumerate() {
        if add & (1 << i) != 0 {
            data.extend_from_slice(
                section
                    .as_ref()
                    .unwrap()
                    .block_msb_array()
                    .expect("add bit implies msb array")
                    .bytes(),
            );
        }
    }
    if full_chunk {
        data.extend_from_slice(&chunk.biomes);
    }

    ExtractedChunk {
        primary_bitmask: primary,
        add_bitmask: add,
        data,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::{Chunk, BLOCKS_PER_SECTION};
    use crate::registry::BlockRegistry;

    #[test]
    fn single_section_sizes() {
        let reg = BlockRegistry::vanilla();
        let mut chunk = Chunk::new(0, 0, true);
        chunk.set_block(1, 2, 3, 1, 0, &reg);

        let extracted = extract_chunk(&chunk, true, 0xFFFF);
        assert_eq!(extracted.primary_bitmask, 1);
        assert_eq!(extracted.add_bitmask, 0);
        // blocks + meta + block light + sky light + biomes
        assert_eq!(
            extracted.data.len(),
            BLOCKS_PER_SECTION + 3 * NIBBLES_PER_SECTION + 256
        );
        // First array is the LSB block array; index (2<<8)|(3<<4)|1.
        assert_eq!(extracted.data[(2 << 8) | (3 << 4) | 1], 1);
    }

    #[test]
    fn add_array_appended_when_high_ids_present() {
        let reg = BlockRegistry::vanilla();
        let mut chunk = Chunk::new(0, 0, true);
        chunk.set_block(0, 0, 0, 300, 0, &reg);

        let extracted = extract_chunk(&chunk, false, 0xFFFF);
        assert_eq!(extracted.primary_bitmask, 1);
        assert_eq!(extracted.add_bitmask, 1);
        // No biomes on a non-full chunk, one extra nibble array for Add.
        assert_eq!(
            extracted.data.len(),
            BLOCKS_PER_SECTION + 4 * NIBBLES_PER_SECTION
        );
        // The Add array is last; its first nibble holds 300 >> 8 = 1.
        let add_start = BLOCKS_PER_SECTION + 3 * NIBBLES_PER_SECTION;
        assert_eq!(extracted.data[add_start] & 0x0F, 1);
    }

    #[test]
    fn skyless_dimension_has_no_sky_arrays() {
        let reg = BlockRegistry::vanilla();
        let mut chunk = Chunk::new(0, 0, false);
        chunk.set_block(0, 0, 0, 1, 0, &reg);

        let extracted = extract_chunk(&chunk, false, 0xFFFF);
        assert_eq!(
            extracted.data.len(),
            BLOCKS_PER_SECTION + 2 * NIBBLES_PER_SECTION
        );
    }

    #[test]
    fn section_mask_filters() {
        let reg = BlockRegistry::vanilla();
        let mut chunk = Chunk::new(0, 0, true);
        chunk.set_block(0, 0, 0, 1, 0, &reg); // section 0
        chunk.set_block(0, 100, 0, 1, 0, &reg); // section 6

        let extracted = extract_chunk(&chunk, false, 1 << 6);
        assert_eq!(extracted.primary_bitmask, 1 << 6);
        assert_eq!(
            extracted.data.len(),
            BLOCKS_PER_SECTION + 3 * NIBBLES_PER_SECTION
        );
    }

    #[test]
    fn empty_chunk_full_is_biomes_only() {
        let chunk = Chunk::new(0, 0, true);
        let extracted = extract_chunk(&chunk, true, 0xFFFF);
        assert_eq!(extracted.primary_bitmask, 0);
        assert_eq!(extracted.data.len(), 256);
    }
}
