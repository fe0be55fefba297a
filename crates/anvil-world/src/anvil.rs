//! Chunk column <-> NBT (the `Level` compound stored in region files).

use anvil_nbt::{NbtCompound, NbtRoot, NbtTag};

use crate::chunk::{Chunk, ChunkSection, NibbleArray, BLOCKS_PER_SECTION, SECTION_COUNT};
use crate::error::WorldError;
use crate::registry::BlockRegistry;

fn bytes_to_i8(data: &[u8]) -> Vec<i8> {
    data.iter().map(|&b| b as i8).collect()
}

fn i8_to_bytes(data: &[i8]) -> Vec<u8> {
    data.iter().map(|&b| b as u8).collect()
}

/// Serialize a chunk as `{ Level: { ... } }`.
///
/// Sections whose arrays are entirely zero are omitted, and `Add` is written
/// only when some id exceeds 255.
pub fn chunk_to_nbt(chunk: &Chunk) -> NbtRoot {
    let mut level = NbtCompound::new();
    level.insert("xPos".into(), NbtTag::Int(chunk.chunk_x));
    level.insert("zPos".into(), NbtTag::Int(chunk.chunk_z));
    level.insert("LastUpdate".into(), NbtTag::Long(chunk.last_update));
    level.insert(
        "HeightMap".into(),
        NbtTag::IntArray(chunk.height_map.to_vec()),
    );
    level.insert(
        "TerrainPopulated".into(),
        NbtTag::Byte(chunk.terrain_populated as i8),
    );
    level.insert(
        "LightPopulated".into(),
        NbtTag::Byte(chunk.light_populated as i8),
    );
    level.insert("InhabitedTime".into(), NbtTag::Long(chunk.inhabited_time));
    level.insert(
        "Biomes".into(),
        NbtTag::ByteArray(bytes_to_i8(&chunk.biomes)),
    );

    let mut sections = Vec::new();
    for section in chunk.sections.iter().flatten() {
        if section.is_all_zero() {
            continue;
        }
        let mut tag = NbtCompound::new();
        tag.insert("Y".into(), NbtTag::Byte(section.y_index() as i8));
        tag.insert(
            "Blocks".into(),
            NbtTag::ByteArray(bytes_to_i8(section.block_lsb_bytes())),
        );
        if let Some(msb) = section.block_msb_array() {
            tag.insert("Add".into(), NbtTag::ByteArray(bytes_to_i8(msb.bytes())));
        }
        tag.insert(
            "Data".into(),
            NbtTag::ByteArray(bytes_to_i8(section.metadata_array().bytes())),
        );
        tag.insert(
            "BlockLight".into(),
            NbtTag::ByteArray(bytes_to_i8(section.block_light_array().bytes())),
        );
        if let Some(sky) = section.sky_light_array() {
            tag.insert(
                "SkyLight".into(),
                NbtTag::ByteArray(bytes_to_i8(sky.bytes())),
            );
        }
        sections.push(NbtTag::Compound(tag));
    }
    level.insert("Sections".into(), NbtTag::List(sections));
    level.insert("Entities".into(), NbtTag::List(chunk.entities.clone()));
    level.insert(
        "TileEntities".into(),
        NbtTag::List(chunk.tile_entities.clone()),
    );

    let mut root = NbtCompound::new();
    root.insert("Level".into(), NbtTag::Compound(level));
    NbtRoot::new("", root)
}

/// Rebuild a chunk from its `Level` compound.
///
/// Sections may arrive in any Y order, `Add` may be absent, and ref counts
/// are recomputed from the arrays.
pub fn chunk_from_nbt(
    root: &NbtRoot,
    has_sky: bool,
    registry: &BlockRegistry,
) -> Result<Chunk, WorldError> {
    let level = root
        .compound
        .get("Level")
        .and_then(|t| t.as_compound())
        .ok_or(WorldError::MissingTag("Level"))?;

    let chunk_x = level
        .get("xPos")
        .and_then(|t| t.as_int())
        .ok_or(WorldError::MissingTag("xPos"))?;
    let chunk_z = level
        .get("zPos")
        .and_then(|t| t.as_int())
        .ok_or(WorldError::MissingTag("zPos"))?;

    let mut chunk = Chunk::new(chunk_x, chunk_z, has_sky);
    chunk.last_update = level
        .get("LastUpdate")
        .and_then(|t| t.as_long())
        .unwrap_or(0);
    chunk.terrain_populated = level
        .get("TerrainPopulated")
        .and_then(|t| t.as_byte())
        .unwrap_or(0)
        != 0;
    chunk.light_populated = level
        .get("LightPopulated")
        .and_then(|t| t.as_byte())
        .unwrap_or(0)
        != 0;
    chunk.inhabited_time = level
        .get("InhabitedTime")
        .and_then(|t| t.as_long())
        .unwrap_or(0);

    if let Some(biomes) = level.get("Biomes").and_then(|t| t.as_byte_array()) {
        if biomes.len() == 256 {
            let bytes = i8_to_bytes(biomes);
            chunk.biomes.copy_from_slice(&bytes);
        }
    }

    if let Some(sections) = level.get("Sections").and_then(|t| t.as_list()) {
        for tag in sections {
            let Some(compound) = tag.as_compound() else {
                continue;
            };
            let y = compound.get("Y").and_then(|t| t.as_byte()).unwrap_or(-1);
            if !(0..SECTION_COUNT as i8).contains(&y) {
                continue;
            }
            let mut section = ChunkSection::new(y as u8, has_sky);

            if let Some(blocks) = compound.get("Blocks").and_then(|t| t.as_byte_array()) {
                if blocks.len() == BLOCKS_PER_SECTION {
                    section.set_block_lsb_bytes(i8_to_bytes(blocks));
                }
            }
            if let Some(add) = compound.get("Add").and_then(|t| t.as_byte_array()) {
                section.set_block_msb_array(Some(NibbleArray::from_bytes(i8_to_bytes(add))));
            }
            if let Some(data) = compound.get("Data").and_then(|t| t.as_byte_array()) {
                section.set_metadata_array(NibbleArray::from_bytes(i8_to_bytes(data)));
            }
            if let Some(light) = compound.get("BlockLight").and_then(|t| t.as_byte_array()) {
                section.set_block_light_array(NibbleArray::from_bytes(i8_to_bytes(light)));
            }
            if has_sky {
                if let Some(sky) = compound.get("SkyLight").and_then(|t| t.as_byte_array()) {
                    section.set_sky_light_array(Some(NibbleArray::from_bytes(i8_to_bytes(sky))));
                }
            }

            section.recalc_ref_counts(registry);
            chunk.sections[y as usize] = Some(Box::new(section));
        }
    }

    if let Some(height) = level.get("HeightMap").and_then(|t| t.as_int_array()) {
        if height.len() == 256 {
            chunk.height_map.copy_from_slice(height);
        } else {
            chunk.recalc_height_map(registry);
        }
    } else {
        chunk.recalc_height_map(registry);
    }

    if let Some(entities) = level.get("Entities").and_then(|t| t.as_list()) {
        chunk.entities = entities.to_vec();
    }
    if let Some(tiles) = level.get("TileEntities").and_then(|t| t.as_list()) {
        chunk.tile_entities = tiles.to_vec();
    }

    Ok(chunk)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> BlockRegistry {
        BlockRegistry::vanilla()
    }

    fn sample_chunk(reg: &BlockRegistry) -> Chunk {
        let mut chunk = Chunk::new(3, -2, true);
        for x in 0..16 {
            for z in 0..16 {
                chunk.set_block(x, 0, z, 7, 0, reg);
                chunk.set_block(x, 1, z, 3, 0, reg);
                chunk.set_block(x, 2, z, 2, 0, reg);
            }
        }
        chunk.set_block(5, 70, 3, 1, 0, reg);
        chunk.set_block(8, 200, 8, 1000, 9, reg);
        chunk.sections[0].as_mut().unwrap().set_block_light(1, 1, 1, 13);
        chunk.sections[0].as_mut().unwrap().set_sky_light(2, 3, 4, 15);
        chunk.biomes[17] = 4;
        chunk.terrain_populated = true;
        chunk.light_populated = true;
        chunk.inhabited_time = 777;
        chunk
    }

    #[test]
    fn roundtrip_preserves_blocks_light_biomes_flags() {
        let reg = registry();
        let chunk = sample_chunk(&reg);
        let restored = chunk_from_nbt(&chunk_to_nbt(&chunk), true, &reg).unwrap();

        assert_eq!(restored.chunk_x, 3);
        assert_eq!(restored.chunk_z, -2);
        assert_eq!(restored.block(5, 70, 3), (1, 0));
        assert_eq!(restored.block(8, 200, 8), (1000, 9));
        assert_eq!(restored.block(0, 0, 0), (7, 0));
        assert_eq!(restored.block(0, 2, 0), (2, 0));
        assert_eq!(restored.sections[0].as_ref().unwrap().block_light(1, 1, 1), 13);
        assert_eq!(restored.sections[0].as_ref().unwrap().sky_light(2, 3, 4), 15);
        assert_eq!(restored.biomes[17], 4);
        assert!(restored.terrain_populated);
        assert!(restored.light_populated);
        assert_eq!(restored.inhabited_time, 777);
        assert_eq!(restored.height_map, chunk.height_map);
    }

    #[test]
    fn ref_counts_recomputed_on_load() {
        let reg = registry();
        let chunk = sample_chunk(&reg);
        let restored = chunk_from_nbt(&chunk_to_nbt(&chunk), true, &reg).unwrap();
        let section = restored.sections[0].as_ref().unwrap();
        assert!(!section.is_empty());
        assert!(section.needs_random_tick()); // grass layer
        let upper = restored.sections[4].as_ref().unwrap();
        assert!(!upper.is_empty());
        assert!(!upper.needs_random_tick()); // lone stone block
    }

    #[test]
    fn empty_sections_omitted_and_add_only_when_needed() {
        let reg = registry();
        let mut chunk = Chunk::new(0, 0, true);
        chunk.set_block(0, 0, 0, 1, 0, &reg);

        let root = chunk_to_nbt(&chunk);
        let level = root.compound.get("Level").unwrap().as_compound().unwrap();
        let sections = level.get("Sections").unwrap().as_list().unwrap();
        assert_eq!(sections.len(), 1);
        let section = sections[0].as_compound().unwrap();
        assert!(section.get("Add").is_none());
        assert!(section.get("SkyLight").is_some());
    }

    #[test]
    fn add_written_for_high_ids() {
        let reg = registry();
        let mut chunk = Chunk::new(0, 0, true);
        chunk.set_block(0, 0, 0, 300, 0, &reg);
        let root = chunk_to_nbt(&chunk);
        let level = root.compound.get("Level").unwrap().as_compound().unwrap();
        let sections = level.get("Sections").unwrap().as_list().unwrap();
        assert!(sections[0].as_compound().unwrap().get("Add").is_some());
    }

    #[test]
    fn skyless_dimension_omits_sky_light() {
        let reg = registry();
        let mut chunk = Chunk::new(0, 0, false);
        chunk.set_block(0, 0, 0, 1, 0, &reg);
        let root = chunk_to_nbt(&chunk);
        let level = root.compound.get("Level").unwrap().as_compound().unwrap();
        let sections = level.get("Sections").unwrap().as_list().unwrap();
        assert!(sections[0].as_compound().unwrap().get("SkyLight").is_none());

        let restored = chunk_from_nbt(&root, false, &reg).unwrap();
        assert_eq!(restored.block(0, 0, 0), (1, 0));
    }

    #[test]
    fn sections_accepted_out_of_order_and_without_add() {
        let reg = registry();
        let mut chunk = Chunk::new(0, 0, true);
        chunk.set_block(0, 250, 0, 1, 0, &reg);
        chunk.set_block(0, 5, 0, 4, 0, &reg);

        let mut root = chunk_to_nbt(&chunk);
        // Reverse the section list order in place.
        let level = root
            .compound
            .get_mut("Level")
            .and_then(|t| match t {
                NbtTag::Compound(c) => Some(c),
                _ => None,
            })
            .unwrap();
        if let Some(NbtTag::List(sections)) = level.get_mut("Sections") {
            sections.reverse();
        }

        let restored = chunk_from_nbt(&root, true, &reg).unwrap();
        assert_eq!(restored.block(0, 250, 0), (1, 0));
        assert_eq!(restored.block(0, 5, 0), (4, 0));
    }

    #[test]
    fn entities_roundtrip_opaquely() {
        let reg = registry();
        let mut chunk = Chunk::new(0, 0, true);
        let mut mob = NbtCompound::new();
        mob.insert("id".into(), NbtTag::String("Zombie".into()));
        mob.insert("Health".into(), NbtTag::Short(20));
        chunk.entities.push(NbtTag::Compound(mob.clone()));

        let restored = chunk_from_nbt(&chunk_to_nbt(&chunk), true, &reg).unwrap();
        assert_eq!(restored.entities, vec![NbtTag::Compound(mob)]);
    }

    #[test]
    fn missing_level_is_an_error() {
        let reg = registry();
        let root = NbtRoot::new("", NbtCompound::new());
        assert!(matches!(
            chunk_from_nbt(&root, true, &reg),
            Err(WorldError::MissingTag("Level"))
        ));
    }
}
