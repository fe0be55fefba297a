//! Block and item registries.
//!
//! Flat records keyed by numeric id and name, built once at startup and
//! shared immutably. The core only consumes the flags; behavior hooks live
//! with the mechanics that register them.

use std::collections::HashMap;

/// Per-block flags consumed by the world store and tick loop.
#[derive(Debug, Clone)]
pub struct BlockDef {
    pub id: u16,
    pub name: String,
    pub is_air: bool,
    pub ticks_randomly: bool,
    pub light_opacity: u8,
    pub light_emission: u8,
    pub hardness: f32,
}

/// Registry of block definitions, indexed by id (0..4096) and by name.
pub struct BlockRegistry {
    by_id: Vec<Option<BlockDef>>,
    by_name: HashMap<String, u16>,
}

impl BlockRegistry {
    pub const MAX_BLOCK_ID: u16 = 4095;

    pub fn new() -> Self {
        Self {
            by_id: (0..=Self::MAX_BLOCK_ID as usize).map(|_| None).collect(),
            by_name: HashMap::new(),
        }
    }

    pub fn register(&mut self, def: BlockDef) {
        let id = def.id;
        self.by_name.insert(def.name.clone(), id);
        self.by_id[id as usize] = Some(def);
    }

    pub fn get(&self, id: u16) -> Option<&BlockDef> {
        self.by_id.get(id as usize).and_then(|d| d.as_ref())
    }

    pub fn get_by_name(&self, name: &str) -> Option<&BlockDef> {
        self.by_name.get(name).and_then(|&id| self.get(id))
    }

    pub fn id_of(&self, name: &str) -> Option<u16> {
        self.by_name.get(name).copied()
    }

    /// Unregistered ids count as solid non-air so their ref counts stay
    /// conservative.
    pub fn is_air(&self, id: u16) -> bool {
        match self.get(id) {
            Some(def) => def.is_air,
            None => id == 0,
        }
    }

    pub fn ticks_randomly(&self, id: u16) -> bool {
        self.get(id).map(|d| d.ticks_randomly).unwrap_or(false)
    }

    pub fn light_opacity(&self, id: u16) -> u8 {
        self.get(id).map(|d| d.light_opacity).unwrap_or(15)
    }

    /// The vanilla 1.7.10 subset the core ships with.
    pub fn vanilla() -> Self {
        let mut reg = Self::new();
        let defs: &[(u16, &str, bool, bool, u8, u8, f32)] = &[
            // (id, name, is_air, ticks_randomly, opacity, emission, hardness)
            (0, "air", true, false, 0, 0, 0.0),
            (1, "stone", false, false, 15, 0, 1.5),
            (2, "grass", false, true, 15, 0, 0.6),
            (3, "dirt", false, false, 15, 0, 0.5),
            (4, "cobblestone", false, false, 15, 0, 2.0),
            (5, "planks", false, false, 15, 0, 2.0),
            (6, "sapling", false, true, 0, 0, 0.0),
            (7, "bedrock", false, false, 15, 0, -1.0),
            (8, "flowing_water", false, false, 3, 0, 100.0),
            (9, "water", false, false, 3, 0, 100.0),
            (10, "flowing_lava", false, true, 0, 15, 100.0),
            (11, "lava", false, true, 0, 15, 100.0),
            (12, "sand", false, false, 15, 0, 0.5),
            (13, "gravel", false, false, 15, 0, 0.6),
            (14, "gold_ore", false, false, 15, 0, 3.0),
            (15, "iron_ore", false, false, 15, 0, 3.0),
            (16, "coal_ore", false, false, 15, 0, 3.0),
            (17, "log", false, false, 15, 0, 2.0),
            (18, "leaves", false, true, 1, 0, 0.2),
            (20, "glass", false, false, 0, 0, 0.3),
            (24, "sandstone", false, false, 15, 0, 0.8),
            (31, "tallgrass", false, false, 0, 0, 0.0),
            (35, "wool", false, false, 15, 0, 0.8),
            (37, "yellow_flower", false, false, 0, 0, 0.0),
            (38, "red_flower", false, false, 0, 0, 0.0),
            (44, "stone_slab", false, false, 15, 0, 2.0),
            (45, "brick_block", false, false, 15, 0, 2.0),
            (49, "obsidian", false, false, 15, 0, 50.0),
            (50, "torch", false, false, 0, 14, 0.0),
            (51, "fire", false, true, 0, 15, 0.0),
            (53, "oak_stairs", false, false, 0, 0, 2.0),
            (54, "chest", false, false, 0, 0, 2.5),
            (56, "diamond_ore", false, false, 15, 0, 3.0),
            (58, "crafting_table", false, false, 15, 0, 2.5),
            (59, "wheat", false, true, 0, 0, 0.0),
            (60, "farmland", false, true, 15, 0, 0.6),
            (61, "furnace", false, false, 15, 0, 3.5),
            (62, "lit_furnace", false, false, 15, 13, 3.5),
            (64, "wooden_door", false, false, 0, 0, 3.0),
            (65, "ladder", false, false, 0, 0, 0.4),
            (78, "snow_layer", false, true, 0, 0, 0.1),
            (79, "ice", false, true, 3, 0, 0.5),
            (80, "snow", false, false, 15, 0, 0.2),
            (81, "cactus", false, true, 0, 0, 0.4),
            (82, "clay", false, false, 15, 0, 0.6),
            (83, "reeds", false, true, 0, 0, 0.0),
            (86, "pumpkin", false, false, 15, 0, 1.0),
            (89, "glowstone", false, false, 15, 15, 0.3),
            (98, "stonebrick", false, false, 15, 0, 1.5),
            (110, "mycelium", false, true, 15, 0, 0.6),
        ];
        for &(id, name, is_air, ticks, opacity, emission, hardness) in defs {
            reg.register(BlockDef {
                id,
                name: name.to_string(),
                is_air,
                ticks_randomly: ticks,
                light_opacity: opacity,
                light_emission: emission,
                hardness,
            });
        }
        reg
    }
}

impl Default for BlockRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-item record.
#[derive(Debug, Clone)]
pub struct ItemDef {
    pub id: u16,
    pub name: String,
    pub max_stack_size: u8,
    pub max_durability: u16,
    /// What the item leaves behind in a crafting grid (bucket -> empty bucket).
    pub container_item: Option<u16>,
}

/// Registry of item definitions.
pub struct ItemRegistry {
    by_id: HashMap<u16, ItemDef>,
    by_name: HashMap<String, u16>,
}

impl ItemRegistry {
    pub fn new() -> Self {
        Self {
            by_id: HashMap::new(),
            by_name: HashMap::new(),
        }
    }

    pub fn register(&mut self, def: ItemDef) {
        self.by_name.insert(def.name.clone(), def.id);
        self.by_id.insert(def.id, def);
    }

    pub fn get(&self, id: u16) -> Option<&ItemDef> {
        self.by_id.get(&id)
    }

    pub fn id_of(&self, name: &str) -> Option<u16> {
        self.by_name.get(name).copied()
    }

    pub fn max_stack_size(&self, id: u16) -> u8 {
        self.get(id).map(|d| d.max_stack_size).unwrap_or(64)
    }

    /// The vanilla 1.7.10 subset the core ships with. Block items share the
    /// block's id space below 256.
    pub fn vanilla() -> Self {
        let mut reg = Self::new();
        let defs: &[(u16, &str, u8, u16, Option<u16>)] = &[
            (256, "iron_shovel", 1, 250, None),
            (257, "iron_pickaxe", 1, 250, None),
            (258, "iron_axe", 1, 250, None),
            (259, "flint_and_steel", 1, 64, None),
            (260, "apple", 64, 0, None),
            (261, "bow", 1, 384, None),
            (262, "arrow", 64, 0, None),
            (263, "coal", 64, 0, None),
            (264, "diamond", 64, 0, None),
            (265, "iron_ingot", 64, 0, None),
            (266, "gold_ingot", 64, 0, None),
            (267, "iron_sword", 1, 250, None),
            (268, "wooden_sword", 1, 59, None),
            (272, "stone_sword", 1, 131, None),
            (276, "diamond_sword", 1, 1561, None),
            (280, "stick", 64, 0, None),
            (281, "bowl", 64, 0, None),
            (282, "mushroom_stew", 1, 0, Some(281)),
            (295, "wheat_seeds", 64, 0, None),
            (296, "wheat", 64, 0, None),
            (297, "bread", 64, 0, None),
            (325, "bucket", 16, 0, None),
            (326, "water_bucket", 1, 0, Some(325)),
            (327, "lava_bucket", 1, 0, Some(325)),
            (331, "redstone", 64, 0, None),
            (335, "milk_bucket", 1, 0, Some(325)),
            (344, "egg", 16, 0, None),
            (364, "cooked_beef", 64, 0, None),
        ];
        for &(id, name, stack, durability, container) in defs {
            reg.register(ItemDef {
                id,
                name: name.to_string(),
                max_stack_size: stack,
                max_durability: durability,
                container_item: container,
            });
        }
        reg
    }
}

impl Default for ItemRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_and_name_lookup_agree() {
        let reg = BlockRegistry::vanilla();
        let stone = reg.get_by_name("stone").unwrap();
        assert_eq!(stone.id, 1);
        assert_eq!(reg.get(1).unwrap().name, "stone");
        assert_eq!(reg.id_of("bedrock"), Some(7));
    }

    #[test]
    fn air_flag() {
        let reg = BlockRegistry::vanilla();
        assert!(reg.is_air(0));
        assert!(!reg.is_air(1));
        // Unregistered non-zero id stays non-air.
        assert!(!reg.is_air(999));
    }

    #[test]
    fn random_tick_flag() {
        let reg = BlockRegistry::vanilla();
        assert!(reg.ticks_randomly(2)); // grass spreads
        assert!(!reg.ticks_randomly(1)); // stone does not
    }

    #[test]
    fn container_items() {
        let items = ItemRegistry::vanilla();
        assert_eq!(items.get(326).unwrap().container_item, Some(325));
        assert_eq!(items.max_stack_size(276), 1);
        assert_eq!(items.max_stack_size(9999), 64);
    }
}
