//! Player `.dat` persistence.
//!
//! One gzip NBT document per player under `<world>/playerdata/<uuid>.dat`,
//! using the vanilla tag names. Loading is best-effort: a missing or
//! corrupt file means "new player".

use std::path::Path;

use anvil_nbt::{file as nbt_file, NbtCompound, NbtRoot, NbtTag};
use tracing::warn;
use uuid::Uuid;

use crate::connection::PlayerSession;

#[derive(Debug, Clone, PartialEq)]
pub struct PlayerData {
    pub pos: [f64; 3],
    pub motion: [f64; 3],
    pub yaw: f32,
    pub pitch: f32,
    pub on_ground: bool,
    pub fall_distance: f32,
    pub health: f32,
    pub food: i32,
    pub saturation: f32,
    pub exhaustion: f32,
    pub xp_level: i32,
    pub xp_total: i32,
    pub xp_progress: f32,
    pub gamemode: i32,
    pub dimension: i32,
    pub held_slot: i32,
    /// `(slot, id, count, damage)` for occupied inventory slots.
    pub inventory: Vec<(i8, i16, i8, i16)>,
}

impl PlayerData {
    pub fn from_session(session: &PlayerSession) -> Self {
        let mut inventory = Vec::new();
        for (i, slot) in session.inventory.iter().enumerate() {
            if !slot.is_empty() {
                inventory.push((i as i8, slot.id, slot.count as i8, slot.damage));
            }
        }
        Self {
            pos: [session.x, session.y, session.z],
            motion: [0.0, 0.0, 0.0],
            yaw: session.yaw,
            pitch: session.pitch,
            on_ground: session.on_ground,
            fall_distance: session.fall_distance,
            health: session.health,
            food: session.food,
            saturation: session.saturation,
            exhaustion: session.exhaustion,
            xp_level: session.xp_level,
            xp_total: session.xp_total,
            xp_progress: session.xp_progress,
            gamemode: session.gamemode as i32,
            dimension: session.dimension,
            held_slot: session.held_slot as i32,
            inventory,
        }
    }

    pub fn apply_to_session(&self, session: &mut PlayerSession) {
        session.x = self.pos[0];
        session.y = self.pos[1];
        session.z = self.pos[2];
        session.yaw = self.yaw;
        session.pitch = self.pitch;
        session.on_ground = self.on_ground;
        session.fall_distance = self.fall_distance;
        session.health = self.health;
        session.food = self.food;
        session.saturation = self.saturation;
        session.exhaustion = self.exhaustion;
        session.xp_level = self.xp_level;
        session.xp_total = self.xp_total;
        session.xp_progress = self.xp_progress;
        session.gamemode = self.gamemode as u8;
        session.dimension = self.dimension;
        session.held_slot = self.held_slot.clamp(0, 8) as u8;
        for slot in session.inventory.iter_mut() {
            *slot = anvil_proto::packets::play::slot::Slot::EMPTY;
        }
        for &(idx, id, count, damage) in &self.inventory {
            if let Some(slot) = session.inventory.get_mut(idx as usize) {
                *slot = anvil_proto::packets::play::slot::Slot::new(id, count as u8, damage);
            }
        }
    }

    fn to_nbt(&self) -> NbtRoot {
        let mut c = NbtCompound::new();
        c.insert(
            "Pos".into(),
            NbtTag::List(self.pos.iter().map(|&v| NbtTag::Double(v)).collect()),
        );
        c.insert(
            "Motion".into(),
            NbtTag::List(self.motion.iter().map(|&v| NbtTag::Double(v)).collect()),
        );
        c.insert(
            "Rotation".into(),
            NbtTag::List(vec![NbtTag::Float(self.yaw), NbtTag::Float(self.pitch)]),
        );
        c.insert("OnGround".into(), NbtTag::Byte(self.on_ground as i8));
        c.insert("FallDistance".into(), NbtTag::Float(self.fall_distance));
        // 1.7 carries health twice: the legacy short and the float.
        c.insert("Health".into(), NbtTag::Short(self.health.ceil() as i16));
        c.insert("HealF".into(), NbtTag::Float(self.health));
        c.insert("foodLevel".into(), NbtTag::Int(self.food));
        c.insert(
            "foodSaturationLevel".into(),
            NbtTag::Float(self.saturation),
        );
        c.insert(
            "foodExhaustionLevel".into(),
            NbtTag::Float(self.exhaustion),
        );
        c.insert("XpLevel".into(), NbtTag::Int(self.xp_level));
        c.insert("XpTotal".into(), NbtTag::Int(self.xp_total));
        c.insert("XpP".into(), NbtTag::Float(self.xp_progress));
        c.insert("playerGameType".into(), NbtTag::Int(self.gamemode));
        c.insert("Dimension".into(), NbtTag::Int(self.dimension));
        c.insert("SelectedItemSlot".into(), NbtTag::Int(self.held_slot));

        let items = self
            .inventory
            .iter()
            .map(|&(slot, id, count, damage)| {
                let mut item = NbtCompound::new();
                item.insert("Slot".into(), NbtTag::Byte(slot));
                item.insert("id".into(), NbtTag::Short(id));
                item.insert("Count".into(), NbtTag::Byte(count));
                item.insert("Damage".into(), NbtTag::Short(damage));
                NbtTag::Compound(item)
            })
            .collect();
        c.insert("Inventory".into(), NbtTag::List(items));

        NbtRoot::new("", c)
    }

    fn from_nbt(root: &NbtRoot) -> Option<Self> {
        let c = &root.compound;
        let pos = read_double_triplet(c.get("Pos")?)?;
        let rotation = c.get("Rotation").and_then(|t| t.as_list());
        let (yaw, pitch) = match rotation {
            Some([NbtTag::Float(yaw), NbtTag::Float(pitch)]) => (*yaw, *pitch),
            _ => (0.0, 0.0),
        };
        let motion = c
            .get("Motion")
            .and_then(read_double_triplet)
            .unwrap_or([0.0; 3]);

        let health = c
            .get("HealF")
            .and_then(|t| t.as_float())
            .or_else(|| c.get("Health").and_then(|t| t.as_short()).map(f32::from))
            .unwrap_or(20.0);

        let mut inventory = Vec::new();
        if let Some(items) = c.get("Inventory").and_then(|t| t.as_list()) {
            for item in items {
                let Some(item) = item.as_compound() else { continue };
                let slot = item.get("Slot").and_then(|t| t.as_byte()).unwrap_or(-1);
                let id = item.get("id").and_then(|t| t.as_short()).unwrap_or(-1);
                let count = item.get("Count").and_then(|t| t.as_byte()).unwrap_or(0);
                let damage = item.get("Damage").and_then(|t| t.as_short()).unwrap_or(0);
                if slot >= 0 && id >= 0 && count > 0 {
                    inventory.push((slot, id, count, damage));
                }
            }
        }

        Some(Self {
            pos,
            motion,
            yaw,
            pitch,
            on_ground: c.get("OnGround").and_then(|t| t.as_byte()).unwrap_or(1) != 0,
            fall_distance: c
                .get("FallDistance")
                .and_then(|t| t.as_float())
                .unwrap_or(0.0),
            health,
            food: c.get("foodLevel").and_then(|t| t.as_int()).unwrap_or(20),
            saturation: c
                .get("foodSaturationLevel")
                .and_then(|t| t.as_float())
                .unwrap_or(5.0),
            exhaustion: c
                .get("foodExhaustionLevel")
                .and_then(|t| t.as_float())
                .unwrap_or(0.0),
            xp_level: c.get("XpLevel").and_then(|t| t.as_int()).unwrap_or(0),
            xp_total: c.get("XpTotal").and_then(|t| t.as_int()).unwrap_or(0),
            xp_progress: c.get("XpP").and_then(|t| t.as_float()).unwrap_or(0.0),
            gamemode: c
                .get("playerGameType")
                .and_then(|t| t.as_int())
                .unwrap_or(0),
            dimension: c.get("Dimension").and_then(|t| t.as_int()).unwrap_or(0),
            held_slot: c
                .get("SelectedItemSlot")
                .and_then(|t| t.as_int())
                .unwrap_or(0),
            inventory,
        })
    }

    /// Best-effort load; any failure reads as "new player".
    pub fn load(world_dir: &Path, uuid: &Uuid) -> Option<Self> {
        let path = world_dir.join("playerdata").join(format!("{uuid}.dat"));
        if !path.exists() {
            return None;
        }
        match nbt_file::read_gzip_file(&path) {
            Ok(root) => Self::from_nbt(&root),
            Err(e) => {
                warn!(%uuid, error = %e, "unreadable player data, starting fresh");
                None
            }
        }
    }

    pub fn save(&self, world_dir: &Path, uuid: &Uuid) -> std::io::Result<()> {
        let dir = world_dir.join("playerdata");
        std::fs::create_dir_all(&dir)?;
        let path = dir.join(format!("{uuid}.dat"));
        nbt_file::write_gzip_file(&path, &self.to_nbt())
            .map_err(|e| std::io::Error::other(e.to_string()))
    }
}

fn read_double_triplet(tag: &NbtTag) -> Option<[f64; 3]> {
    match tag.as_list() {
        Some([NbtTag::Double(a), NbtTag::Double(b), NbtTag::Double(c)]) => Some([*a, *b, *c]),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn temp_dir(tag: &str) -> PathBuf {
        let dir =
            std::env::temp_dir().join(format!("anvil_player_{}_{}", std::process::id(), tag));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn sample() -> PlayerData {
        PlayerData {
            pos: [10.5, 65.0, -20.25],
            motion: [0.0, -0.0784, 0.0],
            yaw: 90.0,
            pitch: -15.0,
            on_ground: true,
            fall_distance: 0.0,
            health: 18.5,
            food: 15,
            saturation: 3.5,
            exhaustion: 1.25,
            xp_level: 5,
            xp_total: 160,
            xp_progress: 0.4,
            gamemode: 0,
            dimension: 0,
            held_slot: 3,
            inventory: vec![(0, 276, 1, 12), (36, 1, 64, 0)],
        }
    }

    #[test]
    fn roundtrip() {
        let dir = temp_dir("roundtrip");
        let uuid = anvil_proto::identity::offline_uuid("Notch");

        let data = sample();
        data.save(&dir, &uuid).unwrap();
        let loaded = PlayerData::load(&dir, &uuid).unwrap();
        assert_eq!(loaded, data);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn missing_is_none() {
        let dir = temp_dir("missing");
        let uuid = anvil_proto::identity::offline_uuid("Nobody");
        assert!(PlayerData::load(&dir, &uuid).is_none());
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn corrupt_is_none() {
        let dir = temp_dir("corrupt");
        let uuid = anvil_proto::identity::offline_uuid("Corrupt");
        let path = dir.join("playerdata");
        std::fs::create_dir_all(&path).unwrap();
        std::fs::write(path.join(format!("{uuid}.dat")), b"not nbt").unwrap();
        assert!(PlayerData::load(&dir, &uuid).is_none());
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn legacy_short_health_accepted() {
        let data = sample();
        let mut root = data.to_nbt();
        root.compound.remove("HealF");
        let loaded = PlayerData::from_nbt(&root).unwrap();
        assert_eq!(loaded.health, 19.0); // ceil(18.5) stored as the short
    }
}
