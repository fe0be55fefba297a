//! World metadata (`level.dat`).
//!
//! A gzip NBT document whose root holds a single `Data` compound.

use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use anvil_nbt::{file as nbt_file, NbtCompound, NbtRoot, NbtTag};

use crate::error::WorldError;

const ANVIL_VERSION: i32 = 19133;

/// World metadata stored in `level.dat`.
pub struct LevelDat {
    pub level_name: String,
    pub seed: i64,
    pub spawn_x: i32,
    pub spawn_y: i32,
    pub spawn_z: i32,
    /// Total ticks the world has ever run.
    pub time: i64,
    /// Time of day, advancing with the clock but settable by commands.
    pub day_time: i64,
    pub generator_name: String,
    pub game_type: i32,
    pub last_played: i64,
}

impl LevelDat {
    pub fn new(name: &str, seed: i64, generator: &str, spawn: (i32, i32, i32)) -> Self {
        Self {
            level_name: name.to_string(),
            seed,
            spawn_x: spawn.0,
            spawn_y: spawn.1,
            spawn_z: spawn.2,
            time: 0,
            day_time: 0,
            generator_name: generator.to_string(),
            game_type: 0,
            last_played: unix_millis(),
        }
    }

    pub fn load(path: &Path) -> Result<Self, WorldError> {
        let root = nbt_file::read_gzip_file(path)?;
        let data = root
            .compound
            .get("Data")
            .and_then(|t| t.as_compound())
            .ok_or(WorldError::MissingTag("Data"))?;

        Ok(Self {
            level_name: data
                .get("LevelName")
                .and_then(|t| t.as_string())
                .unwrap_or("world")
                .to_string(),
            seed: data
                .get("RandomSeed")
                .and_then(|t| t.as_long())
                .unwrap_or(0),
            spawn_x: data.get("SpawnX").and_then(|t| t.as_int()).unwrap_or(0),
            spawn_y: data.get("SpawnY").and_then(|t| t.as_int()).unwrap_or(64),
            spawn_z: data.get("SpawnZ").and_then(|t| t.as_int()).unwrap_or(0),
            time: data.get("Time").and_then(|t| t.as_long()).unwrap_or(0),
            day_time: data.get("DayTime").and_then(|t| t.as_long()).unwrap_or(0),
            generator_name: data
                .get("generatorName")
                .and_then(|t| t.as_string())
                .unwrap_or("default")
                .to_string(),
            game_type: data.get("GameType").and_then(|t| t.as_int()).unwrap_or(0),
            last_played: data
                .get("LastPlayed")
                .and_then(|t| t.as_long())
                .unwrap_or(0),
        })
    }

    pub fn save(&self, path: &Path) -> Result<(), WorldError> {
        let mut data = NbtCompound::new();
        data.insert("LevelName".into(), NbtTag::String(self.level_name.clone()));
        data.insert("RandomSeed".into(), NbtTag::Long(self.seed));
        data.insert("SpawnX".into(), NbtTag::Int(self.spawn_x));
        data.insert("SpawnY".into(), NbtTag::Int(self.spawn_y));
        data.insert("SpawnZ".into(), NbtTag::Int(self.spawn_z));
        data.insert("Time".into(), NbtTag::Long(self.time));
        data.insert("DayTime".into(), NbtTag::Long(self.day_time));
        data.insert(
            "generatorName".into(),
            NbtTag::String(self.generator_name.clone()),
        );
        data.insert("GameType".into(), NbtTag::Int(self.game_type));
        data.insert("LastPlayed".into(), NbtTag::Long(unix_millis()));
        data.insert("version".into(), NbtTag::Int(ANVIL_VERSION));
        data.insert("initialized".into(), NbtTag::Byte(1));

        let mut compound = NbtCompound::new();
        compound.insert("Data".into(), NbtTag::Compound(data));
        nbt_file::write_gzip_file(path, &NbtRoot::new("", compound))?;
        Ok(())
    }
}

fn unix_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn temp_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("anvil_level_{}_{}", std::process::id(), tag));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn roundtrip() {
        let dir = temp_dir("roundtrip");
        let path = dir.join("level.dat");

        let mut dat = LevelDat::new("TestWorld", 12345, "flat", (8, 4, 8));
        dat.time = 2000;
        dat.day_time = 2000;
        dat.save(&path).unwrap();

        let loaded = LevelDat::load(&path).unwrap();
        assert_eq!(loaded.level_name, "TestWorld");
        assert_eq!(loaded.seed, 12345);
        assert_eq!(loaded.generator_name, "flat");
        assert_eq!((loaded.spawn_x, loaded.spawn_y, loaded.spawn_z), (8, 4, 8));
        assert_eq!(loaded.time, 2000);
        assert_eq!(loaded.day_time, 2000);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = temp_dir("missing");
        assert!(LevelDat::load(&dir.join("level.dat")).is_err());
        std::fs::remove_dir_all(&dir).ok();
    }
}
