//! Server configuration: `server.toml` plus command-line overrides.

use std::path::Path;

use clap::Parser;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub server: ServerSection,
    pub world: WorldSection,
    pub logging: LoggingSection,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            server: ServerSection::default(),
            world: WorldSection::default(),
            logging: LoggingSection::default(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    pub address: String,
    pub port: u16,
    pub motd: String,
    pub max_players: u32,
    pub gamemode: String,
    pub difficulty: u8,
    /// Chebyshev chunk radius streamed around each player.
    pub view_distance: i32,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            address: "0.0.0.0".into(),
            port: 25565,
            motd: "A Minecraft Server".into(),
            max_players: 20,
            gamemode: "survival".into(),
            difficulty: 1,
            view_distance: 8,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct WorldSection {
    pub name: String,
    pub seed: i64,
    pub generator: String,
    /// Auto-save interval in seconds; 0 disables.
    pub auto_save_interval: u64,
    /// Chunk evictions processed per tick.
    pub unload_budget: usize,
}

impl Default for WorldSection {
    fn default() -> Self {
        Self {
            name: "world".into(),
            seed: 0,
            generator: "flat".into(),
            auto_save_interval: 300,
            unload_budget: 16,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".into(),
        }
    }
}

impl ServerConfig {
    /// Load the file if present, otherwise defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        if !path.as_ref().exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    pub fn gamemode_numeric(&self) -> u8 {
        match self.server.gamemode.to_lowercase().as_str() {
            "creative" => 1,
            "adventure" => 2,
            _ => 0,
        }
    }
}

/// Command-line flags; each one overrides its config counterpart.
#[derive(Debug, Parser)]
#[command(name = "anvil-server", about = "Minecraft 1.7.10 dedicated server")]
pub struct Args {
    /// Listen port.
    #[arg(long)]
    pub port: Option<u16>,

    /// Bind address.
    #[arg(long)]
    pub bind: Option<String>,

    /// Message of the day shown in the server list.
    #[arg(long)]
    pub motd: Option<String>,

    /// Player cap.
    #[arg(long)]
    pub max_players: Option<u32>,

    /// Path to server.toml.
    #[arg(long, default_value = "server.toml")]
    pub config: String,
}

impl Args {
    pub fn apply(&self, config: &mut ServerConfig) {
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(bind) = &self.bind {
            config.server.address = bind.clone();
        }
        if let Some(motd) = &self.motd {
            config.server.motd = motd.clone();
        }
        if let Some(max) = self.max_players {
            config.server.max_players = max;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.server.port, 25565);
        assert_eq!(config.server.address, "0.0.0.0");
        assert_eq!(config.server.max_players, 20);
        assert_eq!(config.world.generator, "flat");
        assert_eq!(config.world.unload_budget, 16);
        assert_eq!(config.gamemode_numeric(), 0);
    }

    #[test]
    fn parse_partial_file() {
        let toml_str = r#"
            [server]
            port = 25570
            motd = "Test"

            [world]
            seed = 42
        "#;
        let config: ServerConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.port, 25570);
        assert_eq!(config.server.motd, "Test");
        // Unset fields keep defaults.
        assert_eq!(config.server.max_players, 20);
        assert_eq!(config.world.seed, 42);
        assert_eq!(config.world.name, "world");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn cli_overrides() {
        let mut config = ServerConfig::default();
        let args = Args {
            port: Some(1234),
            bind: Some("127.0.0.1".into()),
            motd: Some("cli".into()),
            max_players: Some(5),
            config: "server.toml".into(),
        };
        args.apply(&mut config);
        assert_eq!(config.server.port, 1234);
        assert_eq!(config.server.address, "127.0.0.1");
        assert_eq!(config.server.motd, "cli");
        assert_eq!(config.server.max_players, 5);
    }

    #[test]
    fn gamemode_names() {
        let mut config = ServerConfig::default();
        config.server.gamemode = "Creative".into();
        assert_eq!(config.gamemode_numeric(), 1);
        config.server.gamemode = "adventure".into();
        assert_eq!(config.gamemode_numeric(), 2);
    }
}
