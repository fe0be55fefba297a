//! Server-list status document.

use serde::{Deserialize, Serialize};

/// The JSON body of the status Response packet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub version: StatusVersion,
    pub players: StatusPlayers,
    pub description: StatusDescription,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub favicon: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusVersion {
    pub name: String,
    pub protocol: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusPlayers {
    pub max: i32,
    pub online: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusDescription {
    pub text: String,
}

impl StatusResponse {
    pub fn new(motd: &str, online: i32, max: i32) -> Self {
        Self {
            version: StatusVersion {
                name: crate::GAME_VERSION.to_string(),
                protocol: crate::PROTOCOL_VERSION,
            },
            players: StatusPlayers { max, online },
            description: StatusDescription {
                text: motd.to_string(),
            },
            favicon: None,
        }
    }

    /// Attach a PNG favicon as a base64 data URI.
    pub fn with_favicon(mut self, png: &[u8]) -> Self {
        use base64::Engine;
        let encoded = base64::engine::general_purpose::STANDARD.encode(png);
        self.favicon = Some(format!("data:image/png;base64,{encoded}"));
        self
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).expect("status document serializes")
    }
}
