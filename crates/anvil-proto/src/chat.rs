//! Minimal JSON chat components.

use serde::{Deserialize, Serialize};

/// A `{"text": "..."}` chat component, optionally colored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatComponent {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl ChatComponent {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            color: None,
        }
    }

    pub fn colored(text: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            color: Some(color.into()),
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).expect("chat component serializes")
    }
}

/// The kick reason shown to clients newer than protocol 5.
pub fn outdated_server_json() -> String {
    ChatComponent::text("Outdated server! I'm still on 1.7.10").to_json()
}

/// The kick reason shown to clients older than protocol 5.
pub fn outdated_client_json() -> String {
    ChatComponent::text("Outdated client! Please use 1.7.10").to_json()
}
