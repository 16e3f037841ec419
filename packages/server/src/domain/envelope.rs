//! Inbound envelope.
//!
//! Only the routing fields are decoded; any other fields are payload and
//! travel verbatim inside the raw frame that carried them.

use serde::Deserialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Msg,
    Join,
    Leave,
    Part,
    #[default]
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Envelope {
    #[serde(default)]
    pub action: Action,
    /// Direct recipient id, or a room name prefixed with `#`
    #[serde(default)]
    pub to: Option<String>,
    /// Room name for join and part
    #[serde(default)]
    pub room: Option<String>,
    /// Unix seconds; must be positive
    #[serde(default)]
    pub time: i64,
}

impl Envelope {
    pub fn decode(frame: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(frame)
    }

    pub fn has_valid_time(&self) -> bool {
        self.time > 0
    }
}
