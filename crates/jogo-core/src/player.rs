use serde::{Deserialize, Serialize};

/// Ephemeral player identity. Never explicitly destroyed (§3).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub player_id: String,
    pub display_name: String,
    pub home_region: String,
}

impl Player {
    pub fn new(player_id: impl Into<String>, display_name: impl Into<String>, home_region: impl Into<String>) -> Self {
        Player {
            player_id: player_id.into(),
            display_name: display_name.into(),
            home_region: home_region.into(),
        }
    }
}
