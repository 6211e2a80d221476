use serde::{Deserialize, Serialize};

/// A 1v1 match between players on (possibly) different regions.
///
/// Outside the 2PC core: matches are not under transactional control
/// (spec.md §1 Non-goals exclude matchmaking/match-play logic). Kept as a
/// value type and event-bus payload only (SPEC_FULL.md §3).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Partida {
    pub match_id: String,
    pub player1_id: String,
    pub player2_id: String,
    pub server1_url: String,
    pub server2_url: String,
    pub status: PartidaStatus,
    #[serde(default)]
    pub move_history: Vec<serde_json::Value>,
    #[serde(default)]
    pub winner_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PartidaStatus {
    Iniciada,
    AguardandoJogada,
    Finalizada,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PairingRequest {
    pub requesting_player_id: String,
    pub requesting_server_url: String,
    #[serde(default = "default_game_type")]
    pub game_type: String,
}

fn default_game_type() -> String {
    "Pedra-Papel-Tesoura 1v1".to_string()
}

#[derive(Debug, Clone, Serialize)]
pub struct PairingResponse {
    pub accepted: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub match_id: Option<String>,
}
