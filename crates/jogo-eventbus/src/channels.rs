//! Channel name helpers, re-exported from `jogo-store` so callers never have
//! to depend on `jogo-store` directly just to name a channel.

pub use jogo_store::keys::{
    channel_match as match_channel, channel_player_notifications as player_channel,
    CHANNEL_GENERAL_EVENTS as GENERAL_EVENTS,
};

/// Pattern the cross-node bridge `psubscribe`s for per-player notifications.
pub const PLAYER_NOTIFICATIONS_PATTERN: &str = "notificacoes_jogador_*";

/// Pattern the cross-node bridge `psubscribe`s for per-match events.
pub const MATCH_EVENTS_PATTERN: &str = "partida_*";
