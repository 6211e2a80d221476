//! Redis key and channel naming, carried over verbatim from
//! `servico_coordenacao.py` / `servico_pubsub.py` so operators inspecting a
//! shared Redis instance see the same namespace regardless of which node
//! wrote a key.

pub const STOCK_KEY: &str = "estoque_global";

pub fn inventory_key(player_id: &str) -> String {
    format!("inventario:{player_id}")
}

pub fn transaction_key(tx_id: &str) -> String {
    format!("transacao_2pc:{tx_id}")
}

pub const CHANNEL_GENERAL_EVENTS: &str = "eventos_gerais";

pub fn channel_player_notifications(player_id: &str) -> String {
    format!("notificacoes_jogador_{player_id}")
}

pub fn channel_match(match_id: &str) -> String {
    format!("partida_{match_id}")
}
