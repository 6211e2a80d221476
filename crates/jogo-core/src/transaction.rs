use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Operation-specific transaction payload.
///
/// A tagged variant replacing the original's untyped `dados` dict
/// (SPEC_FULL.md §9, REDESIGN FLAG): unknown `tipo_operacao` values are
/// rejected at decode instead of silently falling through.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "tipo_operacao")]
pub enum TransactionPayload {
    #[serde(rename = "abrir_pacote")]
    OpenPack {
        player_id: String,
        quantity: u32,
        /// Carried in the payload (not only decremented out-of-band) so a
        /// coordinator crash between local decrement and prepare cannot
        /// strand the pack (SPEC_FULL.md §4.2, Open Question 1).
        packs_available_before: u32,
    },
    #[serde(rename = "troca_cartas")]
    TradeCards {
        player_a: String,
        card_a: String,
        player_b: String,
        card_b: String,
    },
}

impl TransactionPayload {
    pub fn kind_str(&self) -> &'static str {
        match self {
            TransactionPayload::OpenPack { .. } => "abrir_pacote",
            TransactionPayload::TradeCards { .. } => "troca_cartas",
        }
    }
}

/// Terminal/non-terminal status of a Transaction record (I5: once
/// Committed or Aborted, the status never changes again).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionStatus {
    Preparing,
    Committed,
    Aborted,
}

/// Durable 2PC transaction record, persisted in the Coordination Store
/// under `transacao_2pc:{tx_id}` (spec.md §6).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub tx_id: String,
    pub coordinator_url: String,
    pub status: TransactionStatus,
    #[serde(flatten)]
    pub payload: TransactionPayload,
}

impl Transaction {
    pub fn new(coordinator_url: impl Into<String>, payload: TransactionPayload) -> Self {
        Transaction {
            tx_id: Uuid::new_v4().to_string(),
            coordinator_url: coordinator_url.into(),
            status: TransactionStatus::Preparing,
            payload,
        }
    }
}

/// A participant's response to `prepare`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Vote {
    #[serde(rename = "VOTE_COMMIT")]
    Commit,
    #[serde(rename = "VOTE_ABORT")]
    Abort,
}

/// The coordinator's `prepare` reply envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoteMessage {
    pub tx_id: String,
    pub server_url: String,
    pub vote: Vote,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// The coordinator's phase-2 decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decision {
    #[serde(rename = "GLOBAL_COMMIT")]
    Commit,
    #[serde(rename = "GLOBAL_ABORT")]
    Abort,
}

/// The coordinator's `decide` message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionMessage {
    pub tx_id: String,
    pub server_url: String,
    pub decision: Decision,
}
