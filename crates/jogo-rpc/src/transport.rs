use std::time::Duration;

use async_trait::async_trait;
use jogo_core::{DecisionMessage, Transaction, TransactionPayload, Vote, VoteMessage};
use jogo_txn::{PeerTransport, TxnError};
use tracing::warn;

/// Caller-observed per-peer timeout for both `prepare` and `decide`
/// (spec.md §4.3: "Timeouts are 5 s per call").
const PEER_TIMEOUT: Duration = Duration::from_secs(5);

/// `reqwest`-backed implementation of the outbound half of the RPC Mesh,
/// used by every node's `TransactionEngine` to reach its peers. Mirrors
/// `bleep-cli`'s use of `reqwest` for outbound HTTP.
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(PEER_TIMEOUT)
            .build()
            .expect("reqwest client configuration is static and always valid");
        ReqwestTransport { client }
    }
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new()
    }
}

fn prepare_path(tx: &Transaction) -> &'static str {
    match tx.payload {
        TransactionPayload::OpenPack { .. } => "/transacao/abrir_pacote/prepare",
        TransactionPayload::TradeCards { .. } => "/inventario/troca/prepare",
    }
}

fn decide_path(tx: &Transaction) -> &'static str {
    match tx.payload {
        TransactionPayload::OpenPack { .. } => "/transacao/abrir_pacote/commit_abort",
        TransactionPayload::TradeCards { .. } => "/inventario/troca/commit_abort",
    }
}

#[async_trait]
impl PeerTransport for ReqwestTransport {
    /// A network error, a timeout, or a non-200 reply all count as
    /// `VOTE_ABORT` at the caller's tally (spec.md §4.2.1 step 2) — this
    /// method therefore never propagates an error, only synthesizes the
    /// abort vote locally.
    async fn send_prepare(&self, peer_url: &str, tx: &Transaction) -> VoteMessage {
        let url = format!("{peer_url}{}", prepare_path(tx));
        let synthetic_abort = |message: String| VoteMessage {
            tx_id: tx.tx_id.clone(),
            server_url: peer_url.to_string(),
            vote: Vote::Abort,
            message: Some(message),
        };

        let response = match self.client.post(&url).json(tx).send().await {
            Ok(response) => response,
            Err(err) => {
                warn!(peer = %peer_url, tx_id = %tx.tx_id, %err, "prepare request failed");
                return synthetic_abort(format!("unreachable: {err}"));
            }
        };

        if !response.status().is_success() {
            let status = response.status();
            warn!(peer = %peer_url, tx_id = %tx.tx_id, %status, "prepare returned non-200");
            return synthetic_abort(format!("peer replied with status {status}"));
        }

        match response.json::<VoteMessage>().await {
            Ok(vote) => vote,
            Err(err) => {
                warn!(peer = %peer_url, tx_id = %tx.tx_id, %err, "prepare reply was not a valid Vote");
                synthetic_abort(format!("undecodable vote reply: {err}"))
            }
        }
    }

    async fn send_decision(
        &self,
        peer_url: &str,
        tx: &Transaction,
        decision: &DecisionMessage,
    ) -> Result<(), TxnError> {
        let url = format!("{peer_url}{}", decide_path(tx));
        let response = self
            .client
            .post(&url)
            .json(decision)
            .send()
            .await
            .map_err(|err| TxnError::PeerUnreachable {
                peer: peer_url.to_string(),
                source: err.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(TxnError::PeerUnreachable {
                peer: peer_url.to_string(),
                source: format!("status {}", response.status()),
            });
        }

        Ok(())
    }
}
