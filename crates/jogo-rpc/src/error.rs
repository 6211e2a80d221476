use jogo_core::DomainError;
use jogo_store::StoreError;
use jogo_txn::TxnError;
use serde::Serialize;
use warp::http::StatusCode;
use warp::{Rejection, Reply};

/// Every internal error that can reach the RPC boundary, mapped to the
/// status codes spec.md §7 assigns to its error taxonomy: precondition
/// failures are 400, coordination failures and store faults are 500.
#[derive(Debug, thiserror::Error)]
pub enum RpcError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Txn(#[from] TxnError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("not found")]
    NotFound,
}

impl RpcError {
    fn status(&self) -> StatusCode {
        match self {
            RpcError::Domain(_) => StatusCode::BAD_REQUEST,
            RpcError::Txn(TxnError::Domain(_)) => StatusCode::BAD_REQUEST,
            RpcError::Txn(TxnError::Aborted { .. }) => StatusCode::INTERNAL_SERVER_ERROR,
            RpcError::Txn(_) => StatusCode::INTERNAL_SERVER_ERROR,
            RpcError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            RpcError::NotFound => StatusCode::NOT_FOUND,
        }
    }
}

impl warp::reject::Reject for RpcError {}

#[derive(Serialize)]
struct ErrorBody {
    erro: String,
}

/// Converts a rejection (ours, or warp's built-ins like `MethodNotAllowed`)
/// into the `{"erro": "..."}` JSON body spec.md §7 calls for.
pub async fn handle_rejection(rejection: Rejection) -> Result<impl Reply, std::convert::Infallible> {
    let (status, message) = if rejection.is_not_found() {
        (StatusCode::NOT_FOUND, "recurso nao encontrado".to_string())
    } else if let Some(err) = rejection.find::<RpcError>() {
        (err.status(), err.to_string())
    } else if rejection.find::<warp::reject::MethodNotAllowed>().is_some() {
        (StatusCode::METHOD_NOT_ALLOWED, "metodo nao permitido".to_string())
    } else if rejection.find::<warp::filters::body::BodyDeserializeError>().is_some() {
        (StatusCode::BAD_REQUEST, "corpo da requisicao invalido".to_string())
    } else {
        (StatusCode::INTERNAL_SERVER_ERROR, "erro interno".to_string())
    };

    Ok(warp::reply::with_status(
        warp::reply::json(&ErrorBody { erro: message }),
        status,
    ))
}
