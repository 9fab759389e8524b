use crate::constants::{
    CONNECTED_MESSAGE, HELP_TEXT, INVALID_MESSAGE, KEPT_MESSAGE, MINED_MESSAGE, MISSING_NODES,
    MISSING_TX_FIELDS, REPLACED_MESSAGE, VALID_MESSAGE,
};
use crate::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use ledger_core::{is_chain_valid, pow, Block, LedgerError};
use serde::{Deserialize, Serialize};
use serde_json::Number;
use std::fmt::Display;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info};

/// Plain-text error reply.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    fn internal(err: impl Display) -> Self {
        error!(%err, "request failed");
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, self.message).into_response()
    }
}

#[derive(Serialize)]
struct Message {
    message: String,
}

#[derive(Serialize)]
struct MinedBlock {
    message: &'static str,
    #[serde(flatten)]
    block: Block,
}

#[derive(Serialize)]
struct ChainView<'a> {
    owner: &'a str,
    chain: &'a [Block],
    length: usize,
}

#[derive(Serialize)]
struct Connected {
    message: &'static str,
    total_nodes: Vec<String>,
}

#[derive(Serialize)]
struct Resolution<'a> {
    message: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    new_chain: Option<&'a [Block]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    actual_chain: Option<&'a [Block]>,
}

#[derive(Deserialize)]
struct TxIn {
    sender: Option<String>,
    receiver: Option<String>,
    amount: Option<Number>,
}

#[derive(Deserialize)]
struct ConnectIn {
    nodes: Option<Vec<String>>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/mine_block", get(mine_block))
        .route("/get_chain", get(get_chain))
        .route("/is_valid", get(is_valid))
        .route("/add_transaction", post(add_transaction))
        .route("/connect_node", post(connect_node))
        .route("/replace_chain", get(replace_chain))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn home() -> &'static str {
    HELP_TEXT
}

/// Searches for a proof off the async runtime and commits it. If the tip moves
/// while searching (another block mined, chain replaced) the search is
/// cancelled and restarted from the new tip.
async fn mine_block(State(state): State<AppState>) -> Result<Json<MinedBlock>, ApiError> {
    let reward = state.config.reward();
    loop {
        let job = state.ledger.lock().mining_job();
        let search = job.clone();
        let proof = tokio::task::spawn_blocking(move || {
            pow::solve_cancellable(search.previous_proof, search.cancel_token())
        })
        .await
        .map_err(ApiError::internal)?;

        let Some(proof) = proof else {
            debug!(previous = job.previous_index, "tip moved during search, restarting");
            continue;
        };

        let committed = state.ledger.lock().commit_mined(&job, proof, &reward);
        match committed {
            Ok(block) => {
                info!(index = block.index, proof = block.proof, "block mined over http");
                return Ok(Json(MinedBlock {
                    message: MINED_MESSAGE,
                    block,
                }));
            }
            Err(LedgerError::StaleTip { expected, actual }) => {
                debug!(expected, actual, "lost the race for the tip, restarting");
            }
            Err(err) => return Err(ApiError::internal(err)),
        }
    }
}

async fn get_chain(State(state): State<AppState>) -> Response {
    let chain = state.ledger.lock().chain();
    Json(ChainView {
        owner: &state.config.owner,
        chain: &chain,
        length: chain.len(),
    })
    .into_response()
}

async fn is_valid(State(state): State<AppState>) -> Result<Json<Message>, ApiError> {
    let chain = state.ledger.lock().chain();
    let valid = tokio::task::spawn_blocking(move || is_chain_valid(&chain))
        .await
        .map_err(ApiError::internal)?;
    let message = if valid { VALID_MESSAGE } else { INVALID_MESSAGE };
    Ok(Json(Message {
        message: message.to_string(),
    }))
}

async fn add_transaction(
    State(state): State<AppState>,
    body: Result<Json<TxIn>, JsonRejection>,
) -> Result<(StatusCode, Json<Message>), ApiError> {
    let Json(tx) = body.map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;
    let (Some(sender), Some(receiver), Some(amount)) = (tx.sender, tx.receiver, tx.amount) else {
        return Err(ApiError::bad_request(MISSING_TX_FIELDS));
    };
    let index = state.ledger.lock().add_transaction(sender, receiver, amount);
    Ok((
        StatusCode::CREATED,
        Json(Message {
            message: format!("This transaction will be added to Block {index}"),
        }),
    ))
}

async fn connect_node(
    State(state): State<AppState>,
    body: Result<Json<ConnectIn>, JsonRejection>,
) -> Result<(StatusCode, Json<Connected>), ApiError> {
    let Json(input) = body.map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;
    let nodes = input.nodes.ok_or_else(|| ApiError::bad_request(MISSING_NODES))?;

    let mut peers = state.peers.lock();
    let added = peers
        .extend(&nodes)
        .map_err(|err| ApiError::bad_request(err.to_string()))?;
    info!(added, total = peers.len(), "peers connected");
    Ok((
        StatusCode::CREATED,
        Json(Connected {
            message: CONNECTED_MESSAGE,
            total_nodes: peers.all().map(str::to_owned).collect(),
        }),
    ))
}

/// Peer fetches and validation run without any lock held; the ledger lock is
/// only taken to install the winner if it is still longer.
async fn replace_chain(State(state): State<AppState>) -> Response {
    let peers = state.peers.lock().clone();
    let local_len = state.ledger.lock().len();
    let replaced = state
        .resolver
        .resolve(&peers, local_len, |chain| state.ledger.lock().replace_chain(chain))
        .await;
    let chain = state.ledger.lock().chain();

    let view = if replaced {
        Resolution {
            message: REPLACED_MESSAGE,
            new_chain: Some(chain.as_slice()),
            actual_chain: None,
        }
    } else {
        Resolution {
            message: KEPT_MESSAGE,
            new_chain: None,
            actual_chain: Some(chain.as_slice()),
        }
    };
    Json(view).into_response()
}
