use actix_web::{HttpResponse, Responder, post, web};
use log::{info, warn};

use super::models::{AppState, SubmitBlockRequest, SubmitBlockResponse, reject};

/// Submit a mined candidate block.
///
/// The whole validate-and-commit sequence runs under the write lock, so a
/// second candidate racing for the same height is re-validated against the
/// tip the first one just appended.
#[post("/mine/")]
pub async fn submit_block(
    state: web::Data<AppState>,
    body: web::Json<SubmitBlockRequest>,
) -> impl Responder {
    let (block, miner_address) = body.into_inner().into_parts();
    let index = block.index;
    let hash = block.hash.clone();

    let mut ledger = state.ledger.write().expect("lock poisoned");
    match ledger.submit_block(block, &miner_address) {
        Ok(difficulty) => {
            info!("accepted block #{index} hash={hash} diff={difficulty} miner={miner_address}");
            HttpResponse::Created().json(SubmitBlockResponse {
                message: "Block added successfully",
                index,
                difficulty,
            })
        }
        Err(err) => {
            warn!("rejected block #{index} hash={hash}: {err}");
            reject(&err)
        }
    }
}
