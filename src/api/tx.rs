use actix_web::{HttpResponse, Responder, get, post, web};
use log::{debug, info, warn};

use super::models::{AppState, MempoolResponse, TxAcceptedResponse, reject};
use crate::transaction::Transaction;

/// Submit a signed transfer into the pending pool.
#[post("/transaction/")]
pub async fn post_transaction(
    state: web::Data<AppState>,
    body: web::Json<Transaction>,
) -> impl Responder {
    let tx = body.into_inner();
    debug!(
        "POST /transaction/ - {} -> {} amount={} fee={}",
        tx.sender, tx.recipient, tx.amount, tx.fee
    );

    let mut ledger = state.ledger.write().expect("lock poisoned");
    match ledger.submit_transaction(tx) {
        Ok(id) => {
            info!(
                "transaction {} accepted into pool (size={})",
                id,
                ledger.mempool().len()
            );
            HttpResponse::Created().json(TxAcceptedResponse {
                id,
                message: "Transaction added to pool",
            })
        }
        Err(err) => {
            warn!("POST /transaction/ - rejected: {err}");
            reject(&err)
        }
    }
}

/// List the pending pool in FIFO order.
#[get("/transactions/")]
pub async fn get_mempool(state: web::Data<AppState>) -> impl Responder {
    let ledger = state.ledger.read().expect("lock poisoned");
    let entries = ledger.mempool();
    HttpResponse::Ok().json(MempoolResponse {
        size: entries.len(),
        transactions: entries,
    })
}
