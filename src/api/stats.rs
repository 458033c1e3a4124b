use actix_web::{HttpResponse, Responder, get, web};

use super::models::{AppState, StatsResponse};
use crate::blockchain::{BLOCK_TIME_SECS, RETARGET_WINDOW};

#[get("/stats/")]
pub async fn get_stats(state: web::Data<AppState>) -> impl Responder {
    let ledger = state.ledger.read().expect("lock poisoned");
    HttpResponse::Ok().json(StatsResponse {
        height: ledger.height(),
        difficulty: ledger.difficulty(),
        target_block_time_secs: BLOCK_TIME_SECS,
        retarget_window: RETARGET_WINDOW,
        mempool_size: ledger.mempool().len(),
    })
}
