use actix_web::{HttpResponse, Responder, get, web};

use super::models::{
    AppState, ChainResponse, DifficultyResponse, ValidateResponse, reject,
};

/// Get the full blockchain, oldest first.
#[get("/chain/")]
pub async fn get_chain(state: web::Data<AppState>) -> impl Responder {
    let ledger = state.ledger.read().expect("lock poisoned");
    let resp = ChainResponse {
        length: ledger.height(),
        difficulty: ledger.difficulty(),
        chain: ledger.chain(),
    };
    HttpResponse::Ok().json(resp)
}

/// Explorer lookup of a single block by index.
#[get("/block/{index}/")]
pub async fn get_block(state: web::Data<AppState>, path: web::Path<(u64,)>) -> impl Responder {
    let index = path.into_inner().0;
    let ledger = state.ledger.read().expect("lock poisoned");
    match ledger.block_by_index(index) {
        Ok(block) => HttpResponse::Ok().json(block),
        Err(err) => reject(&err),
    }
}

/// Re-check linkage and hash integrity of the whole chain.
#[get("/validate/")]
pub async fn validate_chain(state: web::Data<AppState>) -> impl Responder {
    let ledger = state.ledger.read().expect("lock poisoned");
    HttpResponse::Ok().json(ValidateResponse {
        valid: ledger.validate_chain(),
        length: ledger.height(),
    })
}

/// Current PoW difficulty, recomputed from chain history on every call.
#[get("/difficulty/")]
pub async fn get_difficulty(state: web::Data<AppState>) -> impl Responder {
    let ledger = state.ledger.read().expect("lock poisoned");
    HttpResponse::Ok().json(DifficultyResponse {
        difficulty: ledger.difficulty(),
    })
}
