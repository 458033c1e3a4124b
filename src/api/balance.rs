use actix_web::{HttpResponse, Responder, get, web};

use super::models::{AppState, BalanceResponse};

/// Balance derived by scanning every accepted transaction:
/// -(amount + fee) for the sender, +amount for the recipient.
#[get("/balance/{address}/")]
pub async fn get_balance(state: web::Data<AppState>, path: web::Path<(String,)>) -> impl Responder {
    let address = path.into_inner().0;
    let balance = {
        let ledger = state.ledger.read().expect("lock poisoned");
        ledger.balance_of(&address)
    };
    HttpResponse::Ok().json(BalanceResponse { address, balance })
}
