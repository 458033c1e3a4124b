use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::Utc;
use clap::Parser;
use log::{info, warn};
use reqwest::Client;
use serde::Deserialize;

use powledger::api::models::SubmitBlockRequest;
use powledger::blockchain::ledger::PoolEntry;
use powledger::blockchain::{Block, GENESIS_PREV_HASH, pow};
use powledger::transaction::Transaction;
use powledger::wallet::generate_keypair_hex;

/// Standalone miner: polls the node, searches for a nonce off the request
/// path, and submits candidates. Restarts the search when the tip moves.
#[derive(Parser)]
#[command(name = "miner")]
struct Args {
    /// Base URL of the powledger node
    #[arg(long, default_value = "http://127.0.0.1:8080")]
    server: String,

    /// Address credited with the block reward; a fresh keypair is
    /// generated when omitted.
    #[arg(long)]
    address: Option<String>,
}

#[derive(Deserialize)]
struct ChainView {
    chain: Vec<Block>,
}

#[derive(Deserialize)]
struct DifficultyView {
    difficulty: u32,
}

#[derive(Deserialize)]
struct MempoolView {
    transactions: Vec<PoolEntry>,
}

async fn fetch_chain(client: &Client, server: &str) -> Result<Vec<Block>, reqwest::Error> {
    let view: ChainView = client
        .get(format!("{server}/api/v1/chain/"))
        .send()
        .await?
        .json()
        .await?;
    Ok(view.chain)
}

async fn fetch_difficulty(client: &Client, server: &str) -> Result<u32, reqwest::Error> {
    let view: DifficultyView = client
        .get(format!("{server}/api/v1/difficulty/"))
        .send()
        .await?
        .json()
        .await?;
    Ok(view.difficulty)
}

async fn fetch_pending(client: &Client, server: &str) -> Result<Vec<Transaction>, reqwest::Error> {
    let view: MempoolView = client
        .get(format!("{server}/api/v1/transactions/"))
        .send()
        .await?
        .json()
        .await?;
    Ok(view.transactions.into_iter().map(|e| e.transaction).collect())
}

/// One assemble-search-submit cycle. Returns early (without submitting)
/// when the watcher cancels the search because the tip moved.
async fn mine_once(client: &Client, server: &str, address: &str) -> Result<(), reqwest::Error> {
    let chain = fetch_chain(client, server).await?;
    let difficulty = fetch_difficulty(client, server).await?;
    let transactions = fetch_pending(client, server).await?;

    let height = chain.len() as u64;
    let previous_hash = chain
        .last()
        .map(|b| b.hash.clone())
        .unwrap_or_else(|| GENESIS_PREV_HASH.to_string());
    let timestamp = Utc::now().timestamp().to_string();

    info!(
        "searching block #{height} (difficulty={difficulty}, txs={})",
        transactions.len()
    );

    let cancel = Arc::new(AtomicBool::new(false));

    // Watch the tip while the search runs; a new block makes our
    // candidate stale, so abort and reassemble.
    let watcher = {
        let cancel = Arc::clone(&cancel);
        let client = client.clone();
        let server = server.to_string();
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(Duration::from_secs(2)).await;
                match fetch_chain(&client, &server).await {
                    Ok(chain) if chain.len() as u64 != height => {
                        cancel.store(true, Ordering::Relaxed);
                        return;
                    }
                    Ok(_) => {}
                    Err(err) => warn!("tip watcher: {err}"),
                }
            }
        })
    };

    let search_txs = transactions.clone();
    let search_prev = previous_hash.clone();
    let search_ts = timestamp.clone();
    let search_cancel = Arc::clone(&cancel);
    let found = tokio::task::spawn_blocking(move || {
        pow::search(
            height,
            &search_ts,
            &search_txs,
            &search_prev,
            difficulty,
            &search_cancel,
        )
    })
    .await
    .expect("search task panicked");

    watcher.abort();

    let Some((nonce, hash)) = found else {
        info!("tip moved during search, restarting");
        return Ok(());
    };

    let body = SubmitBlockRequest {
        index: height,
        timestamp,
        transactions,
        previous_hash,
        nonce,
        hash: hash.clone(),
        miner_address: address.to_string(),
    };
    let resp = client
        .post(format!("{server}/api/v1/mine/"))
        .json(&body)
        .send()
        .await?;

    if resp.status().is_success() {
        info!("block #{height} accepted (hash={hash})");
    } else {
        let status = resp.status();
        let message = resp.text().await.unwrap_or_default();
        warn!("block #{height} rejected: {status} {message}");
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    env_logger::init();
    let args = Args::parse();

    let address = args.address.unwrap_or_else(|| {
        let (_, _, address) = generate_keypair_hex();
        address
    });
    println!("⛏️ Miner address: {address}");

    let client = Client::new();
    loop {
        if let Err(err) = mine_once(&client, &args.server, &address).await {
            warn!("mining cycle failed: {err}");
            tokio::time::sleep(Duration::from_secs(2)).await;
        }
    }
}
