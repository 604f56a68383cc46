//! One-time snapshot fetch across fallback REST domains.
//!
//! Each domain must answer both the 24h ticker call and the exchange
//! metadata call before its data is accepted; the first domain that does
//! wins and the rest are never contacted. The whole walk runs under a hard
//! time ceiling, after which the store is marked loaded regardless.

use std::time::Duration;

use tracing::{info, warn};

use crate::api::MarketApi;
use crate::models::instrument::ExchangeInfo;
use crate::models::ticker::Ticker24h;
use crate::store::StoreHandle;

/// Data accepted from one domain.
#[derive(Debug)]
pub struct BootstrapData {
    pub base: String,
    pub rows: Vec<Ticker24h>,
    pub info: ExchangeInfo,
}

/// Tries each base URL in order and returns the first complete answer.
///
/// Both calls for a domain are issued concurrently. Returns `None` when
/// every domain failed.
pub async fn fetch_snapshot<A: MarketApi>(api: &A, bases: &[String]) -> Option<BootstrapData> {
    for base in bases {
        let (rows, meta) = tokio::join!(api.ticker_24h(base), api.exchange_info(base));
        match (rows, meta) {
            (Ok(rows), Ok(info)) => {
                info!(%base, rows = rows.len(), "Bootstrap snapshot fetched");
                return Some(BootstrapData {
                    base: base.clone(),
                    rows,
                    info,
                });
            }
            (rows, meta) => {
                warn!(
                    %base,
                    ticker_error = rows.err().map(|e| e.to_string()),
                    info_error = meta.err().map(|e| e.to_string()),
                    "Bootstrap domain failed, trying next"
                );
            }
        }
    }
    warn!("Every bootstrap domain failed");
    None
}

/// Fetches the snapshot and hands it to the store, never failing.
///
/// On success the store applies the snapshot (which marks it loaded). On
/// total failure the store is marked loaded with whatever it already
/// holds. When `ceiling` passes first the store is marked loaded right
/// away, but the fetch is left to finish and still applied if it succeeds.
pub async fn run<A: MarketApi>(api: &A, bases: &[String], store: &StoreHandle, ceiling: Duration) {
    let fetch = fetch_snapshot(api, bases);
    tokio::pin!(fetch);

    let late = tokio::select! {
        result = &mut fetch => {
            apply(store, result);
            return;
        }
        () = tokio::time::sleep(ceiling) => {
            warn!(
                ceiling_secs = ceiling.as_secs_f64(),
                "Bootstrap exceeded its ceiling, showing partial data"
            );
            store.mark_loaded();
            fetch.await
        }
    };
    apply(store, late);
}

fn apply(store: &StoreHandle, result: Option<BootstrapData>) {
    match result {
        Some(data) => store.apply_snapshot(data.rows, data.info),
        None => store.mark_loaded(),
    }
}
