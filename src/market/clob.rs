//! Polymarket CLOB REST client for top-of-book quotes and fee rates
//!
//! Read-only. Used to refresh quotes that Gamma reports stale or missing.

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;

use super::http::{get_json, RetryPolicy};
use super::{QuoteSource, TopOfBook};
use crate::config::ClobConfig;

const BPS_PER_UNIT: i64 = 10_000;

/// Price level as returned by /book
#[derive(Debug, Clone, Deserialize)]
struct BookLevel {
    price: String,
}

/// Order book response
#[derive(Debug, Clone, Default, Deserialize)]
struct BookResponse {
    #[serde(default)]
    bids: Vec<BookLevel>,
    #[serde(default)]
    asks: Vec<BookLevel>,
}

impl BookResponse {
    fn top_of_book(&self) -> TopOfBook {
        let prices = |levels: &[BookLevel]| {
            levels
                .iter()
                .filter_map(|l| Decimal::from_str(l.price.trim()).ok())
                .filter(|p| *p >= Decimal::ZERO && *p <= Decimal::ONE)
                .collect::<Vec<_>>()
        };
        let best_bid = prices(&self.bids).into_iter().max();
        let best_ask = prices(&self.asks).into_iter().min();

        match (best_bid, best_ask) {
            (Some(b), Some(a)) if b > a => TopOfBook {
                best_bid: None,
                best_ask: None,
            },
            _ => TopOfBook { best_bid, best_ask },
        }
    }
}

/// Fee rate response
#[derive(Debug, Clone, Deserialize)]
struct FeeRateResponse {
    #[serde(default, alias = "base_fee")]
    fee_rate_bps: Option<serde_json::Value>,
}

/// Read client for the CLOB REST API
pub struct ClobClient {
    base_url: String,
    retry: RetryPolicy,
    client: Client,
}

impl ClobClient {
    /// Create a client from ClobConfig
    pub fn from_config(config: &ClobConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            retry: RetryPolicy::new(config.max_attempts),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl QuoteSource for ClobClient {
    async fn top_of_book(&self, token_id: &str) -> anyhow::Result<TopOfBook> {
        let url = format!("{}/book", self.base_url);
        let book: Option<BookResponse> = get_json(
            &self.client,
            &url,
            &[("token_id", token_id.to_string())],
            &self.retry,
        )
        .await?;

        let top = book.unwrap_or_default().top_of_book();
        tracing::debug!(
            token_id,
            best_bid = ?top.best_bid,
            best_ask = ?top.best_ask,
            "Fetched CLOB top of book"
        );
        Ok(top)
    }

    async fn fee_rate(&self, token_id: &str) -> anyhow::Result<Option<Decimal>> {
        let url = format!("{}/fee-rate", self.base_url);
        let response: Option<FeeRateResponse> = get_json(
            &self.client,
            &url,
            &[("token_id", token_id.to_string())],
            &self.retry,
        )
        .await?;

        Ok(response
            .and_then(|r| r.fee_rate_bps)
            .and_then(|v| bps_to_fraction(&v)))
    }
}

fn bps_to_fraction(value: &serde_json::Value) -> Option<Decimal> {
    let bps = match value {
        serde_json::Value::Number(n) => Decimal::from_str(&n.to_string()).ok()?,
        serde_json::Value::String(s) => Decimal::from_str(s.trim()).ok()?,
        _ => return None,
    };
    (bps >= Decimal::ZERO).then(|| bps / Decimal::from(BPS_PER_UNIT))
}
