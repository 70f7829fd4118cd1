//! The Odds API client for bookmaker reference odds
//!
//! Used only when the user supplies no reference of their own. The sport
//! key is guessed from the market question, the sport's upcoming events are
//! fetched once, and the event whose team names best match the question
//! provides head-to-head decimal odds per bookmaker.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;

use super::http::{get_json, RetryPolicy};
use super::{BookmakerOdds, ReferenceSource};
use crate::config::OddsApiConfig;

/// Keywords per sport key; first hit wins, so leagues precede generic terms
const SPORT_KEYWORDS: &[(&str, &[&str])] = &[
    ("soccer_fa_cup", &["fa cup"]),
    ("soccer_epl", &["premier league", "epl"]),
    ("soccer_spain_la_liga", &["la liga"]),
    ("soccer_italy_serie_a", &["serie a"]),
    ("soccer_germany_bundesliga", &["bundesliga"]),
    ("soccer_france_ligue_one", &["ligue 1"]),
    ("soccer_uefa_champs_league", &["champions league"]),
    ("soccer_uefa_europa_league", &["europa league"]),
    ("soccer_usa_mls", &["mls"]),
    (
        "basketball_nba",
        &[
            "nba", "lakers", "celtics", "warriors", "nets", "knicks", "bulls", "heat", "bucks",
            "76ers", "suns", "nuggets", "clippers", "mavericks",
        ],
    ),
    ("basketball_ncaab", &["ncaa", "march madness", "college basketball"]),
    (
        "americanfootball_nfl",
        &[
            "nfl", "super bowl", "chiefs", "eagles", "cowboys", "49ers", "bills", "ravens",
            "dolphins", "patriots", "packers", "vikings",
        ],
    ),
    (
        "baseball_mlb",
        &["mlb", "yankees", "dodgers", "mets", "red sox", "cubs", "astros", "braves", "phillies"],
    ),
    (
        "icehockey_nhl",
        &["nhl", "bruins", "penguins", "maple leafs", "canadiens", "blackhawks", "oilers"],
    ),
    ("mma_mixed_martial_arts", &["ufc", "mma", "bellator"]),
    ("boxing_boxing", &["boxing", "fight night"]),
    (
        "soccer_epl",
        &[
            "arsenal", "chelsea", "liverpool", "tottenham", "manchester", "newcastle", "everton",
        ],
    ),
];

/// Client for The Odds API v4
pub struct OddsApiClient {
    base_url: String,
    api_key: String,
    regions: String,
    max_bookmakers: usize,
    retry: RetryPolicy,
    client: Client,
}

impl OddsApiClient {
    /// Create a client from OddsApiConfig; `None` without an API key
    pub fn from_config(config: &OddsApiConfig) -> anyhow::Result<Option<Self>> {
        let Some(api_key) = config.api_key() else {
            tracing::debug!("No Odds API key, external reference odds disabled");
            return Ok(None);
        };
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Some(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            regions: config.regions.clone(),
            max_bookmakers: config.max_bookmakers,
            retry: RetryPolicy::new(config.max_attempts),
            client,
        }))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl ReferenceSource for OddsApiClient {
    async fn bookmaker_odds(&self, title: &str) -> anyhow::Result<Vec<BookmakerOdds>> {
        let Some(sport) = detect_sport(title) else {
            tracing::debug!(title, "No sport detected for reference odds");
            return Ok(vec![]);
        };

        let url = format!("{}/sports/{}/odds/", self.base_url, sport);
        let params = [
            ("apiKey", self.api_key.clone()),
            ("regions", self.regions.clone()),
            ("markets", "h2h".to_string()),
            ("oddsFormat", "decimal".to_string()),
        ];
        let events: Vec<OddsEvent> = get_json(&self.client, &url, &params, &self.retry)
            .await?
            .unwrap_or_default();

        let Some(event) = match_event(&events, title) else {
            tracing::debug!(title, sport, events = events.len(), "No matching odds event");
            return Ok(vec![]);
        };
        let books = event.h2h_books(self.max_bookmakers);

        tracing::info!(
            title,
            sport,
            home = %event.home_team,
            away = %event.away_team,
            bookmakers = books.len(),
            "Fetched reference odds"
        );
        Ok(books)
    }
}

/// Sport key for a market title, if any keyword appears in it
pub fn detect_sport(title: &str) -> Option<&'static str> {
    let title = title.to_lowercase();
    SPORT_KEYWORDS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|kw| title.contains(kw)))
        .map(|(sport, _)| *sport)
}

#[derive(Debug, Clone, Deserialize)]
struct OddsEvent {
    #[serde(default)]
    home_team: String,
    #[serde(default)]
    away_team: String,
    #[serde(default)]
    bookmakers: Vec<OddsBookmaker>,
}

#[derive(Debug, Clone, Deserialize)]
struct OddsBookmaker {
    key: String,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    markets: Vec<OddsMarket>,
}

#[derive(Debug, Clone, Deserialize)]
struct OddsMarket {
    key: String,
    #[serde(default)]
    outcomes: Vec<OddsOutcome>,
}

#[derive(Debug, Clone, Deserialize)]
struct OddsOutcome {
    name: String,
    price: Decimal,
}

impl OddsEvent {
    /// Count of team-name words (longer than two letters) found in the title
    fn score(&self, title: &str) -> usize {
        [&self.home_team, &self.away_team]
            .iter()
            .flat_map(|team| team.split_whitespace())
            .map(str::to_lowercase)
            .filter(|word| word.len() > 2 && title.contains(word.as_str()))
            .count()
    }

    /// Head-to-head odds from at most `limit` bookmakers, in feed order
    fn h2h_books(&self, limit: usize) -> Vec<BookmakerOdds> {
        self.bookmakers
            .iter()
            .filter_map(|bookmaker| {
                let market = bookmaker.markets.iter().find(|m| m.key == "h2h")?;
                let outcomes: Vec<(String, Decimal)> = market
                    .outcomes
                    .iter()
                    .filter(|o| !o.name.is_empty() && o.price > Decimal::ONE)
                    .map(|o| (o.name.clone(), o.price))
                    .collect();
                (!outcomes.is_empty()).then(|| BookmakerOdds {
                    bookmaker: bookmaker.title.clone().unwrap_or_else(|| bookmaker.key.clone()),
                    outcomes,
                })
            })
            .take(limit)
            .collect()
    }
}

/// Event with the highest team-name score; earliest wins ties
fn match_event<'a>(events: &'a [OddsEvent], title: &str) -> Option<&'a OddsEvent> {
    let title = title.to_lowercase();
    let mut best: Option<(&OddsEvent, usize)> = None;
    for event in events {
        let score = event.score(&title);
        if score > best.map_or(0, |(_, s)| s) {
            best = Some((event, score));
        }
    }
    best.map(|(event, _)| event)
}
