//! Gamma payload parsing feeding candidate selection

use chrono::{TimeZone, Utc};
use polybet::market::{parse_input, parse_search_payload, MarketInput, SlugKind};
use polybet::selection::CandidateSelector;
use rust_decimal_macros::dec;
use serde_json::json;

#[test]
fn test_search_payload_to_selection() {
    let payload = json!({
        "events": [{
            "title": "Lakers vs. Celtics",
            "slug": "nba-lal-bos-2025-03-01",
            "tags": [{"label": "NBA", "slug": "nba"}],
            "markets": [
                {"id": "1", "slug": "lal-win", "question": "Will the Lakers win?",
                 "active": true, "closed": false, "liquidityNum": "8000",
                 "volume24hr": 1200, "bestBid": "0.44", "bestAsk": "0.46"},
                {"id": "2", "slug": "bos-win", "question": "Will the Celtics win?",
                 "active": true, "closed": false, "liquidityNum": "12000",
                 "volume24hr": 900, "bestBid": "0.53", "bestAsk": "0.55"},
                {"id": "3", "slug": "old", "question": "Old market",
                 "active": true, "closed": true, "liquidityNum": "90000"}
            ]
        }],
        "markets": [
            {"id": "4", "slug": "btc", "question": "Will BTC hit 200k?",
             "active": true, "closed": false, "liquidityNum": "500000", "category": "Crypto"}
        ]
    });

    let candidates = parse_search_payload(payload).unwrap();
    assert_eq!(candidates.len(), 4);

    let now = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
    let selection = CandidateSelector::new()
        .select(candidates, "lakers celtics", now)
        .unwrap();

    // sports markets outrank the deeper crypto market
    assert_eq!(selection.chosen.slug(), "bos-win");
    let others: Vec<&str> = selection.others.iter().map(|s| s.slug()).collect();
    assert_eq!(others, vec!["lal-win", "btc"]);

    let list = selection.candidate_list();
    assert_eq!(list.entries[0].rank, 2);
    assert_eq!(list.entries[0].liquidity, dec!(8000));
}

#[test]
fn test_input_classification() {
    assert_eq!(
        parse_input("https://polymarket.com/event/nba-lal-bos-2025-03-01?tid=1"),
        MarketInput::Url {
            kind: SlugKind::Event,
            slug: "nba-lal-bos-2025-03-01".to_string()
        }
    );
    assert_eq!(
        parse_input("Lakers Celtics"),
        MarketInput::Query("Lakers Celtics".to_string())
    );
}
