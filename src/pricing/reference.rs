//! Reference odds supplied by the user
//!
//! Chat input such as
//!
//! ```text
//! Lakers: 1.85
//! Celtics: 2.05
//! ```
//!
//! is parsed into decimal odds, de-vigged into probabilities and matched
//! against a market question. Bookmaker feeds use full team names, so their
//! outcomes are matched by name words and averaged across bookmakers.

use std::str::FromStr;

use rust_decimal::Decimal;

/// Parse `Name: odds` lines, keeping only decimal odds above 1
///
/// Lines that do not match are ignored; order is preserved.
pub fn parse_reference_odds(text: &str) -> Vec<(String, Decimal)> {
    text.lines()
        .filter_map(|line| {
            let (name, odds) = line.split_once(':')?;
            let name = name.trim();
            if name.is_empty() {
                return None;
            }
            let odds = Decimal::from_str(odds.trim()).ok()?;
            (odds > Decimal::ONE).then(|| (name.to_string(), odds))
        })
        .collect()
}

/// Convert decimal odds into probabilities that sum to one
pub fn devig_decimal_odds(odds: &[(String, Decimal)]) -> Vec<(String, Decimal)> {
    let implied: Vec<(String, Decimal)> = odds
        .iter()
        .filter(|(_, o)| *o > Decimal::ONE)
        .map(|(name, o)| (name.clone(), Decimal::ONE / *o))
        .collect();

    let total: Decimal = implied.iter().map(|(_, p)| *p).sum();
    if total <= Decimal::ZERO {
        return implied
            .into_iter()
            .map(|(name, _)| (name, Decimal::ZERO))
            .collect();
    }
    implied
        .into_iter()
        .map(|(name, p)| (name, p / total))
        .collect()
}

/// Find the probability whose name appears in the question (or vice versa)
pub fn match_reference(probabilities: &[(String, Decimal)], question: &str) -> Option<Decimal> {
    let question = question.trim().to_lowercase();
    if question.is_empty() {
        return None;
    }
    probabilities
        .iter()
        .find(|(name, _)| {
            let name = name.trim().to_lowercase();
            !name.is_empty() && (question.contains(&name) || name.contains(&question))
        })
        .map(|(_, p)| *p)
}

/// Average de-vigged probability of the outcome named in the question
///
/// Each book needs at least two outcomes. Books where no single outcome
/// matches are skipped; `None` when no book matches.
pub fn consensus_probability(books: &[Vec<(String, Decimal)>], question: &str) -> Option<Decimal> {
    let matched: Vec<Decimal> = books
        .iter()
        .filter(|odds| odds.len() > 1)
        .filter_map(|odds| {
            let probabilities = devig_decimal_odds(odds);
            match_reference(&probabilities, question)
                .or_else(|| match_by_words(&probabilities, question))
        })
        .filter(|p| *p > Decimal::ZERO && *p < Decimal::ONE)
        .collect();

    if matched.is_empty() {
        return None;
    }
    let count = Decimal::from(matched.len());
    Some(matched.into_iter().sum::<Decimal>() / count)
}

/// Outcome sharing the most name words with the question; ties match nothing
fn match_by_words(probabilities: &[(String, Decimal)], question: &str) -> Option<Decimal> {
    let question = question.to_lowercase();
    let words: Vec<&str> = question
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();

    let scored: Vec<(usize, Decimal)> = probabilities
        .iter()
        .map(|(name, p)| {
            let score = name
                .to_lowercase()
                .split_whitespace()
                .filter(|w| w.len() > 2 && words.contains(w))
                .count();
            (score, *p)
        })
        .collect();

    let best = scored.iter().map(|(s, _)| *s).max().filter(|s| *s > 0)?;
    let mut top = scored.iter().filter(|(s, _)| *s == best);
    match (top.next(), top.next()) {
        (Some((_, p)), None) => Some(*p),
        _ => None,
    }
}
