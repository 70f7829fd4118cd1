//! Market quality grade

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::market::MarketSnapshot;

/// Letter grade from liquidity, volume and spread
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum QualityGrade {
    A,
    B,
    C,
    D,
}

impl QualityGrade {
    fn from_score(score: u8) -> Self {
        match score {
            6.. => QualityGrade::A,
            4..=5 => QualityGrade::B,
            2..=3 => QualityGrade::C,
            _ => QualityGrade::D,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            QualityGrade::A => "excellent",
            QualityGrade::B => "good",
            QualityGrade::C => "fair",
            QualityGrade::D => "poor",
        }
    }
}

impl std::fmt::Display for QualityGrade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let letter = match self {
            QualityGrade::A => "A",
            QualityGrade::B => "B",
            QualityGrade::C => "C",
            QualityGrade::D => "D",
        };
        write!(f, "{letter}")
    }
}

/// Grade plus the score it came from (0..=7)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketQuality {
    pub grade: QualityGrade,
    pub score: u8,
}

impl MarketQuality {
    /// Score a snapshot
    ///
    /// Liquidity: >= 50k +3, >= 10k +2, >= 1k +1.
    /// 24h volume: >= 10k +2, >= 1k +1.
    /// Spread: <= 0.02 +2, <= 0.05 +1, unknown +0.
    pub fn assess(snapshot: &MarketSnapshot) -> Self {
        let liquidity = snapshot.liquidity();
        let volume = snapshot.volume_24hr();

        let liquidity_points = tier(liquidity, &[(dec!(50000), 3), (dec!(10000), 2), (dec!(1000), 1)]);
        let volume_points = tier(volume, &[(dec!(10000), 2), (dec!(1000), 1)]);
        let spread_points = match snapshot.spread() {
            Some(s) if s <= dec!(0.02) => 2,
            Some(s) if s <= dec!(0.05) => 1,
            _ => 0,
        };

        let score = liquidity_points + volume_points + spread_points;
        Self {
            grade: QualityGrade::from_score(score),
            score,
        }
    }
}

/// Points for the first floor the value reaches
fn tier(value: Decimal, floors: &[(Decimal, u8)]) -> u8 {
    floors
        .iter()
        .find(|(floor, _)| value >= *floor)
        .map(|(_, points)| *points)
        .unwrap_or(0)
}
