//! Kelly criterion for binary outcomes

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Full Kelly fraction for a binary contract
///
/// For Polymarket binary markets:
/// - Shares pay $1 if correct, $0 if wrong
/// - Odds: b = (1 - price) / price
/// - Kelly fraction: f* = (p*b - q) / b
///
/// Negative results are clamped to zero, as are prices outside (0, 1)
/// and probabilities outside [0, 1].
pub fn full_kelly(probability: Decimal, price: Decimal) -> Decimal {
    if price <= dec!(0) || price >= dec!(1) {
        return dec!(0);
    }
    if probability < dec!(0) || probability > dec!(1) {
        return dec!(0);
    }

    let b = net_odds(price);
    let q = Decimal::ONE - probability;
    let kelly = (probability * b - q) / b;

    kelly.max(dec!(0))
}

/// Net odds received on a win per unit staked at `price`
pub fn net_odds(price: Decimal) -> Decimal {
    (Decimal::ONE - price) / price
}
