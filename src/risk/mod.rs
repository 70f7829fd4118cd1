//! Risk management module
//!
//! Fractional Kelly sizing with per-bet and daily exposure caps

mod kelly;
mod sizing;
mod types;

pub use kelly::{full_kelly, net_odds};
pub use sizing::PositionSizer;
pub use types::{CappedBy, SizingResult, StakeLimits};
