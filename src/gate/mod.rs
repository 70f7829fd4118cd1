//! Edge gate module
//!
//! Edge, expected value and threshold checks, plus cost estimates

mod costs;
mod edge;
mod types;

pub use costs::{slippage_heuristic, CostBreakdown};
pub use edge::{EdgeGate, GateThresholds};
pub use types::{EdgeDecision, ReasonCode, Side};
