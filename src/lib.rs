//! polybet: risk-aware betting analysis for Polymarket sports markets
//!
//! This library provides the core components for:
//! - Market discovery via the Gamma API, with optional CLOB quotes
//! - Deterministic candidate selection for free-text match descriptions
//! - Fair probability estimation (de-vig + reference blend)
//! - Edge and expected value gating against configured thresholds
//! - Fractional Kelly sizing with per-bet and daily caps
//! - Markdown and JSON reports
//! - Structured logging and Prometheus metrics

pub mod analysis;
pub mod cli;
pub mod config;
pub mod error;
pub mod gate;
pub mod market;
pub mod pricing;
pub mod report;
pub mod risk;
pub mod selection;
pub mod telemetry;
