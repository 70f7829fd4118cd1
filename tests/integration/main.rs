//! Integration tests

mod config_test;
mod market_test;
mod pipeline_test;
