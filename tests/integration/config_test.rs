//! Configuration loading tests

use std::io::Write;

use polybet::config::{BlendMode, Config, LogFormat};
use polybet::error::AnalysisError;
use rust_decimal_macros::dec;

#[test]
fn test_config_example_loads() {
    let config = Config::from_toml_str(include_str!("../../config.toml.example")).unwrap();
    assert_eq!(config.gamma.base_url, "https://gamma-api.polymarket.com");
    assert_eq!(config.pricing.blend_mode, BlendMode::Weighted);
    assert_eq!(config.pricing.blend_weight, dec!(0.7));
    assert_eq!(config.gate.ev_min, dec!(0.02));
    assert_eq!(config.sizing.default_bankroll, dec!(5000));
    assert_eq!(config.telemetry.log_format, LogFormat::Pretty);
    assert!(config.telemetry.metrics_port.is_none());
}

#[test]
fn test_load_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[gate]\nev_min = 0.05\n\n[clob]\nenabled = true").unwrap();

    let config = Config::load(file.path()).unwrap();
    assert_eq!(config.gate.ev_min, dec!(0.05));
    assert!(config.clob.enabled);
    assert_eq!(config.gate.liq_min, dec!(2000));
}

#[test]
fn test_load_missing_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    assert!(Config::load(dir.path().join("absent.toml")).is_err());
}

#[test]
fn test_load_out_of_range_value() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[sizing]\nmax_bet_pct = 0").unwrap();

    let err = Config::load(file.path()).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<AnalysisError>(),
        Some(AnalysisError::Configuration(_))
    ));
}
