//! CLI interface for polybet
//!
//! Provides subcommands for:
//! - `analyze`: One-shot analysis of a market URL or match description
//! - `chat`: Interactive loop over stdin
//! - `config`: Show the effective configuration

mod analyze;
mod chat;

pub use analyze::AnalyzeArgs;
pub use chat::ChatArgs;

use clap::{Parser, Subcommand};

use crate::analysis::{AnalysisEngine, Analyzer};
use crate::config::Config;
use crate::error::AnalysisError;
use crate::market::{ClobClient, GammaClient, OddsApiClient};

#[derive(Parser, Debug)]
#[command(name = "polybet")]
#[command(about = "Risk-aware betting analysis for Polymarket sports markets")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Analyze one market
    Analyze(AnalyzeArgs),
    /// Interactive analysis session
    Chat(ChatArgs),
    /// Show configuration
    Config,
}

/// Analyzer wired to the live Gamma, CLOB and Odds APIs
pub type LiveAnalyzer = Analyzer<GammaClient, ClobClient, OddsApiClient>;

/// Build the live analyzer from configuration
pub fn build_analyzer(config: &Config) -> anyhow::Result<LiveAnalyzer> {
    let engine = AnalysisEngine::from_config(config)?;
    let gamma = GammaClient::from_config(&config.gamma)?;
    let clob = if config.clob.enabled {
        Some(ClobClient::from_config(&config.clob)?)
    } else {
        None
    };
    let odds = OddsApiClient::from_config(&config.odds_api)?;
    Ok(Analyzer::new(engine, gamma, clob).with_reference_source(odds))
}

/// User-facing explanation of a failed analysis
pub fn explain(err: &anyhow::Error) -> String {
    match err.downcast_ref::<AnalysisError>() {
        Some(e) => format!("{} ({})", e.user_message(), e),
        None => format!("Could not fetch market data: {err:#}"),
    }
}

/// Human-readable configuration summary
pub fn describe_config(config: &Config) -> String {
    let clob = if config.clob.enabled {
        config.clob.base_url.as_str()
    } else {
        "disabled"
    };
    [
        "Current configuration:".to_string(),
        format!("  Gamma: {}", config.gamma.base_url),
        format!("  CLOB: {clob}"),
        format!(
            "  Odds API: {}",
            if config.odds_api.api_key().is_some() {
                config.odds_api.base_url.as_str()
            } else {
                "disabled (no API key)"
            }
        ),
        format!(
            "  Pricing: {:?} blend, market weight {}",
            config.pricing.blend_mode, config.pricing.blend_weight
        ),
        format!(
            "  Gate: EV >= {}, liquidity >= {}, spread <= {}",
            config.gate.ev_min, config.gate.liq_min, config.gate.spread_max
        ),
        format!(
            "  Sizing: Kelly x{}, max bet {}%, daily exposure {}%, bankroll {}",
            config.sizing.kelly_scale,
            config.sizing.max_bet_pct * rust_decimal_macros::dec!(100),
            config.sizing.max_daily_exposure_pct * rust_decimal_macros::dec!(100),
            config.sizing.default_bankroll
        ),
    ]
    .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_analyze_command() {
        let cli = Cli::try_parse_from([
            "polybet",
            "analyze",
            "https://polymarket.com/event/nba-finals",
            "--side",
            "lay",
            "--bankroll",
            "2500",
            "--json",
        ])
        .unwrap();

        match cli.command {
            Commands::Analyze(args) => {
                assert_eq!(args.text, vec!["https://polymarket.com/event/nba-finals"]);
                assert_eq!(args.side, crate::gate::Side::Lay);
                assert_eq!(args.bankroll, Some(rust_decimal_macros::dec!(2500)));
                assert!(args.json);
            }
            other => panic!("unexpected command {other:?}"),
        }
        assert_eq!(cli.config, "config.toml");
    }

    #[test]
    fn test_free_text_words_joined() {
        let cli = Cli::try_parse_from(["polybet", "analyze", "Lakers", "vs", "Celtics"]).unwrap();
        let Commands::Analyze(args) = cli.command else {
            panic!("expected analyze");
        };
        assert_eq!(args.request().text, "Lakers vs Celtics");
    }

    #[test]
    fn test_explain_typed_error() {
        let err: anyhow::Error = AnalysisError::InsufficientQuotes("m".to_string()).into();
        assert!(explain(&err).starts_with("Quotes unavailable"));

        let other = anyhow::anyhow!("connection refused");
        assert!(explain(&other).contains("connection refused"));
    }

    #[test]
    fn test_describe_config() {
        let text = describe_config(&Config::default());
        assert!(text.contains("CLOB: disabled"));
        assert!(text.contains("Gate: EV >= 0.02"));
    }
}
