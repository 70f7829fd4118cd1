//! Configuration types for polybet

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::error::AnalysisError;

/// Root configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub gamma: GammaConfig,
    #[serde(default)]
    pub clob: ClobConfig,
    #[serde(default)]
    pub odds_api: OddsApiConfig,
    #[serde(default)]
    pub pricing: PricingConfig,
    #[serde(default)]
    pub gate: GateConfig,
    #[serde(default)]
    pub sizing: SizingConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// Gamma API configuration
#[derive(Debug, Clone, Deserialize)]
pub struct GammaConfig {
    #[serde(default = "default_gamma_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Attempts per request including the first one
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Results per type requested from /public-search
    #[serde(default = "default_search_limit")]
    pub search_limit: u32,
}

fn default_gamma_url() -> String {
    "https://gamma-api.polymarket.com".to_string()
}
fn default_timeout_secs() -> u64 {
    10
}
fn default_max_attempts() -> u32 {
    5
}
fn default_search_limit() -> u32 {
    5
}

impl Default for GammaConfig {
    fn default() -> Self {
        Self {
            base_url: default_gamma_url(),
            timeout_secs: default_timeout_secs(),
            max_attempts: default_max_attempts(),
            search_limit: default_search_limit(),
        }
    }
}

/// CLOB read adapter configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ClobConfig {
    /// Hydrate quotes and fees from the CLOB
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_clob_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_clob_attempts")]
    pub max_attempts: u32,
}

fn default_clob_url() -> String {
    "https://clob.polymarket.com".to_string()
}
fn default_clob_attempts() -> u32 {
    4
}

impl Default for ClobConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: default_clob_url(),
            timeout_secs: default_timeout_secs(),
            max_attempts: default_clob_attempts(),
        }
    }
}

/// Environment variable consulted when `odds_api.api_key` is unset
pub const ODDS_API_KEY_ENV: &str = "ODDS_API_KEY";

/// The Odds API configuration, used for reference odds
#[derive(Debug, Clone, Deserialize)]
pub struct OddsApiConfig {
    /// API key; falls back to `ODDS_API_KEY`, disabled when neither is set
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_odds_api_url")]
    pub base_url: String,
    /// Bookmaker regions, comma separated
    #[serde(default = "default_odds_regions")]
    pub regions: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_odds_attempts")]
    pub max_attempts: u32,
    /// Bookmakers averaged into the reference probability
    #[serde(default = "default_max_bookmakers")]
    pub max_bookmakers: usize,
}

fn default_odds_api_url() -> String {
    "https://api.the-odds-api.com/v4".to_string()
}
fn default_odds_regions() -> String {
    "eu,us".to_string()
}
fn default_odds_attempts() -> u32 {
    3
}
fn default_max_bookmakers() -> usize {
    5
}

impl Default for OddsApiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_odds_api_url(),
            regions: default_odds_regions(),
            timeout_secs: default_timeout_secs(),
            max_attempts: default_odds_attempts(),
            max_bookmakers: default_max_bookmakers(),
        }
    }
}

impl OddsApiConfig {
    /// Configured key, else the environment; blank keys count as absent
    pub fn api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| std::env::var(ODDS_API_KEY_ENV).ok())
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
    }
}

/// How the de-vigged price and the reference are combined
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum BlendMode {
    #[default]
    Weighted,
    MarketOnly,
}

/// Fair probability configuration
#[derive(Debug, Clone, Deserialize)]
pub struct PricingConfig {
    #[serde(default)]
    pub blend_mode: BlendMode,
    /// Weight of the de-vigged market price in the blend
    #[serde(default = "default_blend_weight")]
    pub blend_weight: Decimal,
    /// Spread at or below which quotes count as tight
    #[serde(default = "default_confidence_spread_max")]
    pub confidence_spread_max: Decimal,
    /// Liquidity at or above which the market counts as deep
    #[serde(default = "default_confidence_liquidity_min")]
    pub confidence_liquidity_min: Decimal,
}

fn default_blend_weight() -> Decimal {
    Decimal::new(7, 1) // 0.7
}
fn default_confidence_spread_max() -> Decimal {
    Decimal::new(2, 2) // 0.02
}
fn default_confidence_liquidity_min() -> Decimal {
    Decimal::new(10_000, 0)
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            blend_mode: BlendMode::Weighted,
            blend_weight: default_blend_weight(),
            confidence_spread_max: default_confidence_spread_max(),
            confidence_liquidity_min: default_confidence_liquidity_min(),
        }
    }
}

/// Edge gate thresholds
#[derive(Debug, Clone, Deserialize)]
pub struct GateConfig {
    /// Minimum expected value per unit stake
    #[serde(default = "default_ev_min")]
    pub ev_min: Decimal,
    /// Minimum market liquidity in USD
    #[serde(default = "default_liq_min")]
    pub liq_min: Decimal,
    /// Maximum bid/ask spread
    #[serde(default = "default_spread_max")]
    pub spread_max: Decimal,
}

fn default_ev_min() -> Decimal {
    Decimal::new(2, 2) // 0.02
}
fn default_liq_min() -> Decimal {
    Decimal::new(2_000, 0)
}
fn default_spread_max() -> Decimal {
    Decimal::new(5, 2) // 0.05
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            ev_min: default_ev_min(),
            liq_min: default_liq_min(),
            spread_max: default_spread_max(),
        }
    }
}

/// Position sizing configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SizingConfig {
    /// Fraction of full Kelly to bet (0.25 = quarter Kelly)
    #[serde(default = "default_kelly_scale")]
    pub kelly_scale: Decimal,
    /// Maximum single bet as a fraction of bankroll
    #[serde(default = "default_max_bet_pct")]
    pub max_bet_pct: Decimal,
    /// Maximum total daily exposure as a fraction of bankroll
    #[serde(default = "default_max_daily_exposure_pct")]
    pub max_daily_exposure_pct: Decimal,
    /// Bankroll used when none is given on the command line
    #[serde(default = "default_bankroll")]
    pub default_bankroll: Decimal,
}

fn default_kelly_scale() -> Decimal {
    Decimal::new(25, 2) // 0.25
}
fn default_max_bet_pct() -> Decimal {
    Decimal::new(1, 2) // 0.01
}
fn default_max_daily_exposure_pct() -> Decimal {
    Decimal::new(5, 2) // 0.05
}
fn default_bankroll() -> Decimal {
    Decimal::new(5_000, 0)
}

impl Default for SizingConfig {
    fn default() -> Self {
        Self {
            kelly_scale: default_kelly_scale(),
            max_bet_pct: default_max_bet_pct(),
            max_daily_exposure_pct: default_max_daily_exposure_pct(),
            default_bankroll: default_bankroll(),
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable format
    #[default]
    Pretty,
    /// JSON format for log aggregation
    Json,
}

/// Telemetry configuration
#[derive(Debug, Clone, Deserialize)]
pub struct TelemetryConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub log_format: LogFormat,
    /// Prometheus listener port, disabled when absent
    #[serde(default)]
    pub metrics_port: Option<u16>,
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: LogFormat::Pretty,
            metrics_port: None,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            gamma: GammaConfig::default(),
            clob: ClobConfig::default(),
            odds_api: OddsApiConfig::default(),
            pricing: PricingConfig::default(),
            gate: GateConfig::default(),
            sizing: SizingConfig::default(),
            telemetry: TelemetryConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<std::path::Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check every threshold is inside its domain
    pub fn validate(&self) -> Result<(), AnalysisError> {
        let zero = Decimal::ZERO;
        let one = Decimal::ONE;

        check(
            self.pricing.blend_weight >= zero && self.pricing.blend_weight <= one,
            "pricing.blend_weight must be in [0, 1]",
        )?;
        check(
            self.pricing.confidence_spread_max >= zero,
            "pricing.confidence_spread_max must be >= 0",
        )?;
        check(
            self.pricing.confidence_liquidity_min >= zero,
            "pricing.confidence_liquidity_min must be >= 0",
        )?;
        check(self.gate.ev_min >= zero, "gate.ev_min must be >= 0")?;
        check(self.gate.liq_min >= zero, "gate.liq_min must be >= 0")?;
        check(
            self.gate.spread_max >= zero && self.gate.spread_max <= one,
            "gate.spread_max must be in [0, 1]",
        )?;
        check(
            self.sizing.kelly_scale > zero && self.sizing.kelly_scale <= one,
            "sizing.kelly_scale must be in (0, 1]",
        )?;
        check(
            self.sizing.max_bet_pct > zero && self.sizing.max_bet_pct <= one,
            "sizing.max_bet_pct must be in (0, 1]",
        )?;
        check(
            self.sizing.max_daily_exposure_pct >= zero && self.sizing.max_daily_exposure_pct <= one,
            "sizing.max_daily_exposure_pct must be in [0, 1]",
        )?;
        check(
            self.sizing.default_bankroll > zero,
            "sizing.default_bankroll must be > 0",
        )?;
        check(self.gamma.max_attempts > 0, "gamma.max_attempts must be > 0")?;
        check(self.clob.max_attempts > 0, "clob.max_attempts must be > 0")?;
        check(
            self.odds_api.max_attempts > 0,
            "odds_api.max_attempts must be > 0",
        )?;
        check(
            self.odds_api.max_bookmakers > 0,
            "odds_api.max_bookmakers must be > 0",
        )?;
        Ok(())
    }
}

fn check(ok: bool, message: &str) -> Result<(), AnalysisError> {
    if ok {
        Ok(())
    } else {
        Err(AnalysisError::Configuration(message.to_string()))
    }
}
