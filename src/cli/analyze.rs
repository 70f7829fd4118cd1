//! Analyze command implementation

use clap::Args;
use rust_decimal::Decimal;

use crate::analysis::AnalysisRequest;
use crate::config::Config;
use crate::gate::Side;

#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Polymarket URL or match description
    #[arg(required = true)]
    pub text: Vec<String>,

    /// back (YES) or lay (NO)
    #[arg(long, default_value = "back")]
    pub side: Side,

    /// Bankroll in USD (config default when omitted)
    #[arg(long)]
    pub bankroll: Option<Decimal>,

    /// Amount already staked today
    #[arg(long, default_value = "0")]
    pub exposed: Decimal,

    /// Reference odds, e.g. "Lakers: 1.85, Celtics: 2.05"
    #[arg(long)]
    pub reference: Option<String>,

    /// Reference probability for YES, overrides --reference
    #[arg(long)]
    pub reference_prob: Option<Decimal>,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,
}

impl AnalyzeArgs {
    pub fn request(&self) -> AnalysisRequest {
        AnalysisRequest {
            text: self.text.join(" "),
            side: self.side,
            bankroll: self.bankroll,
            exposure_used: self.exposed,
            // commas separate entries on a single command line
            reference_odds: self.reference.as_ref().map(|r| r.replace(',', "\n")),
            reference_probability: self.reference_prob,
        }
    }

    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let analyzer = super::build_analyzer(config)?;
        let request = self.request();

        let report = analyzer.analyze(&request).await?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else {
            println!("{}", report.to_markdown());
        }
        Ok(())
    }
}
