//! Chat command implementation
//!
//! Each message is one or more lines ended by a blank line. The first line
//! is the market URL or description; any `Name: odds` lines after it are
//! reference odds. `/side`, `/bankroll` and `/exposed` adjust the session.

use clap::Args;
use rust_decimal::Decimal;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::analysis::AnalysisRequest;
use crate::config::Config;
use crate::gate::Side;

#[derive(Args, Debug)]
pub struct ChatArgs {
    /// Initial side
    #[arg(long, default_value = "back")]
    pub side: Side,

    /// Bankroll in USD (config default when omitted)
    #[arg(long)]
    pub bankroll: Option<Decimal>,
}

/// Session state carried between messages
#[derive(Debug, Clone, PartialEq)]
struct Session {
    side: Side,
    bankroll: Option<Decimal>,
    exposed: Decimal,
}

/// What a single input line asks for
#[derive(Debug, Clone, PartialEq)]
enum Command {
    Quit,
    Help,
    SetSide(Side),
    SetBankroll(Decimal),
    SetExposed(Decimal),
    Invalid(String),
}

impl ChatArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let analyzer = super::build_analyzer(config)?;
        let mut session = Session {
            side: self.side,
            bankroll: self.bankroll,
            exposed: Decimal::ZERO,
        };

        println!("Paste a Polymarket link or describe the match; finish with a blank line.");
        println!("Type /help for commands, exit to quit.");

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut buffer = MessageBuffer::default();

        while let Some(line) = lines.next_line().await? {
            match buffer.feed(&line) {
                Step::Pending => {}
                Step::Command(Command::Quit) => break,
                Step::Command(command) => session.apply(command),
                Step::Message(message) => run_message(&analyzer, &message, &mut session).await,
            }
        }
        // input ended mid-message
        if let Some(message) = buffer.finish() {
            run_message(&analyzer, &message, &mut session).await;
        }

        tracing::info!("Chat session ended");
        Ok(())
    }
}

impl Session {
    fn apply(&mut self, command: Command) {
        match command {
            Command::Quit => {}
            Command::Help => println!("{}", HELP),
            Command::SetSide(side) => self.side = side,
            Command::SetBankroll(b) => self.bankroll = Some(b),
            Command::SetExposed(e) => self.exposed = e,
            Command::Invalid(msg) => println!("{msg}"),
        }
    }
}

/// Outcome of feeding one input line
#[derive(Debug, Clone, PartialEq)]
enum Step {
    /// Line absorbed, nothing to do yet
    Pending,
    Command(Command),
    /// A complete message, first line is the market
    Message(Vec<String>),
}

/// Accumulates lines into blank-line terminated messages
#[derive(Debug, Default)]
struct MessageBuffer {
    lines: Vec<String>,
}

impl MessageBuffer {
    fn feed(&mut self, line: &str) -> Step {
        let trimmed = line.trim();

        // commands only start a message, never continue one
        if self.lines.is_empty() {
            if let Some(command) = parse_command(trimmed) {
                return Step::Command(command);
            }
        }

        if !trimmed.is_empty() {
            self.lines.push(trimmed.to_string());
            return Step::Pending;
        }
        if self.lines.is_empty() {
            return Step::Pending;
        }
        Step::Message(std::mem::take(&mut self.lines))
    }

    /// Take whatever is left once input is exhausted
    fn finish(self) -> Option<Vec<String>> {
        (!self.lines.is_empty()).then_some(self.lines)
    }
}

async fn run_message(analyzer: &super::LiveAnalyzer, message: &[String], session: &mut Session) {
    let request = build_request(message, session);
    match analyzer.analyze(&request).await {
        Ok(report) => {
            println!("{}", report.to_markdown());
            session.exposed += report.sizing.recommended_stake;
        }
        Err(e) => println!("{}", super::explain(&e)),
    }
}

const HELP: &str = "Commands:
  /side back|lay     choose the side to evaluate
  /bankroll <usd>    set the bankroll
  /exposed <usd>     set the amount already staked today
  exit | quit        leave";

fn parse_command(line: &str) -> Option<Command> {
    if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") {
        return Some(Command::Quit);
    }
    let rest = line.strip_prefix('/')?;
    let mut parts = rest.split_whitespace();
    let name = parts.next().unwrap_or_default();
    let arg = parts.next().unwrap_or_default();

    let command = match name {
        "help" => Command::Help,
        "side" => match arg.parse() {
            Ok(side) => Command::SetSide(side),
            Err(e) => Command::Invalid(e),
        },
        "bankroll" => match arg.parse::<Decimal>() {
            Ok(b) if b > Decimal::ZERO => Command::SetBankroll(b),
            _ => Command::Invalid(format!("invalid bankroll '{arg}'")),
        },
        "exposed" => match arg.parse::<Decimal>() {
            Ok(e) if e >= Decimal::ZERO => Command::SetExposed(e),
            _ => Command::Invalid(format!("invalid exposure '{arg}'")),
        },
        other => Command::Invalid(format!("unknown command '/{other}'")),
    };
    Some(command)
}

fn build_request(message: &[String], session: &Session) -> AnalysisRequest {
    let (text, odds) = message.split_first().map_or(("", &[][..]), |(t, rest)| (t.as_str(), rest));
    AnalysisRequest {
        text: text.to_string(),
        side: session.side,
        bankroll: session.bankroll,
        exposure_used: session.exposed,
        reference_odds: (!odds.is_empty()).then(|| odds.join("\n")),
        reference_probability: None,
    }
}
