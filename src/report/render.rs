//! Markdown rendering
//!
//! Six sections: Snapshot, Quality + Costs, Fair Probability, Edge + EV,
//! Sizing, What would change. Every number comes from the report; nothing
//! is recomputed here except threshold distances.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::AnalysisReport;
use crate::gate::ReasonCode;
use crate::risk::CappedBy;

/// Render a report as markdown
pub fn render_markdown(report: &AnalysisReport) -> String {
    let mut lines: Vec<String> = Vec::new();

    lines.push(format!("# {}", report.snapshot.question()));
    if let Some(query) = &report.query {
        lines.push(format!("_Query: {query}_"));
    }
    lines.push(String::new());

    snapshot_section(report, &mut lines);
    quality_section(report, &mut lines);
    fair_section(report, &mut lines);
    edge_section(report, &mut lines);
    sizing_section(report, &mut lines);
    what_would_change_section(report, &mut lines);

    lines.push(format!(
        "_Report {} generated {}_",
        report.id,
        report.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    lines.join("\n")
}

fn snapshot_section(report: &AnalysisReport, lines: &mut Vec<String>) {
    let snap = &report.snapshot;
    lines.push("## 1) Snapshot".to_string());
    lines.push(format!("- Market: `{}` ({})", snap.slug(), snap.market_id()));
    lines.push(format!(
        "- Status: {}",
        if snap.is_tradable() { "active" } else { "not tradable" }
    ));
    lines.push(format!("- Start: {}", fmt_time(snap.start_date())));
    lines.push(format!(
        "- Best bid / ask: {} / {}",
        fmt_opt_price(snap.best_bid()),
        fmt_opt_price(snap.best_ask())
    ));
    lines.push(format!("- Mid: {}", pct(report.fair.mid_implied)));
    lines.push(format!(
        "- Spread: {}",
        snap.spread().map(pct2).unwrap_or_else(|| "unknown".to_string())
    ));
    lines.push(format!(
        "- Liquidity: ${:.0} | 24h volume: ${:.0}",
        snap.liquidity(),
        snap.volume_24hr()
    ));
    lines.push(format!("- Fetched: {}", fmt_time(Some(snap.fetched_at()))));

    if let Some(candidates) = &report.candidates {
        lines.push(String::new());
        lines.push(format!("Other candidates for \"{}\":", candidates.query));
        for c in &candidates.entries {
            lines.push(format!(
                "  {}. {} (liquidity ${:.0}, 24h volume ${:.0}, start {})",
                c.rank,
                c.question,
                c.liquidity,
                c.volume_24hr,
                fmt_time(c.start_date)
            ));
        }
    }
    lines.push(String::new());
}

fn quality_section(report: &AnalysisReport, lines: &mut Vec<String>) {
    let costs = &report.costs;
    lines.push("## 2) Quality + Costs".to_string());
    lines.push(format!(
        "- Grade: {} ({}, score {}/7)",
        report.quality.grade,
        report.quality.grade.description(),
        report.quality.score
    ));
    lines.push(format!("- Half spread: {}", pct2(costs.half_spread)));
    lines.push(format!("- Fee: {}", pct2(costs.fee)));
    lines.push(format!("- Slippage (est.): {}", pct2(costs.slippage)));
    lines.push(format!("- Total cost: {}", pct2(costs.total())));
    lines.push(String::new());
}

fn fair_section(report: &AnalysisReport, lines: &mut Vec<String>) {
    let fair = &report.fair;
    lines.push("## 3) Fair Probability".to_string());
    lines.push(format!("- Mid-implied: {}", pct(fair.mid_implied)));
    let note = if fair.devig_fallback { " (fell back to mid)" } else { "" };
    lines.push(format!("- De-vigged: {}{}", pct(fair.de_vigged), note));
    lines.push(format!(
        "- Reference: {}",
        fair.reference_probability
            .map(pct)
            .unwrap_or_else(|| "none".to_string())
    ));
    lines.push(format!(
        "- Blended ({}): {}",
        fair.blend_method,
        pct(fair.blended)
    ));
    lines.push(format!("- Confidence: {}", fair.confidence));
    lines.push(String::new());
}

fn edge_section(report: &AnalysisReport, lines: &mut Vec<String>) {
    let d = &report.decision;
    lines.push("## 4) Edge + EV".to_string());
    lines.push(format!("- Side: {}", d.side));
    lines.push(format!("- Fair probability: {}", pct(d.fair_probability)));
    lines.push(format!("- Market price: {}", pct(d.market_implied)));
    lines.push(format!("- Breakeven (incl. fee): {}", pct(d.breakeven)));
    lines.push(format!("- Edge: {}", signed_pct(d.edge)));
    lines.push(format!(
        "- EV per $1: {} (minimum {})",
        signed_pct(d.expected_value),
        pct(report.thresholds.ev_min)
    ));
    if d.approved {
        lines.push("- Verdict: **APPROVED**".to_string());
    } else {
        let reasons: Vec<String> = d.reject_reasons.iter().map(|r| r.to_string()).collect();
        lines.push(format!("- Verdict: **REJECTED** ({})", reasons.join(", ")));
    }
    lines.push(String::new());
}

fn sizing_section(report: &AnalysisReport, lines: &mut Vec<String>) {
    let s = &report.sizing;
    lines.push("## 5) Sizing".to_string());
    lines.push(format!("- Full Kelly: {}", pct2(s.full_kelly)));
    lines.push(format!("- Fractional Kelly: {}", pct2(s.kelly_fraction)));
    lines.push(format!("- Recommended stake: ${:.2}", s.recommended_stake));
    if s.capped_by != CappedBy::None {
        lines.push(format!("- Bound by: {}", s.capped_by));
    }
    lines.push(String::new());
}

fn what_would_change_section(report: &AnalysisReport, lines: &mut Vec<String>) {
    let d = &report.decision;
    let t = &report.thresholds;
    let snap = &report.snapshot;

    lines.push("## 6) What would change".to_string());

    if d.approved {
        lines.push(format!(
            "- Stays approved while fair probability is at least {} and the {} price is at most {}",
            pct(d.required_probability),
            d.side,
            pct(d.max_price)
        ));
        if matches!(report.sizing.capped_by, CappedBy::MaxBet | CappedBy::DailyExposure) {
            lines.push(format!(
                "- Stake is limited by {}; raising that limit would raise the stake",
                report.sizing.capped_by
            ));
        }
    }

    if d.rejected_for(ReasonCode::EvTooLow) {
        lines.push(format!(
            "- Fair probability would need to reach {} (currently {})",
            pct(d.required_probability),
            pct(d.fair_probability)
        ));
        lines.push(format!(
            "- Or the {} price would need to drop to {} (currently {})",
            d.side,
            pct(d.max_price),
            pct(d.market_implied)
        ));
    }
    if d.rejected_for(ReasonCode::LiquidityTooLow) {
        lines.push(format!(
            "- Liquidity would need to reach ${:.0} (currently ${:.0})",
            t.liq_min,
            snap.liquidity()
        ));
    }
    if d.rejected_for(ReasonCode::SpreadTooWide) {
        match snap.spread() {
            Some(spread) => lines.push(format!(
                "- Spread would need to tighten to {} (currently {})",
                pct2(t.spread_max),
                pct2(spread)
            )),
            None => lines.push(format!(
                "- Both sides of the book would need quotes with a spread of at most {}",
                pct2(t.spread_max)
            )),
        }
    }
    if d.edge < Decimal::ZERO {
        lines.push(format!(
            "- The {} side carries the positive edge ({})",
            d.side.opposite(),
            signed_pct(-d.edge)
        ));
    }
    lines.push(String::new());
}

fn pct(value: Decimal) -> String {
    format!("{:.1}%", value * dec!(100))
}

fn pct2(value: Decimal) -> String {
    format!("{:.2}%", value * dec!(100))
}

fn signed_pct(value: Decimal) -> String {
    if value >= Decimal::ZERO {
        format!("+{}", pct(value))
    } else {
        pct(value)
    }
}

fn fmt_opt_price(value: Option<Decimal>) -> String {
    value
        .map(|v| format!("{v:.3}"))
        .unwrap_or_else(|| "-".to_string())
}

fn fmt_time(value: Option<DateTime<Utc>>) -> String {
    value
        .map(|t| t.format("%Y-%m-%d %H:%M UTC").to_string())
        .unwrap_or_else(|| "unknown".to_string())
}
