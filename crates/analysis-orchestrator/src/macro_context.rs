//! Macroeconomic backdrop for a stock: how GDP growth, inflation and rates
//! are likely to bear on its sector. Informational only; nothing here feeds
//! the recommendation score.

use analysis_core::{AbsentReason, MacroIndicatorSource, Metric};
use serde::{Deserialize, Serialize};

pub const GDP_GROWTH: &str = "gdp_growth";
pub const INFLATION_RATE: &str = "inflation_rate";
pub const FED_FUNDS_RATE: &str = "fed_funds_rate";
pub const UNEMPLOYMENT_RATE: &str = "unemployment_rate";
pub const VIX: &str = "vix";

/// History requested per indicator; only the latest observation is used.
const INDICATOR_PERIODS: usize = 12;

/// Latest reading of each indicator, in percent (VIX in index points).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MacroSnapshot {
    pub gdp_growth: Metric,
    pub inflation_rate: Metric,
    pub fed_funds_rate: Metric,
    pub unemployment_rate: Metric,
    pub vix: Metric,
}

impl Default for MacroSnapshot {
    fn default() -> Self {
        Self {
            gdp_growth: Metric::missing(),
            inflation_rate: Metric::missing(),
            fed_funds_rate: Metric::missing(),
            unemployment_rate: Metric::missing(),
            vix: Metric::missing(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Impact {
    Positive,
    Negative,
    Neutral,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketMood {
    Fear,
    Greed,
    Neutral,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sensitivity {
    High,
    Medium,
    Low,
}

/// How strongly a sector reacts to each macro driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectorSensitivity {
    pub gdp: Sensitivity,
    pub inflation: Sensitivity,
    pub interest: Sensitivity,
    pub unemployment: Sensitivity,
}

impl SectorSensitivity {
    pub fn for_sector(sector: Option<&str>) -> Self {
        use Sensitivity::*;
        let (gdp, inflation, interest, unemployment) = match sector.map(str::trim) {
            Some("Consumer Cyclical") => (High, High, Medium, High),
            Some("Technology") => (Medium, Medium, High, Low),
            Some("Financial Services") => (High, Medium, High, High),
            Some("Healthcare") => (Low, Low, Low, Low),
            Some("Energy") => (High, High, Medium, Medium),
            Some("Utilities") => (Low, Medium, High, Low),
            _ => (Medium, Medium, Medium, Medium),
        };
        Self {
            gdp,
            inflation,
            interest,
            unemployment,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MacroContext {
    pub overall: Impact,
    pub gdp_impact: Impact,
    pub inflation_impact: Impact,
    pub rate_impact: Impact,
    /// Rate impact that applies specifically because of the sector.
    pub sector_impact: Impact,
    /// `None` when VIX is unavailable.
    pub market_mood: Option<MarketMood>,
    pub sector_sensitivity: SectorSensitivity,
    pub notes: Vec<String>,
    pub indicators: MacroSnapshot,
}

fn gdp_impact(gdp_growth: &Metric) -> Impact {
    match gdp_growth.value() {
        Some(g) if g > 2.0 => Impact::Positive,
        Some(g) if g < 0.0 => Impact::Negative,
        _ => Impact::Neutral,
    }
}

fn inflation_impact(inflation: &Metric) -> Impact {
    match inflation.value() {
        Some(i) if i > 4.0 => Impact::Negative,
        Some(i) if (2.0..=3.0).contains(&i) => Impact::Positive,
        _ => Impact::Neutral,
    }
}

/// Rate impact and whether it is sector specific.
fn rate_impact(rate: &Metric, sector: Option<&str>) -> (Impact, bool) {
    let rate = match rate.value() {
        Some(r) => r,
        None => return (Impact::Neutral, false),
    };
    match sector.map(str::trim) {
        Some("Financial Services") | Some("Banking") if rate > 3.0 => (Impact::Positive, true),
        Some("Real Estate") | Some("Utilities") | Some("REITs") if rate > 4.0 => (Impact::Negative, true),
        Some("Technology") if rate > 4.0 => (Impact::Negative, false),
        _ => (Impact::Neutral, false),
    }
}

pub fn market_mood(vix: &Metric) -> Option<MarketMood> {
    vix.value().map(|v| {
        if v > 30.0 {
            MarketMood::Fear
        } else if v < 15.0 {
            MarketMood::Greed
        } else {
            MarketMood::Neutral
        }
    })
}

/// Assess the macro backdrop for a company in `sector`.
pub fn assess_macro(snapshot: &MacroSnapshot, sector: Option<&str>) -> MacroContext {
    let mut notes = Vec::new();

    let gdp_impact = gdp_impact(&snapshot.gdp_growth);
    match gdp_impact {
        Impact::Positive => notes.push("Strong GDP growth supports spending and investment".to_string()),
        Impact::Negative => notes.push("GDP contraction may reduce corporate earnings".to_string()),
        Impact::Neutral => {}
    }

    let inflation_impact = inflation_impact(&snapshot.inflation_rate);
    match inflation_impact {
        Impact::Positive => notes.push("Moderate inflation indicates healthy growth".to_string()),
        Impact::Negative => notes.push("High inflation may pressure margins and consumer spending".to_string()),
        Impact::Neutral => {}
    }

    let (rate_impact, sector_specific) = rate_impact(&snapshot.fed_funds_rate, sector);
    match rate_impact {
        Impact::Positive => notes.push("Higher rates benefit financial sector margins".to_string()),
        Impact::Negative if sector_specific => {
            notes.push("High rates may pressure rate-sensitive sectors".to_string())
        }
        Impact::Negative => notes.push("Higher rates may compress growth valuations".to_string()),
        Impact::Neutral => {}
    }
    let sector_impact = if sector_specific { rate_impact } else { Impact::Neutral };

    let impacts = [gdp_impact, inflation_impact, rate_impact];
    let positive = impacts.iter().filter(|i| **i == Impact::Positive).count();
    let negative = impacts.iter().filter(|i| **i == Impact::Negative).count();
    let overall = if positive > negative {
        Impact::Positive
    } else if negative > positive {
        Impact::Negative
    } else {
        Impact::Neutral
    };

    MacroContext {
        overall,
        gdp_impact,
        inflation_impact,
        rate_impact,
        sector_impact,
        market_mood: market_mood(&snapshot.vix),
        sector_sensitivity: SectorSensitivity::for_sector(sector),
        notes,
        indicators: snapshot.clone(),
    }
}

/// Fetch the latest value of every indicator concurrently.
///
/// A failing indicator is logged and left absent. Returns `None` only when
/// every fetch failed, i.e. the source itself is unusable.
pub async fn fetch_macro_snapshot(source: &dyn MacroIndicatorSource) -> Option<MacroSnapshot> {
    let (gdp, inflation, rate, unemployment, vix) = tokio::join!(
        source.fetch_indicator(GDP_GROWTH, INDICATOR_PERIODS),
        source.fetch_indicator(INFLATION_RATE, INDICATOR_PERIODS),
        source.fetch_indicator(FED_FUNDS_RATE, INDICATOR_PERIODS),
        source.fetch_indicator(UNEMPLOYMENT_RATE, INDICATOR_PERIODS),
        source.fetch_indicator(VIX, INDICATOR_PERIODS),
    );

    let results = [
        (GDP_GROWTH, gdp),
        (INFLATION_RATE, inflation),
        (FED_FUNDS_RATE, rate),
        (UNEMPLOYMENT_RATE, unemployment),
        (VIX, vix),
    ];
    if results.iter().all(|(_, r)| r.is_err()) {
        tracing::warn!("Macro indicator source failed for every indicator");
        return None;
    }

    let [gdp, inflation, rate, unemployment, vix] = results.map(|(name, result)| match result {
        Ok(Some(series)) => series
            .last()
            .map(|&v| Metric::new(v))
            .unwrap_or_else(Metric::missing),
        Ok(None) => Metric::missing(),
        Err(e) => {
            tracing::warn!("Failed to fetch macro indicator {}: {}", name, e);
            Metric::Absent(AbsentReason::Undefined {
                detail: e.to_string(),
            })
        }
    });

    Some(MacroSnapshot {
        gdp_growth: gdp,
        inflation_rate: inflation,
        fed_funds_rate: rate,
        unemployment_rate: unemployment,
        vix,
    })
}
