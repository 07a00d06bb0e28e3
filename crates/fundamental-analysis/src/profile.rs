//! Descriptive company profile: sector reference points and one-line
//! readings of debt, dividend and revenue growth. Informational only.

use analysis_core::{CompanyProfile, FinancialRecord, Metric, SectorInsight};

use crate::compounding::{HIGH_DEBT_TO_EQUITY, LOW_DEBT_TO_EQUITY};
use crate::valuation::sector_benchmark_pe;

const DEFAULT_TYPICAL_PE: f64 = 18.0;
const ATTRACTIVE_DIVIDEND_YIELD: f64 = 0.03;
const STRONG_REVENUE_GROWTH: f64 = 0.05;

struct SectorTraits {
    sector: &'static str,
    key_metrics: &'static [&'static str],
    growth_expectation: &'static str,
    volatility: &'static str,
}

const SECTOR_TRAITS: &[SectorTraits] = &[
    SectorTraits {
        sector: "Technology",
        key_metrics: &["P/E ratio", "Revenue growth", "R&D spending"],
        growth_expectation: "High",
        volatility: "High",
    },
    SectorTraits {
        sector: "Healthcare",
        key_metrics: &["P/E ratio", "Pipeline strength", "Regulatory approvals"],
        growth_expectation: "Moderate",
        volatility: "Moderate",
    },
    SectorTraits {
        sector: "Financial Services",
        key_metrics: &["P/B ratio", "ROE", "Net interest margin"],
        growth_expectation: "Low-Moderate",
        volatility: "Moderate",
    },
];

const DEFAULT_TRAITS: SectorTraits = SectorTraits {
    sector: "Unknown",
    key_metrics: &["P/E ratio", "Revenue growth", "Debt levels"],
    growth_expectation: "Moderate",
    volatility: "Moderate",
};

/// Reference points for `sector`. Unlisted or unknown sectors get generic
/// metrics; the typical P/E is the sector benchmark when one exists.
pub fn sector_insight(sector: Option<&str>) -> SectorInsight {
    let name = sector.map(str::trim).filter(|s| !s.is_empty());
    let traits = name
        .and_then(|n| SECTOR_TRAITS.iter().find(|t| t.sector.eq_ignore_ascii_case(n)))
        .unwrap_or(&DEFAULT_TRAITS);

    SectorInsight {
        sector: name.unwrap_or(DEFAULT_TRAITS.sector).to_string(),
        key_metrics: traits.key_metrics.iter().map(|m| m.to_string()).collect(),
        typical_pe: name.and_then(sector_benchmark_pe).unwrap_or(DEFAULT_TYPICAL_PE),
        growth_expectation: traits.growth_expectation.to_string(),
        volatility: traits.volatility.to_string(),
    }
}

pub fn financial_health(debt_to_equity: &Metric) -> String {
    match debt_to_equity.value() {
        Some(de) if de > 0.0 && de < LOW_DEBT_TO_EQUITY => "Strong balance sheet (low debt)".to_string(),
        Some(de) if de > HIGH_DEBT_TO_EQUITY => "High debt levels".to_string(),
        Some(de) if de > 0.0 => "Moderate debt levels".to_string(),
        _ => "Debt information not available".to_string(),
    }
}

pub fn dividend(dividend_yield: &Metric) -> String {
    match dividend_yield.value() {
        Some(y) if y > ATTRACTIVE_DIVIDEND_YIELD => {
            format!("Attractive dividend yield ({:.1}%)", y * 100.0)
        }
        Some(y) if y > 0.0 => format!("Moderate dividend yield ({:.1}%)", y * 100.0),
        _ => "No dividend or data not available".to_string(),
    }
}

pub fn revenue_growth(growth: &Metric) -> String {
    match growth.value() {
        Some(g) if g > STRONG_REVENUE_GROWTH => format!("Strong revenue growth ({:.1}%)", g * 100.0),
        Some(g) if g < 0.0 => format!("Declining revenue ({:.1}%)", g * 100.0),
        _ => "Moderate or unknown revenue growth".to_string(),
    }
}

pub fn profile(record: &FinancialRecord) -> CompanyProfile {
    CompanyProfile {
        sector_insight: sector_insight(record.sector.as_deref()),
        financial_health: financial_health(&record.debt_to_equity),
        dividend: dividend(&record.dividend_yield),
        revenue_growth: revenue_growth(&record.revenue_growth),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_sector_insight() {
        let insight = sector_insight(Some("financial services"));
        assert_eq!(insight.sector, "financial services");
        assert_eq!(insight.key_metrics, vec!["P/B ratio", "ROE", "Net interest margin"]);
        assert_eq!(insight.typical_pe, 12.0);
        assert_eq!(insight.growth_expectation, "Low-Moderate");
    }

    #[test]
    fn test_unlisted_sector_uses_generic_traits() {
        // benchmark P/E exists, traits do not
        let energy = sector_insight(Some("Energy"));
        assert_eq!(energy.key_metrics, vec!["P/E ratio", "Revenue growth", "Debt levels"]);
        assert_eq!(energy.typical_pe, 15.0);

        let unknown = sector_insight(None);
        assert_eq!(unknown.sector, "Unknown");
        assert_eq!(unknown.typical_pe, DEFAULT_TYPICAL_PE);
        assert_eq!(sector_insight(Some("  ")).sector, "Unknown");
    }

    #[test]
    fn test_readings() {
        assert_eq!(financial_health(&Metric::new(0.2)), "Strong balance sheet (low debt)");
        assert_eq!(financial_health(&Metric::new(0.6)), "Moderate debt levels");
        assert_eq!(financial_health(&Metric::new(1.8)), "High debt levels");
        assert_eq!(financial_health(&Metric::new(0.0)), "Debt information not available");
        assert_eq!(financial_health(&Metric::missing()), "Debt information not available");

        assert_eq!(dividend(&Metric::new(0.045)), "Attractive dividend yield (4.5%)");
        assert_eq!(dividend(&Metric::new(0.012)), "Moderate dividend yield (1.2%)");
        assert_eq!(dividend(&Metric::missing()), "No dividend or data not available");

        assert_eq!(revenue_growth(&Metric::new(0.12)), "Strong revenue growth (12.0%)");
        assert_eq!(revenue_growth(&Metric::new(-0.04)), "Declining revenue (-4.0%)");
        assert_eq!(revenue_growth(&Metric::new(0.02)), "Moderate or unknown revenue growth");
    }

    #[test]
    fn test_profile_from_record() {
        let mut record = FinancialRecord::new("JPM", 190.0);
        record.sector = Some("Financial Services".to_string());
        record.debt_to_equity = Metric::new(1.4);
        record.dividend_yield = Metric::new(0.024);
        let profile = profile(&record);

        assert_eq!(profile.sector_insight.typical_pe, 12.0);
        assert_eq!(profile.financial_health, "High debt levels");
        assert_eq!(profile.dividend, "Moderate dividend yield (2.4%)");
        assert_eq!(profile.revenue_growth, "Moderate or unknown revenue growth");
    }
}
