use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{AbsentReason, Metric};

/// Normalized snapshot of one company at one point in time.
///
/// Built once per analysis request by the normalizer and never mutated
/// afterwards. Multi-year series are chronological (oldest first, latest
/// last); individual years may be absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialRecord {
    pub symbol: String,
    pub current_price: f64,
    pub shares_outstanding: Metric,
    pub trailing_eps: Metric,
    pub forward_eps: Metric,
    pub trailing_pe: Metric,
    pub free_cash_flow: Vec<Metric>,
    pub operating_cash_flow: Metric,
    pub total_debt: Metric,
    pub total_debt_history: Vec<Metric>,
    pub retained_earnings: Vec<Metric>,
    pub revenue: Vec<Metric>,
    pub net_income: Vec<Metric>,
    /// Return on equity as a fraction (0.15 = 15%).
    pub return_on_equity: Vec<Metric>,
    pub book_value_per_share: Metric,
    /// Year-over-year earnings growth as a fraction.
    pub earnings_growth: Metric,
    /// Year-over-year revenue growth as a fraction.
    pub revenue_growth: Metric,
    /// Total debt over shareholder equity, as a ratio (0.5 = 50%).
    pub debt_to_equity: Metric,
    pub dividend_yield: Metric,
    /// Net margin as a fraction.
    pub profit_margin: Metric,
    pub sector: Option<String>,
    /// Daily closes, chronological. Unusable entries were dropped.
    pub price_history: Vec<f64>,
    pub dropped_price_points: usize,
    pub as_of: Option<NaiveDate>,
    /// Provider field names that were missing or unusable.
    pub missing_fields: Vec<String>,
}

impl FinancialRecord {
    /// Record with only the mandatory identity fields; everything else absent.
    pub fn new(symbol: impl Into<String>, current_price: f64) -> Self {
        Self {
            symbol: symbol.into(),
            current_price,
            shares_outstanding: Metric::missing(),
            trailing_eps: Metric::missing(),
            forward_eps: Metric::missing(),
            trailing_pe: Metric::missing(),
            free_cash_flow: Vec::new(),
            operating_cash_flow: Metric::missing(),
            total_debt: Metric::missing(),
            total_debt_history: Vec::new(),
            retained_earnings: Vec::new(),
            revenue: Vec::new(),
            net_income: Vec::new(),
            return_on_equity: Vec::new(),
            book_value_per_share: Metric::missing(),
            earnings_growth: Metric::missing(),
            revenue_growth: Metric::missing(),
            debt_to_equity: Metric::missing(),
            dividend_yield: Metric::missing(),
            profit_margin: Metric::missing(),
            sector: None,
            price_history: Vec::new(),
            dropped_price_points: 0,
            as_of: None,
            missing_fields: Vec::new(),
        }
    }

    pub fn latest_free_cash_flow(&self) -> Metric {
        latest(&self.free_cash_flow)
    }

    pub fn latest_revenue(&self) -> Metric {
        latest(&self.revenue)
    }

    pub fn latest_net_income(&self) -> Metric {
        latest(&self.net_income)
    }
}

/// Last entry of a chronological series, absent when the series is empty.
pub fn latest(series: &[Metric]) -> Metric {
    series
        .last()
        .cloned()
        .unwrap_or(Metric::Absent(AbsentReason::Missing))
}

/// How much a valuation figure can be trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    /// Computed from reported inputs only.
    Full,
    /// Computed, but at least one input came from a fallback.
    Partial,
    Unavailable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValuationMethod {
    Dcf,
    PriceEarnings,
}

impl ValuationMethod {
    pub fn label(&self) -> &'static str {
        match self {
            ValuationMethod::Dcf => "DCF",
            ValuationMethod::PriceEarnings => "P/E",
        }
    }
}

/// Outcome of a single valuation method.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodValuation {
    pub method: ValuationMethod,
    /// Fair value per share.
    pub fair_value: Metric,
    pub confidence: Confidence,
    /// Inputs and fallbacks used, in order.
    pub notes: Vec<String>,
}

impl MethodValuation {
    pub fn unavailable(method: ValuationMethod, reason: AbsentReason, note: impl Into<String>) -> Self {
        Self {
            method,
            fair_value: Metric::Absent(reason),
            confidence: Confidence::Unavailable,
            notes: vec![note.into()],
        }
    }

    pub fn is_available(&self) -> bool {
        self.fair_value.is_present()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuationResult {
    pub dcf: MethodValuation,
    pub pe: MethodValuation,
    pub methods_used: Vec<ValuationMethod>,
    /// `sqrt(22.5 * EPS * book value per share)`.
    pub graham_number: Metric,
    pub peg_ratio: Metric,
}

impl ValuationResult {
    /// DCF when available, else P/E, else `None`.
    pub fn best_fair_value(&self) -> Option<(ValuationMethod, f64)> {
        [&self.dcf, &self.pe]
            .into_iter()
            .find_map(|m| m.fair_value.value().map(|v| (m.method, v)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Bullish,
    Bearish,
    Neutral,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Moderate,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechnicalSnapshot {
    pub sma_short: Metric,
    pub sma_long: Metric,
    pub rsi: Metric,
    pub trend: Trend,
    pub last_close: Metric,
    pub observations: usize,
    pub annualized_volatility: Metric,
    pub risk_level: Option<RiskLevel>,
}

/// Discrete recommendation label. Ordered from most bearish to most bullish,
/// with `InsufficientData` kept apart from the scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    StrongSell,
    Sell,
    Hold,
    Buy,
    StrongBuy,
    InsufficientData,
}

impl Recommendation {
    pub fn to_label(&self) -> &'static str {
        match self {
            Recommendation::StrongBuy => "Strong Buy",
            Recommendation::Buy => "Buy",
            Recommendation::Hold => "Hold",
            Recommendation::Sell => "Sell",
            Recommendation::StrongSell => "Strong Sell",
            Recommendation::InsufficientData => "Insufficient Data",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Factor {
    ValuationGap,
    Momentum,
    PeSanity,
}

impl Factor {
    pub fn name(&self) -> &'static str {
        match self {
            Factor::ValuationGap => "Valuation Gap",
            Factor::Momentum => "Momentum",
            Factor::PeSanity => "P/E Sanity",
        }
    }
}

/// One line of the recommendation breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorContribution {
    pub factor: Factor,
    /// The factor's input (gap fraction, RSI, trailing P/E).
    pub raw_value: Metric,
    /// Unweighted factor score in [-5, 5]; 0 when the factor is absent.
    pub factor_score: f64,
    pub weight: f64,
    pub contribution: f64,
    pub available: bool,
    pub detail: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationResult {
    /// Composite score in [-5, 5]. `None` only for `InsufficientData`.
    pub score: Option<f64>,
    pub label: Recommendation,
    pub breakdown: Vec<FactorContribution>,
    /// Signed factor summary, e.g. "+ Valuation Gap, - Momentum".
    pub reason: String,
}

impl RecommendationResult {
    /// Sum of the weighted contributions listed in the breakdown.
    pub fn contribution_total(&self) -> f64 {
        self.breakdown.iter().map(|f| f.contribution).sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompoundingVerdict {
    Strong,
    Moderate,
    Weak,
    InsufficientData,
}

/// The multi-year inputs a compounding score was computed from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompoundingSeries {
    pub revenue: Vec<Metric>,
    pub net_income: Vec<Metric>,
    pub return_on_equity: Vec<Metric>,
    pub retained_earnings: Vec<Metric>,
    pub total_debt: Vec<Metric>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompoundingScore {
    /// Mean of the present sub-scores, 0-10, one decimal.
    pub composite: Metric,
    pub growth_consistency: Metric,
    pub roe_trend: Metric,
    pub reinvestment_quality: Metric,
    pub debt_discipline: Metric,
    pub verdict: CompoundingVerdict,
    pub avg_revenue_growth_pct: Metric,
    pub avg_profit_growth_pct: Metric,
    pub avg_roe_pct: Metric,
    pub avg_retained_earnings_growth_pct: Metric,
    /// Latest debt-to-equity ratio, as reported.
    pub debt_to_equity: Metric,
    pub profit_margin_pct: Metric,
    /// Readings that support compounding, e.g. "High ROE (21.3%)".
    pub factors: Vec<String>,
    /// Readings that work against it.
    pub warnings: Vec<String>,
    pub series: CompoundingSeries,
}

impl CompoundingScore {
    pub fn sub_scores(&self) -> [&Metric; 4] {
        [
            &self.growth_consistency,
            &self.roe_trend,
            &self.reinvestment_quality,
            &self.debt_discipline,
        ]
    }
}

/// Reference points for a company's sector. Informational only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectorInsight {
    /// Sector as reported, or "Unknown".
    pub sector: String,
    pub key_metrics: Vec<String>,
    pub typical_pe: f64,
    pub growth_expectation: String,
    pub volatility: String,
}

/// Plain-language readings of the balance sheet, dividend and revenue
/// trend, plus sector context. Never feeds the recommendation score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyProfile {
    pub sector_insight: SectorInsight,
    pub financial_health: String,
    pub dividend: String,
    pub revenue_growth: String,
}
