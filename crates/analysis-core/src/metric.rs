use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a value could not be produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum AbsentReason {
    /// The provider did not supply the field (missing key or `null`).
    Missing,
    /// The field was present but could not be read as a number.
    NonNumeric,
    /// NaN or infinite.
    NonFinite,
    /// A positive input was required.
    NonPositive,
    /// Not enough observations for the requested window.
    InsufficientHistory { required: usize, available: usize },
    /// The computation is mathematically undefined for these inputs.
    Undefined { detail: String },
}

impl fmt::Display for AbsentReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AbsentReason::Missing => write!(f, "missing"),
            AbsentReason::NonNumeric => write!(f, "non-numeric"),
            AbsentReason::NonFinite => write!(f, "non-finite"),
            AbsentReason::NonPositive => write!(f, "non-positive"),
            AbsentReason::InsufficientHistory { required, available } => {
                write!(f, "needs {} observations, have {}", required, available)
            }
            AbsentReason::Undefined { detail } => write!(f, "undefined: {}", detail),
        }
    }
}

/// A numeric value that may be explicitly absent.
///
/// Every figure the engine reads or produces flows through this type so that
/// "absent" and "zero" can never be confused. There is deliberately no
/// `unwrap_or_default`-style accessor: callers either match on the variant or
/// use [`Metric::value`] and handle `None` themselves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum Metric {
    Value(f64),
    Absent(AbsentReason),
}

impl Metric {
    /// Wrap a float, rejecting NaN and infinities.
    pub fn new(value: f64) -> Self {
        if value.is_finite() {
            Metric::Value(value)
        } else {
            Metric::Absent(AbsentReason::NonFinite)
        }
    }

    pub fn missing() -> Self {
        Metric::Absent(AbsentReason::Missing)
    }

    pub fn undefined(detail: impl Into<String>) -> Self {
        Metric::Absent(AbsentReason::Undefined { detail: detail.into() })
    }

    /// Build from an `Option`, recording `reason` when it is `None`.
    pub fn from_option(value: Option<f64>, reason: AbsentReason) -> Self {
        match value {
            Some(v) => Metric::new(v),
            None => Metric::Absent(reason),
        }
    }

    pub fn value(&self) -> Option<f64> {
        match self {
            Metric::Value(v) => Some(*v),
            Metric::Absent(_) => None,
        }
    }

    pub fn is_present(&self) -> bool {
        matches!(self, Metric::Value(_))
    }

    pub fn is_absent(&self) -> bool {
        !self.is_present()
    }

    pub fn reason(&self) -> Option<&AbsentReason> {
        match self {
            Metric::Value(_) => None,
            Metric::Absent(reason) => Some(reason),
        }
    }

    /// Keep the value only if it is strictly positive.
    pub fn positive(self) -> Self {
        match self {
            Metric::Value(v) if v > 0.0 => Metric::Value(v),
            Metric::Value(_) => Metric::Absent(AbsentReason::NonPositive),
            absent => absent,
        }
    }

    /// Transform a present value. A non-finite result becomes absent.
    pub fn map<F: FnOnce(f64) -> f64>(self, f: F) -> Self {
        match self {
            Metric::Value(v) => Metric::new(f(v)),
            absent => absent,
        }
    }

    pub fn and_then<F: FnOnce(f64) -> Metric>(self, f: F) -> Self {
        match self {
            Metric::Value(v) => f(v),
            absent => absent,
        }
    }

    /// Use `f` only when this metric is absent.
    pub fn or_else<F: FnOnce() -> Metric>(self, f: F) -> Self {
        match self {
            Metric::Value(v) => Metric::Value(v),
            Metric::Absent(_) => f(),
        }
    }

    /// Present values of a series, in order.
    pub fn present_values(series: &[Metric]) -> Vec<f64> {
        series.iter().filter_map(Metric::value).collect()
    }
}

impl Default for Metric {
    fn default() -> Self {
        Metric::missing()
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Metric::Value(v) => write!(f, "{:.2}", v),
            Metric::Absent(reason) => write!(f, "n/a ({})", reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_finite_is_absent() {
        assert_eq!(Metric::new(f64::NAN), Metric::Absent(AbsentReason::NonFinite));
        assert_eq!(Metric::new(f64::INFINITY).value(), None);
    }

    #[test]
    fn test_zero_is_present() {
        let m = Metric::new(0.0);
        assert!(m.is_present());
        assert_eq!(m.value(), Some(0.0));
    }

    #[test]
    fn test_positive() {
        assert_eq!(Metric::new(0.0).positive(), Metric::Absent(AbsentReason::NonPositive));
        assert_eq!(Metric::new(-3.0).positive(), Metric::Absent(AbsentReason::NonPositive));
        assert_eq!(Metric::new(2.0).positive(), Metric::Value(2.0));
        assert_eq!(Metric::missing().positive(), Metric::missing());
    }

    #[test]
    fn test_map_keeps_absent_reason() {
        let m = Metric::Absent(AbsentReason::NonNumeric).map(|v| v * 2.0);
        assert_eq!(m.reason(), Some(&AbsentReason::NonNumeric));
        assert_eq!(Metric::new(1.0).map(|v| v / 0.0).reason(), Some(&AbsentReason::NonFinite));
    }

    #[test]
    fn test_or_else_only_when_absent() {
        assert_eq!(Metric::new(1.0).or_else(|| Metric::new(2.0)), Metric::Value(1.0));
        assert_eq!(Metric::missing().or_else(|| Metric::new(2.0)), Metric::Value(2.0));
    }

    #[test]
    fn test_serde_shape() {
        let json = serde_json::to_value(Metric::new(1.5)).unwrap();
        assert_eq!(json, serde_json::json!({"status": "value", "detail": 1.5}));

        let absent = Metric::Absent(AbsentReason::InsufficientHistory { required: 20, available: 10 });
        let json = serde_json::to_value(&absent).unwrap();
        assert_eq!(json["status"], "absent");
        assert_eq!(json["detail"]["reason"], "insufficient_history");
        let back: Metric = serde_json::from_value(json).unwrap();
        assert_eq!(back, absent);
    }
}
