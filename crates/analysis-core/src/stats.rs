//! Small statistics helpers shared by the scorers.
//!
//! These operate on already-present values only. Callers are responsible for
//! filtering out absent entries first (see [`crate::Metric::present_values`]),
//! so an empty slice here means "nothing to compute", never "zero".

use crate::{AbsentReason, Metric};

/// Mean of a data slice. Absent when the slice is empty.
pub fn mean(data: &[f64]) -> Metric {
    if data.is_empty() {
        return Metric::Absent(AbsentReason::InsufficientHistory {
            required: 1,
            available: 0,
        });
    }
    Metric::new(data.iter().sum::<f64>() / data.len() as f64)
}

/// Sample standard deviation. Absent below two observations.
pub fn std_dev(data: &[f64]) -> Metric {
    if data.len() < 2 {
        return Metric::Absent(AbsentReason::InsufficientHistory {
            required: 2,
            available: data.len(),
        });
    }
    let m = data.iter().sum::<f64>() / data.len() as f64;
    let variance = data.iter().map(|x| (x - m).powi(2)).sum::<f64>() / (data.len() - 1) as f64;
    Metric::new(variance.sqrt())
}

/// Compound annual growth rate between the first and last value of a series
/// spanning `years` periods. Both endpoints must be positive.
pub fn cagr(first: f64, last: f64, years: usize) -> Metric {
    if years == 0 {
        return Metric::Absent(AbsentReason::InsufficientHistory {
            required: 2,
            available: 1,
        });
    }
    if first <= 0.0 || last <= 0.0 {
        return Metric::Absent(AbsentReason::NonPositive);
    }
    Metric::new((last / first).powf(1.0 / years as f64) - 1.0)
}

/// CAGR over the first and last *present* entries of a chronological series.
///
/// The number of years is measured by position, so a gap in the middle of the
/// series does not shorten the period.
pub fn series_cagr(series: &[Metric]) -> Metric {
    let present: Vec<(usize, f64)> = series
        .iter()
        .enumerate()
        .filter_map(|(i, m)| m.value().map(|v| (i, v)))
        .collect();
    match (present.first(), present.last()) {
        (Some(&(i0, first)), Some(&(i1, last))) if i1 > i0 => cagr(first, last, i1 - i0),
        _ => Metric::Absent(AbsentReason::InsufficientHistory {
            required: 2,
            available: present.len(),
        }),
    }
}

/// Year-over-year pairs `(previous, current)` for a chronological series,
/// skipping any pair where either side is absent.
pub fn yoy_pairs(series: &[Metric]) -> Vec<(f64, f64)> {
    series
        .windows(2)
        .filter_map(|w| match (w[0].value(), w[1].value()) {
            (Some(prev), Some(cur)) => Some((prev, cur)),
            _ => None,
        })
        .collect()
}

/// Average simple year-over-year growth (prev must be positive) in percent.
pub fn average_growth_pct(series: &[Metric]) -> Metric {
    let growths: Vec<f64> = yoy_pairs(series)
        .into_iter()
        .filter(|(prev, _)| *prev > 0.0)
        .map(|(prev, cur)| (cur - prev) / prev * 100.0)
        .collect();
    mean(&growths)
}

/// Align two chronological series at their latest end, truncating the longer one.
pub fn align_latest<'a>(a: &'a [Metric], b: &'a [Metric]) -> (&'a [Metric], &'a [Metric]) {
    let n = a.len().min(b.len());
    (&a[a.len() - n..], &b[b.len() - n..])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(values: &[f64]) -> Vec<Metric> {
        values.iter().map(|&v| Metric::new(v)).collect()
    }

    #[test]
    fn test_mean_and_std_dev() {
        let data = vec![10.0, 20.0, 30.0, 40.0, 50.0];
        assert_eq!(mean(&data).value(), Some(30.0));
        let sd = std_dev(&data).value().unwrap();
        assert!((sd - 15.811388).abs() < 1e-5);
    }

    #[test]
    fn test_mean_of_empty_is_absent() {
        assert!(mean(&[]).is_absent());
        assert!(std_dev(&[1.0]).is_absent());
    }

    #[test]
    fn test_cagr() {
        let g = cagr(100.0, 121.0, 2).value().unwrap();
        assert!((g - 0.10).abs() < 1e-12);
        assert_eq!(cagr(-5.0, 10.0, 3), Metric::Absent(AbsentReason::NonPositive));
    }

    #[test]
    fn test_series_cagr_measures_years_by_position() {
        let s = vec![Metric::new(100.0), Metric::missing(), Metric::new(121.0)];
        let g = series_cagr(&s).value().unwrap();
        assert!((g - 0.10).abs() < 1e-12);
    }

    #[test]
    fn test_yoy_pairs_skip_gaps() {
        let s = vec![Metric::new(1.0), Metric::new(2.0), Metric::missing(), Metric::new(4.0), Metric::new(5.0)];
        assert_eq!(yoy_pairs(&s), vec![(1.0, 2.0), (4.0, 5.0)]);
    }

    #[test]
    fn test_align_latest() {
        let a = series(&[1.0, 2.0, 3.0, 4.0]);
        let b = series(&[30.0, 40.0]);
        let (x, y) = align_latest(&a, &b);
        assert_eq!(x, &a[2..]);
        assert_eq!(y, &b[..]);
    }

    #[test]
    fn test_average_growth_pct() {
        let s = series(&[100.0, 110.0, 121.0]);
        let g = average_growth_pct(&s).value().unwrap();
        assert!((g - 10.0).abs() < 1e-9);
    }
}
