//! Combine functions
//!
//! Turn the per-source last-known prices for a boundary into one index
//! value. Median is the default: a single misbehaving or stale exchange
//! cannot drag the index without an explicit outlier-detection pass.

use common::CombineMethod;
use ordered_float::OrderedFloat;

/// The combine rule an engine runs with.
///
/// `Median` and `Mean` cover the configurable choices; `Custom` lets
/// embedders supply their own reduction (a time-weighted variant, say)
/// without touching the rest of the engine.
#[derive(Debug, Clone, Copy, Default)]
pub enum Combiner {
    #[default]
    Median,
    Mean,
    Custom(fn(&[f64]) -> f64),
}

impl Combiner {
    /// Reduce a set of per-source prices to one index value.
    ///
    /// Returns None for an empty set - the aggregator turns that into a
    /// gap in the output rather than a zero-price bar.
    pub fn apply(&self, prices: &[f64]) -> Option<f64> {
        if prices.is_empty() {
            return None;
        }
        Some(match self {
            Combiner::Median => median(prices),
            Combiner::Mean => mean(prices),
            Combiner::Custom(f) => f(prices),
        })
    }
}

impl From<CombineMethod> for Combiner {
    fn from(method: CombineMethod) -> Self {
        match method {
            CombineMethod::Median => Combiner::Median,
            CombineMethod::Mean => Combiner::Mean,
        }
    }
}

impl std::fmt::Display for Combiner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Combiner::Median => write!(f, "median"),
            Combiner::Mean => write!(f, "mean"),
            Combiner::Custom(_) => write!(f, "custom"),
        }
    }
}

fn median(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by_key(|v| OrderedFloat(*v));

    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_median_odd() {
        assert_eq!(Combiner::Median.apply(&[100.0, 300.0, 110.0]), Some(110.0));
    }

    #[test]
    fn test_median_even_is_midpoint() {
        assert_eq!(Combiner::Median.apply(&[100.0, 200.0]), Some(150.0));
    }

    #[test]
    fn test_median_shrugs_off_one_outlier() {
        let prices = [50_000.0, 50_100.0, 1_000_000.0];
        assert_eq!(Combiner::Median.apply(&prices), Some(50_100.0));
    }

    #[test]
    fn test_mean() {
        assert_eq!(Combiner::Mean.apply(&[100.0, 110.0, 120.0]), Some(110.0));
    }

    #[test]
    fn test_empty_set_is_a_gap() {
        assert_eq!(Combiner::Median.apply(&[]), None);
        assert_eq!(Combiner::Mean.apply(&[]), None);
        assert_eq!(Combiner::Custom(|p| p[0]).apply(&[]), None);
    }

    #[test]
    fn test_single_price_passes_through() {
        assert_eq!(Combiner::Median.apply(&[101.5]), Some(101.5));
        assert_eq!(Combiner::Mean.apply(&[101.5]), Some(101.5));
    }

    #[test]
    fn test_custom_combiner() {
        fn worst_case(prices: &[f64]) -> f64 {
            prices.iter().cloned().fold(f64::INFINITY, f64::min)
        }
        assert_eq!(
            Combiner::Custom(worst_case).apply(&[100.0, 99.5, 101.0]),
            Some(99.5)
        );
    }

    #[test]
    fn test_config_method_mapping() {
        assert!(matches!(
            Combiner::from(CombineMethod::Median),
            Combiner::Median
        ));
        assert!(matches!(Combiner::from(CombineMethod::Mean), Combiner::Mean));
    }
}
