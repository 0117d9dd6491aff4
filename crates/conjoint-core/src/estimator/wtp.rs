//! Willingness-to-pay from part-worth ratios.

use std::collections::BTreeMap;

use regex::RegexBuilder;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::domain::Feature;

/// Default pattern for recognising a price-like feature by key or label.
pub const DEFAULT_PRICE_PATTERN: &str = "price|cost|fee|premium";

/// Price coefficients smaller than this make WTP undefined.
pub const MIN_PRICE_BETA: f64 = 1e-6;

/// Price-equivalent value of each non-price encoded dimension.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Wtp {
    pub price_feature: String,
    pub price_unit: Option<String>,
    /// Spread of the price feature across alternatives. The price
    /// part-worth is fitted on a z-scored price.
    pub price_std: f64,
    /// `-β_k * price_std / β_price` per encoded key, in `price_unit`.
    pub values: BTreeMap<String, f64>,
}

/// First continuous feature whose key or label matches `pattern`
/// (case-insensitive). An invalid pattern matches nothing.
pub fn detect_price_feature<'a>(schema: &'a [Feature], pattern: &str) -> Option<&'a Feature> {
    let re = match RegexBuilder::new(pattern).case_insensitive(true).build() {
        Ok(re) => re,
        Err(e) => {
            warn!(pattern = %pattern, error = %e, "invalid price pattern; WTP disabled");
            return None;
        }
    };
    schema
        .iter()
        .filter(|f| f.is_continuous())
        .find(|f| re.is_match(&f.key) || re.is_match(&f.label))
}

/// WTP for every encoded dimension other than price.
///
/// `None` when no price-like feature exists, its coefficient is ~0, or
/// its spread is unknown.
pub fn willingness_to_pay(
    schema: &[Feature],
    part_worths: &BTreeMap<String, f64>,
    price_pattern: &str,
    price_std: impl Fn(&str) -> Option<f64>,
) -> Option<Wtp> {
    let price = detect_price_feature(schema, price_pattern)?;
    let beta_price = part_worths.get(&price.key).copied().unwrap_or(0.0);
    if beta_price.abs() < MIN_PRICE_BETA {
        return None;
    }
    // β_price is per standard deviation of price; undo the z-score
    let std = price_std(&price.key).filter(|s| *s > 0.0)?;
    let values = part_worths
        .iter()
        .filter(|(k, _)| **k != price.key)
        .map(|(k, b)| (k.clone(), -b * std / beta_price))
        .collect();
    Some(Wtp {
        price_feature: price.key.clone(),
        price_unit: price.unit.clone(),
        price_std: std,
        values,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> Vec<Feature> {
        vec![
            Feature::continuous("monthly", "Monthly Fee", 0.0, 50.0).with_unit("USD"),
            Feature::continuous("quality", "Quality", 0.0, 10.0),
        ]
    }

    fn worths(pairs: &[(&str, f64)]) -> BTreeMap<String, f64> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn detects_price_by_label_case_insensitively() {
        let s = schema();
        let f = detect_price_feature(&s, DEFAULT_PRICE_PATTERN).expect("price feature");
        assert_eq!(f.key, "monthly");
    }

    #[test]
    fn categorical_price_is_not_price_like() {
        let s = vec![Feature::categorical("price_band", "Price band", &["low", "high"])];
        assert!(detect_price_feature(&s, DEFAULT_PRICE_PATTERN).is_none());
    }

    #[test]
    fn quality_wtp_is_positive_when_price_hurts() {
        let pw = worths(&[("monthly", -0.5), ("quality", 1.0)]);
        let wtp = willingness_to_pay(&schema(), &pw, DEFAULT_PRICE_PATTERN, |_| Some(10.0))
            .expect("wtp");
        assert_eq!(wtp.price_feature, "monthly");
        assert_eq!(wtp.price_unit.as_deref(), Some("USD"));
        assert_eq!(wtp.price_std, 10.0);
        assert!((wtp.values["quality"] - 20.0).abs() < 1e-12);
        assert!(!wtp.values.contains_key("monthly"));
    }

    #[test]
    fn values_are_in_raw_price_units() {
        // one std of price (50 USD) costs 2 utils, one unit of wifi is worth 1
        let pw = worths(&[("monthly", -2.0), ("wifi", 1.0), ("noise", -0.5)]);
        let wtp = willingness_to_pay(&schema(), &pw, DEFAULT_PRICE_PATTERN, |_| Some(50.0))
            .expect("wtp");
        assert!((wtp.values["wifi"] - 25.0).abs() < 1e-12);
        assert!((wtp.values["noise"] + 12.5).abs() < 1e-12);
    }

    #[test]
    fn unknown_price_spread_leaves_wtp_undefined() {
        let pw = worths(&[("monthly", -0.5), ("quality", 1.0)]);
        assert!(willingness_to_pay(&schema(), &pw, DEFAULT_PRICE_PATTERN, |_| None).is_none());
        assert!(willingness_to_pay(&schema(), &pw, DEFAULT_PRICE_PATTERN, |_| Some(0.0)).is_none());
    }

    #[test]
    fn undefined_without_price_or_with_flat_price() {
        let no_price = vec![Feature::continuous("quality", "Quality", 0.0, 10.0)];
        let pw = worths(&[("quality", 1.0)]);
        assert!(willingness_to_pay(&no_price, &pw, DEFAULT_PRICE_PATTERN, |_| None).is_none());

        let flat = worths(&[("monthly", 1e-9), ("quality", 1.0)]);
        assert!(willingness_to_pay(&schema(), &flat, DEFAULT_PRICE_PATTERN, |_| None).is_none());
    }

    #[test]
    fn invalid_pattern_disables_wtp() {
        assert!(detect_price_feature(&schema(), "price(").is_none());
    }
}
