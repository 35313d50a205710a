//! Synthetic quotes and the dividend heuristic.
//!
//! Both are draws from an injected [`RandomSource`]. The ranges live in
//! [`FallbackPolicy`] so configuration can tighten them; the defaults are the
//! canonical ones:
//! - opening price uniform in `[20, 100]`
//! - period return uniform in `[-10%, +40%]`
//! - dividend per share uniform in `[0, 5%]` of the opening price

use psim_schemas::{Micros, PriceQuote};
use serde::{Deserialize, Serialize};

use crate::rng::RandomSource;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FallbackPolicy {
    pub open_min: f64,
    pub open_max: f64,
    pub return_min: f64,
    pub return_max: f64,
    /// Upper bound of the dividend estimate, as a fraction of the opening price.
    pub dividend_yield_max: f64,
}

impl Default for FallbackPolicy {
    fn default() -> Self {
        Self {
            open_min: 20.0,
            open_max: 100.0,
            return_min: -0.10,
            return_max: 0.40,
            dividend_yield_max: 0.05,
        }
    }
}

impl FallbackPolicy {
    /// Reject ranges that could produce a non-positive price or an inverted draw.
    pub fn validate(&self) -> Result<(), String> {
        let finite = [
            self.open_min,
            self.open_max,
            self.return_min,
            self.return_max,
            self.dividend_yield_max,
        ]
        .iter()
        .all(|v| v.is_finite());
        if !finite {
            return Err("fallback bounds must be finite".to_string());
        }
        if self.open_min <= 0.0 || self.open_max < self.open_min {
            return Err(format!(
                "fallback open range invalid: [{}, {}]",
                self.open_min, self.open_max
            ));
        }
        if self.return_min <= -1.0 || self.return_max < self.return_min {
            return Err(format!(
                "fallback return range invalid: [{}, {}]",
                self.return_min, self.return_max
            ));
        }
        if self.dividend_yield_max < 0.0 {
            return Err(format!(
                "fallback dividend_yield_max must be >= 0, got {}",
                self.dividend_yield_max
            ));
        }
        Ok(())
    }

    /// Per-share dividend estimate: a draw in `[0, dividend_yield_max]` of `open`.
    pub fn estimate_dividend(&self, open: Micros, rng: &dyn RandomSource) -> Micros {
        let yield_frac = rng.uniform(0.0, self.dividend_yield_max);
        Micros::from_f64(open.as_f64() * yield_frac)
            .filter(|d| !d.is_negative())
            .unwrap_or(Micros::ZERO)
    }

    /// Build a synthetic quote. Draw order: open, return, dividend.
    pub fn synthesize(&self, rng: &dyn RandomSource) -> PriceQuote {
        let open_f = rng.uniform(self.open_min, self.open_max);
        let open = Micros::from_f64(open_f).unwrap_or(Micros::ONE);

        let period_return = rng.uniform(self.return_min, self.return_max);
        let close = Micros::from_f64(open.as_f64() * (1.0 + period_return)).unwrap_or(open);

        let dividend = self.estimate_dividend(open, rng);

        PriceQuote {
            open_price_micros: open,
            close_price_micros: close,
            dividend_per_share_micros: dividend,
            series: Vec::new(),
            is_fallback: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::{ConstantSource, SplitMix64};

    #[test]
    fn default_policy_is_valid() {
        assert!(FallbackPolicy::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_bad_ranges() {
        let p = FallbackPolicy {
            open_min: 0.0,
            ..FallbackPolicy::default()
        };
        assert!(p.validate().is_err());

        let p = FallbackPolicy {
            return_min: 0.5,
            return_max: 0.1,
            ..FallbackPolicy::default()
        };
        assert!(p.validate().is_err());

        let p = FallbackPolicy {
            dividend_yield_max: f64::NAN,
            ..FallbackPolicy::default()
        };
        assert!(p.validate().is_err());
    }

    #[test]
    fn synthesize_with_zero_draws_hits_lower_bounds() {
        let q = FallbackPolicy::default().synthesize(&ConstantSource(0.0));
        assert!(q.is_fallback);
        assert!(q.series.is_empty());
        assert_eq!(q.open_price_micros, Micros::from_units(20));
        assert_eq!(q.close_price_micros, Micros::from_units(18));
        assert_eq!(q.dividend_per_share_micros, Micros::ZERO);
    }

    #[test]
    fn synthesize_with_midpoint_draws() {
        // open = 20 + 80 * 0.5 = 60; return = -0.1 + 0.5 * 0.5 = 0.15; dividend = 60 * 0.025
        let q = FallbackPolicy::default().synthesize(&ConstantSource(0.5));
        assert_eq!(q.open_price_micros, Micros::from_units(60));
        assert_eq!(q.close_price_micros, Micros::from_units(69));
        assert_eq!(q.dividend_per_share_micros, Micros::new(1_500_000));
    }

    #[test]
    fn synthesized_quotes_stay_in_range() {
        let policy = FallbackPolicy::default();
        let rng = SplitMix64::seeded(2024);
        for _ in 0..2_000 {
            let q = policy.synthesize(&rng);
            let open = q.open_price_micros.raw();
            let close = q.close_price_micros.raw();
            let div = q.dividend_per_share_micros.raw();
            assert!((20_000_000..=100_000_000).contains(&open), "open {open}");
            // one micro of slack for float rounding
            assert!(close as f64 >= open as f64 * 0.90 - 1.0, "close {close} open {open}");
            assert!(close as f64 <= open as f64 * 1.40 + 1.0, "close {close} open {open}");
            assert!(div >= 0 && div as f64 <= open as f64 * 0.05 + 1.0);
        }
    }

    #[test]
    fn dividend_estimate_is_bounded_fraction_of_open() {
        let policy = FallbackPolicy::default();
        let open = Micros::from_units(10);
        assert_eq!(
            policy.estimate_dividend(open, &ConstantSource(0.0)),
            Micros::ZERO
        );
        assert_eq!(
            policy.estimate_dividend(open, &ConstantSource(0.5)),
            Micros::new(250_000)
        );
    }
}
