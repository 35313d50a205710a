use psim_schemas::{round_percent, Micros, PositionResult, PriceQuote};

/// Price guard.
///
/// A non-positive open becomes 1.00; a non-positive close becomes the
/// (guarded) open, i.e. zero appreciation.
pub fn guard_prices(open: Micros, close: Micros) -> (Micros, Micros) {
    let open = if open.is_positive() { open } else { Micros::ONE };
    let close = if close.is_positive() { close } else { open };
    (open, close)
}

/// Whole shares `invested` buys at `open`. Negative amounts buy nothing.
pub fn shares_for(invested: Micros, open: Micros) -> u64 {
    if !invested.is_positive() || !open.is_positive() {
        return 0;
    }
    (invested.raw() / open.raw()) as u64
}

/// `((end_value / open_value) - 1) * 100`, or `0` when `open_value` is zero.
pub(crate) fn return_percent(open_value: Micros, end_value: Micros) -> f64 {
    if open_value.is_zero() {
        return 0.0;
    }
    let gain = end_value.raw() as i128 - open_value.raw() as i128;
    round_percent(gain as f64 / open_value.raw() as f64 * 100.0)
}

/// Per-position metrics for one allocation.
///
/// Intermediate values keep full micros precision; every monetary output is
/// rounded to cents only when the result is built.
pub fn compute_position(
    symbol: &str,
    display_name: &str,
    invested: Micros,
    quote: &PriceQuote,
) -> PositionResult {
    let invested = if invested.is_negative() {
        Micros::ZERO
    } else {
        invested
    };
    let (open, close) = guard_prices(quote.open_price_micros, quote.close_price_micros);
    let dividend_per_share = if quote.dividend_per_share_micros.is_negative() {
        Micros::ZERO
    } else {
        quote.dividend_per_share_micros
    };

    let shares = shares_for(invested, open);

    let open_value = open.mul_shares_clamped(shares);
    let close_value = close.mul_shares_clamped(shares);
    let dividend_value = dividend_per_share.mul_shares_clamped(shares);

    let appreciation = close_value.saturating_sub(open_value);
    let total_profit = appreciation.saturating_add(dividend_value);
    let profit_percent = return_percent(open_value, close_value.saturating_add(dividend_value));

    PositionResult {
        symbol: symbol.to_string(),
        display_name: display_name.to_string(),
        invested_micros: invested.round_to_cents(),
        open_price_micros: open.round_to_cents(),
        close_price_micros: close.round_to_cents(),
        shares_held: shares,
        open_value_micros: open_value.round_to_cents(),
        close_value_micros: close_value.round_to_cents(),
        dividend_value_micros: dividend_value.round_to_cents(),
        appreciation_profit_micros: appreciation.round_to_cents(),
        total_profit_micros: total_profit.round_to_cents(),
        profit_percent,
        is_fallback: quote.is_fallback,
        series: quote.series.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const M: i64 = 1_000_000;

    fn quote(open: i64, close: i64, div: i64) -> PriceQuote {
        PriceQuote {
            open_price_micros: Micros::new(open),
            close_price_micros: Micros::new(close),
            dividend_per_share_micros: Micros::new(div),
            series: Vec::new(),
            is_fallback: false,
        }
    }

    #[test]
    fn guard_replaces_zero_open_and_close() {
        assert_eq!(
            guard_prices(Micros::ZERO, Micros::ZERO),
            (Micros::ONE, Micros::ONE)
        );
        assert_eq!(
            guard_prices(Micros::new(5 * M), Micros::ZERO),
            (Micros::new(5 * M), Micros::new(5 * M))
        );
        assert_eq!(
            guard_prices(Micros::new(-3), Micros::new(7 * M)),
            (Micros::ONE, Micros::new(7 * M))
        );
    }

    #[test]
    fn shares_floor_division() {
        assert_eq!(shares_for(Micros::new(1000 * M), Micros::new(10 * M)), 100);
        assert_eq!(shares_for(Micros::new(999 * M), Micros::new(10 * M)), 99);
        assert_eq!(shares_for(Micros::new(5 * M), Micros::new(10 * M)), 0);
        assert_eq!(shares_for(Micros::new(-5 * M), Micros::new(1 * M)), 0);
    }

    #[test]
    fn leftover_cash_is_not_tracked() {
        // 1000 / 33 = 30 shares, 10.00 left over
        let p = compute_position("X", "X", Micros::new(1000 * M), &quote(33 * M, 33 * M, 0));
        assert_eq!(p.shares_held, 30);
        assert_eq!(p.open_value_micros, Micros::new(990 * M));
        assert_eq!(p.invested_micros, Micros::new(1000 * M));
        assert_eq!(p.profit_percent, 0.0);
    }

    #[test]
    fn loss_gives_negative_profit() {
        let p = compute_position("X", "X", Micros::new(500 * M), &quote(50 * M, 40 * M, 0));
        assert_eq!(p.shares_held, 10);
        assert_eq!(p.appreciation_profit_micros, Micros::new(-100 * M));
        assert_eq!(p.total_profit_micros, Micros::new(-100 * M));
        assert_eq!(p.profit_percent, -20.0);
    }

    #[test]
    fn rounding_happens_once_at_the_end() {
        // 3 shares * 3.333333 = 9.999999 -> 10.00; per-step cent rounding would give 9.99
        let p = compute_position(
            "X",
            "X",
            Micros::new(10 * M),
            &quote(3_333_333, 3_333_333, 0),
        );
        assert_eq!(p.shares_held, 3);
        assert_eq!(p.open_value_micros, Micros::new(10 * M));
        assert_eq!(p.open_price_micros, Micros::new(3_330_000));
    }

    #[test]
    fn negative_inputs_are_neutralized() {
        let p = compute_position("X", "X", Micros::new(-100 * M), &quote(10 * M, 12 * M, -M));
        assert_eq!(p.invested_micros, Micros::ZERO);
        assert_eq!(p.shares_held, 0);
        assert_eq!(p.dividend_value_micros, Micros::ZERO);
        assert_eq!(p.profit_percent, 0.0);
    }

    #[test]
    fn huge_values_clamp_instead_of_overflowing() {
        let p = compute_position("X", "X", Micros::MAX, &quote(1, 2 * M, 0));
        assert_eq!(p.shares_held, i64::MAX as u64);
        assert!(p.close_value_micros.is_positive());
        assert!(p.profit_percent.is_finite());
    }

    #[test]
    fn fallback_flag_and_series_are_echoed() {
        let mut q = quote(10 * M, 11 * M, 0);
        q.is_fallback = true;
        let p = compute_position("PETR4", "PETROBRAS PN", Micros::new(100 * M), &q);
        assert!(p.is_fallback);
        assert_eq!(p.display_name, "PETROBRAS PN");
        assert!(p.series.is_empty());
    }
}
