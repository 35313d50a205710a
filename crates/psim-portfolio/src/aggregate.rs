use psim_schemas::{Micros, PortfolioSummary, PositionResult};

use crate::position::return_percent;

fn i128_to_micros_clamp(x: i128) -> Micros {
    if x > i64::MAX as i128 {
        Micros::MAX
    } else if x < i64::MIN as i128 {
        Micros::MIN
    } else {
        Micros::new(x as i64)
    }
}

#[derive(Default)]
struct Totals {
    invested: i128,
    open_value: i128,
    close_value: i128,
    dividend_value: i128,
    appreciation: i128,
    total_profit: i128,
}

/// Reduce positions into portfolio totals.
///
/// Sums are accumulated in i128, so the result does not depend on input
/// order. `total_profit_percent` comes from the summed values, never from
/// averaging per-position percentages.
pub fn aggregate(positions: &[PositionResult]) -> PortfolioSummary {
    let mut t = Totals::default();
    let mut fallback_count = 0usize;

    for p in positions {
        t.invested += p.invested_micros.raw() as i128;
        t.open_value += p.open_value_micros.raw() as i128;
        t.close_value += p.close_value_micros.raw() as i128;
        t.dividend_value += p.dividend_value_micros.raw() as i128;
        t.appreciation += p.appreciation_profit_micros.raw() as i128;
        t.total_profit += p.total_profit_micros.raw() as i128;
        if p.is_fallback {
            fallback_count += 1;
        }
    }

    let open_value = i128_to_micros_clamp(t.open_value);
    let end_value = i128_to_micros_clamp(t.close_value + t.dividend_value);

    PortfolioSummary {
        position_count: positions.len(),
        fallback_count,
        total_invested_micros: i128_to_micros_clamp(t.invested).round_to_cents(),
        total_open_value_micros: open_value.round_to_cents(),
        total_close_value_micros: i128_to_micros_clamp(t.close_value).round_to_cents(),
        total_dividend_value_micros: i128_to_micros_clamp(t.dividend_value).round_to_cents(),
        total_appreciation_profit_micros: i128_to_micros_clamp(t.appreciation).round_to_cents(),
        total_profit_micros: i128_to_micros_clamp(t.total_profit).round_to_cents(),
        total_profit_percent: return_percent(open_value, end_value),
    }
}
