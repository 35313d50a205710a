//! psim-portfolio
//!
//! Pure position math and portfolio aggregation.
//! No IO, no randomness, no failure path: degenerate inputs are resolved by
//! policy (price guard, zero-denominator percentages) rather than errors.

mod aggregate;
mod position;

pub use aggregate::aggregate;
pub use position::{compute_position, guard_prices, shares_for};
