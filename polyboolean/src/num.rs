//! Exact integer helpers.
//!
//! Everything in the kernel is computed on the integer grid. Orientation tests
//! need 64 bits (coordinate differences are at most 21 bits wide) and the
//! construction of a crossing point needs 128 bits before it is rounded back
//! onto the grid.

/// Divides `n` by `d`, rounding to the nearest integer (ties away from zero).
///
/// Panics if `d` is zero.
pub fn div_round(n: i128, d: i128) -> i128 {
    assert!(d != 0, "division by zero");
    let (n, d) = if d < 0 { (-n, -d) } else { (n, d) };
    if n >= 0 {
        (2 * n + d) / (2 * d)
    } else {
        -((-2 * n + d) / (2 * d))
    }
}
