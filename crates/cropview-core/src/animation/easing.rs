//! Cubic easing curves.
//!
//! All curves map progress `t` in `[0, 1]` to `[0, 1]`, with `f(0) = 0` and
//! `f(1) = 1`. Inputs outside the range are clamped.

/// Fast start, slow finish: `1 - (1 - t)^3`.
#[inline]
pub fn ease_out_cubic(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0) - 1.0;
    t * t * t + 1.0
}

/// Slow start and finish, symmetric around `t = 0.5`.
#[inline]
pub fn ease_in_out_cubic(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0) * 2.0;
    if t < 1.0 {
        0.5 * t * t * t
    } else {
        let t = t - 2.0;
        0.5 * (t * t * t + 2.0)
    }
}
