use rand::Rng;
use std::time::Duration;

/// Lengthens `base` by a random amount in `[0, base * jitter_fraction]` so
/// monitors started together drift apart. Never shortens the interval.
pub fn spread_interval(base: Duration, jitter_fraction: f64) -> Duration {
    if jitter_fraction <= 0.0 || base.is_zero() {
        return base;
    }
    let max_offset = base.as_secs_f64() * jitter_fraction.min(1.0);
    let offset = rand::thread_rng().gen_range(0.0..=max_offset);
    base + Duration::from_secs_f64(offset)
}
