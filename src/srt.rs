use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub struct Cue {
    pub(crate) index: usize,
    pub(crate) start: Duration,
    pub(crate) end: Duration,
    pub(crate) text: String,
}

/// Converts engine time in seconds to a `Duration` at microsecond resolution.
///
/// Negative or non-finite values collapse to zero.
pub fn seconds(secs: f64) -> Duration {
    if !secs.is_finite() || secs <= 0.0 {
        return Duration::ZERO;
    }
    Duration::from_micros((secs * 1_000_000.0).round() as u64)
}
