// Millisecond-precision time values for slicing and duration display

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};

/// An immutable point-in-media / duration value with millisecond precision.
///
/// Arithmetic follows the controller's historical overload rules: combining
/// two `TimeValue`s works in milliseconds, while combining a `TimeValue` with
/// a bare `f64` interprets the float as *seconds*:
///
/// ```
/// use ffjob::TimeValue;
///
/// assert_eq!(TimeValue::from_millis(1000) + 2.0, TimeValue::from_millis(3000));
/// assert_eq!(
///     TimeValue::from_millis(1000) + TimeValue::from_millis(2),
///     TimeValue::from_millis(1002)
/// );
/// ```
///
/// Negative values can be produced by subtraction but have no defined
/// rendering; formatting is only specified for non-negative values.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct TimeValue {
    millis: i64,
}

impl TimeValue {
    pub const ZERO: TimeValue = TimeValue { millis: 0 };

    pub fn from_millis(millis: i64) -> Self {
        Self { millis }
    }

    /// Build from a seconds count (e.g. a probed duration), truncating to
    /// whole milliseconds.
    pub fn from_seconds(seconds: f64) -> Self {
        Self {
            millis: (seconds * 1000.0).trunc() as i64,
        }
    }

    pub fn millis(self) -> i64 {
        self.millis
    }

    pub fn seconds(self) -> f64 {
        self.millis as f64 / 1000.0
    }

    /// Plain decimal-seconds rendering (`"1.500"`), the form FFmpeg accepts
    /// for `-ss`/`-t` values.
    pub fn as_ffmpeg_arg(self) -> String {
        format!("{:.3}", self.seconds())
    }
}

impl Add for TimeValue {
    type Output = TimeValue;

    fn add(self, other: TimeValue) -> TimeValue {
        TimeValue::from_millis(self.millis + other.millis)
    }
}

impl Sub for TimeValue {
    type Output = TimeValue;

    fn sub(self, other: TimeValue) -> TimeValue {
        TimeValue::from_millis(self.millis - other.millis)
    }
}

impl Add<f64> for TimeValue {
    type Output = TimeValue;

    fn add(self, seconds: f64) -> TimeValue {
        TimeValue::from_millis(self.millis + (seconds * 1000.0).trunc() as i64)
    }
}

impl Sub<f64> for TimeValue {
    type Output = TimeValue;

    fn sub(self, seconds: f64) -> TimeValue {
        TimeValue::from_millis(self.millis - (seconds * 1000.0).trunc() as i64)
    }
}

impl fmt::Display for TimeValue {
    /// `HH:MM:SS.mmm`, zero-padded, floor-based decomposition.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let total_secs = self.millis.div_euclid(1000);
        let millis = self.millis.rem_euclid(1000);
        let hours = total_secs / 3600;
        let mins = (total_secs % 3600) / 60;
        let secs = total_secs % 60;

        write!(f, "{:02}:{:02}:{:02}.{:03}", hours, mins, secs, millis)
    }
}
