use serde::{Deserialize, Serialize};
use zfpbuf_codec::CompressionMode;

/// Quality parameters of a compression call.
///
/// At most one of them takes effect, chosen by a fixed priority: tolerance,
/// then rate, then precision. With none set the stream is lossless.
/// Negative and NaN values count as unset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompressOptions {
    /// Absolute error tolerance (fixed-accuracy mode).
    pub tolerance: Option<f64>,
    /// Bits per value (fixed-rate mode).
    pub rate: Option<f64>,
    /// Bit planes retained (fixed-precision mode).
    pub precision: Option<u32>,
}

impl CompressOptions {
    /// Options selecting lossless compression.
    pub fn reversible() -> CompressOptions {
        CompressOptions::default()
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = Some(tolerance);
        self
    }

    pub fn with_rate(mut self, rate: f64) -> Self {
        self.rate = Some(rate);
        self
    }

    pub fn with_precision(mut self, precision: u32) -> Self {
        self.precision = Some(precision);
        self
    }

    /// Builds options from the host's raw parameters, where a negative value
    /// means "unset".
    pub fn from_raw(tolerance: f64, rate: f64, precision: i32) -> CompressOptions {
        CompressOptions {
            tolerance: is_set(tolerance).then_some(tolerance),
            rate: is_set(rate).then_some(rate),
            precision: u32::try_from(precision).ok(),
        }
    }

    /// Selects the compression mode. Only the first parameter that is set,
    /// in priority order, is honored.
    pub fn mode(&self) -> CompressionMode {
        if let Some(tolerance) = self.tolerance.filter(|&t| is_set(t)) {
            CompressionMode::FixedAccuracy { tolerance }
        } else if let Some(rate) = self.rate.filter(|&r| is_set(r)) {
            CompressionMode::FixedRate { rate }
        } else if let Some(precision) = self.precision {
            CompressionMode::FixedPrecision { precision }
        } else {
            CompressionMode::Reversible
        }
    }
}

#[inline]
fn is_set(value: f64) -> bool {
    value >= 0.0
}
