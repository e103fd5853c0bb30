use serde::{Deserialize, Serialize};

/// Compression mode applied to a codec stream before encoding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum CompressionMode {
    /// Absolute error bound on every decoded scalar.
    FixedAccuracy { tolerance: f64 },
    /// Bits of storage per scalar, interpreted against the field's scalar
    /// type and dimensionality.
    FixedRate { rate: f64 },
    /// Number of bit planes retained per block.
    FixedPrecision { precision: u32 },
    /// Lossless.
    #[default]
    Reversible,
}

impl CompressionMode {
    pub fn name(&self) -> &'static str {
        match self {
            CompressionMode::FixedAccuracy { .. } => "fixed_accuracy",
            CompressionMode::FixedRate { .. } => "fixed_rate",
            CompressionMode::FixedPrecision { .. } => "fixed_precision",
            CompressionMode::Reversible => "reversible",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_serde() {
        let mode = CompressionMode::FixedAccuracy { tolerance: 0.5 };
        let json = serde_json::to_string(&mode).unwrap();
        assert_eq!(json, r#"{"mode":"fixed_accuracy","tolerance":0.5}"#);

        let mode: CompressionMode = serde_json::from_str(r#"{"mode":"reversible"}"#).unwrap();
        assert_eq!(mode, CompressionMode::default());
    }

    #[test]
    fn test_mode_names() {
        assert_eq!(CompressionMode::FixedRate { rate: 8.0 }.name(), "fixed_rate");
        assert_eq!(
            CompressionMode::FixedPrecision { precision: 16 }.name(),
            "fixed_precision"
        );
    }
}
