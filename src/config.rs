use serde::{Deserialize, Serialize};

use crate::error::{OptimizationError, Result};

/// Tunables for one optimization run. Every field falls back to its default when omitted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OptimizeOptions {
    /// Material consumed by the blade, added to each piece's footprint (mm).
    pub blade_kerf: u32,
    /// Unusable border along every sheet edge (mm).
    pub margin: u32,
    /// Feed rate used only for the time estimate.
    pub cutting_speed_mm_per_min: f64,
}

impl OptimizeOptions {
    pub const DEFAULT_BLADE_KERF: u32 = 3;
    pub const DEFAULT_MARGIN: u32 = 5;
    /// 10 m/min.
    pub const DEFAULT_CUTTING_SPEED_MM_PER_MIN: f64 = 10_000.0;

    pub fn validate(&self) -> Result<()> {
        if !self.cutting_speed_mm_per_min.is_finite() || self.cutting_speed_mm_per_min <= 0.0 {
            return Err(OptimizationError::InvalidOptions(format!(
                "cutting speed must be a positive number, got {}",
                self.cutting_speed_mm_per_min
            )));
        }
        Ok(())
    }
}

impl Default for OptimizeOptions {
    fn default() -> Self {
        Self {
            blade_kerf: Self::DEFAULT_BLADE_KERF,
            margin: Self::DEFAULT_MARGIN,
            cutting_speed_mm_per_min: Self::DEFAULT_CUTTING_SPEED_MM_PER_MIN,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let opts = OptimizeOptions::default();
        assert_eq!(opts.blade_kerf, 3);
        assert_eq!(opts.margin, 5);
        assert_eq!(opts.cutting_speed_mm_per_min, 10_000.0);
        assert!(opts.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let opts: OptimizeOptions = serde_json::from_str(r#"{"bladeKerf": 0}"#).unwrap();
        assert_eq!(opts.blade_kerf, 0);
        assert_eq!(opts.margin, 5);
        assert_eq!(opts.cutting_speed_mm_per_min, 10_000.0);
    }

    #[test]
    fn test_rejects_non_positive_speed() {
        let opts = OptimizeOptions {
            cutting_speed_mm_per_min: 0.0,
            ..Default::default()
        };
        assert!(matches!(
            opts.validate(),
            Err(OptimizationError::InvalidOptions(_))
        ));

        let opts = OptimizeOptions {
            cutting_speed_mm_per_min: f64::NAN,
            ..Default::default()
        };
        assert!(opts.validate().is_err());
    }
}
