//! Policy thresholds and planner weights.
//!
//! The overload threshold and hysteresis margin are operator policy, not
//! standardized constants, so everything here is plain configuration with
//! defaults.

use serde::{Deserialize, Serialize};

/// Lower bound on a granted PRB quota.
pub const DEFAULT_MIN_QUOTA: u32 = 5;
/// Upper bound on a granted PRB quota.
pub const DEFAULT_MAX_QUOTA: u32 = 100;
/// Bandwidth of one LTE/NR resource block at 15 kHz subcarrier spacing.
pub const RESOURCE_BLOCK_BANDWIDTH_HZ: f64 = 180_000.0;
/// Thermal noise over one resource block (-121.4 dBm) plus a 7 dB noise figure.
pub const DEFAULT_NOISE_FLOOR_DBM: f64 = -114.0;

/// Configuration for the online decision engine and capacity estimator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// Serving utilization above which the cell counts as overloaded (exclusive)
    pub overloaded_threshold: f64,
    /// Minimum neighbor RSRP advantage before switching (exclusive)
    pub hysteresis_db: f64,
    pub min_quota: u32,
    pub max_quota: u32,
    /// Quota granted when neither a service profile nor a segment applies
    pub default_quota: u32,
    pub resource_block_bandwidth_hz: f64,
    /// Subtracted from RSRP to obtain an SINR proxy
    pub noise_floor_dbm: f64,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            overloaded_threshold: 0.8,
            hysteresis_db: 3.0,
            min_quota: DEFAULT_MIN_QUOTA,
            max_quota: DEFAULT_MAX_QUOTA,
            default_quota: DEFAULT_MIN_QUOTA,
            resource_block_bandwidth_hz: RESOURCE_BLOCK_BANDWIDTH_HZ,
            noise_floor_dbm: DEFAULT_NOISE_FLOOR_DBM,
        }
    }
}

impl PolicyConfig {
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if !(0.0..=1.0).contains(&self.overloaded_threshold) {
            errors.push(format!(
                "overloaded_threshold must be within [0, 1], got {}",
                self.overloaded_threshold
            ));
        }
        if !self.hysteresis_db.is_finite() || self.hysteresis_db < 0.0 {
            errors.push(format!("hysteresis_db must be >= 0, got {}", self.hysteresis_db));
        }
        if self.min_quota > self.max_quota {
            errors.push(format!(
                "min_quota {} exceeds max_quota {}",
                self.min_quota, self.max_quota
            ));
        } else if !(self.min_quota..=self.max_quota).contains(&self.default_quota) {
            errors.push(format!(
                "default_quota {} outside [{}, {}]",
                self.default_quota, self.min_quota, self.max_quota
            ));
        }
        if !(self.resource_block_bandwidth_hz.is_finite() && self.resource_block_bandwidth_hz > 0.0) {
            errors.push(format!(
                "resource_block_bandwidth_hz must be positive, got {}",
                self.resource_block_bandwidth_hz
            ));
        }
        if !self.noise_floor_dbm.is_finite() {
            errors.push("noise_floor_dbm must be finite".to_string());
        }
        errors
    }

    /// Clamp a raw quota into the configured policy bounds.
    pub fn clamp_quota(&self, quota: u32) -> u32 {
        quota.clamp(self.min_quota, self.max_quota)
    }
}

/// Configuration and utility parameters for the offline DP planner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Candidate floor used when no service profile supplies one
    pub min_quality_db: f64,
    pub w_quality: f64,
    pub w_load: f64,
    /// dB of margin above the floor that maps to one unit of quality
    pub quality_scale_db: f64,
    /// Cost of one serving-cell change along the path
    pub handover_penalty: f64,
    /// PRB per unit of average predicted load when sizing segment quotas
    pub quota_per_unit_load: f64,
    pub min_quota: u32,
    pub max_quota: u32,
    /// Slice stamped on segments when no service profile names one
    pub default_slice_id: Option<String>,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            min_quality_db: -5.0,
            w_quality: 1.0,
            w_load: 0.5,
            quality_scale_db: 10.0,
            handover_penalty: 0.5,
            quota_per_unit_load: 100.0,
            min_quota: DEFAULT_MIN_QUOTA,
            max_quota: DEFAULT_MAX_QUOTA,
            default_slice_id: None,
        }
    }
}

impl PlannerConfig {
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        for (name, value) in [
            ("w_quality", self.w_quality),
            ("w_load", self.w_load),
            ("handover_penalty", self.handover_penalty),
            ("quota_per_unit_load", self.quota_per_unit_load),
        ] {
            if !value.is_finite() || value < 0.0 {
                errors.push(format!("{} must be finite and >= 0, got {}", name, value));
            }
        }
        if !(self.quality_scale_db.is_finite() && self.quality_scale_db > 0.0) {
            errors.push(format!(
                "quality_scale_db must be positive, got {}",
                self.quality_scale_db
            ));
        }
        if !self.min_quality_db.is_finite() {
            errors.push("min_quality_db must be finite".to_string());
        }
        if self.min_quota > self.max_quota {
            errors.push(format!(
                "min_quota {} exceeds max_quota {}",
                self.min_quota, self.max_quota
            ));
        }
        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(PolicyConfig::default().validate().is_empty());
        assert!(PlannerConfig::default().validate().is_empty());
    }

    #[test]
    fn rejects_inverted_quota_bounds() {
        let config = PolicyConfig {
            min_quota: 50,
            max_quota: 10,
            ..PolicyConfig::default()
        };
        assert_eq!(config.validate().len(), 1);

        let planner = PlannerConfig {
            w_load: -1.0,
            ..PlannerConfig::default()
        };
        assert!(planner.validate()[0].contains("w_load"));
    }

    #[test]
    fn rejects_default_quota_outside_bounds() {
        for default_quota in [0, 4, 101, 1000] {
            let config = PolicyConfig {
                default_quota,
                ..PolicyConfig::default()
            };
            let errors = config.validate();
            assert_eq!(errors.len(), 1, "default_quota {default_quota}");
            assert!(errors[0].contains("default_quota"));
        }
    }

    #[test]
    fn partial_config_fills_defaults() {
        let config: PolicyConfig = serde_json::from_str(r#"{"hysteresis_db": 4.5}"#).unwrap();
        assert_eq!(config.hysteresis_db, 4.5);
        assert_eq!(config.overloaded_threshold, 0.8);
        assert_eq!(config.max_quota, DEFAULT_MAX_QUOTA);
    }
}
