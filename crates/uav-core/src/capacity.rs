//! Shannon-capacity PRB estimate for a target bitrate.

use crate::error::ValidationError;
use crate::rules::PolicyConfig;

/// Spectral efficiency in bit/s/Hz at `sinr_db`.
pub fn spectral_efficiency(sinr_db: f64) -> f64 {
    let sinr_linear = 10f64.powf(sinr_db / 10.0);
    (1.0 + sinr_linear).log2()
}

/// PRB count needed to carry `target_bitrate_bps` at `sinr_db`, clamped to
/// the policy's quota bounds.
///
/// A degenerate spectral efficiency (zero, negative or NaN) requests the
/// maximum quota instead of dividing by it.
pub fn estimate_quota(
    target_bitrate_bps: f64,
    sinr_db: f64,
    config: &PolicyConfig,
) -> Result<u32, ValidationError> {
    if !target_bitrate_bps.is_finite() || target_bitrate_bps <= 0.0 {
        return Err(ValidationError::InvalidBitrate(target_bitrate_bps));
    }

    let se = spectral_efficiency(sinr_db);
    if !(se.is_finite() && se > 0.0) {
        return Ok(config.max_quota);
    }

    let per_block_bps = se * config.resource_block_bandwidth_hz;
    let raw = (target_bitrate_bps / per_block_bps).ceil();
    if !raw.is_finite() || raw >= config.max_quota as f64 {
        return Ok(config.max_quota);
    }
    Ok(config.clamp_quota(raw as u32))
}
