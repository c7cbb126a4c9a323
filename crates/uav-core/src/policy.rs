//! Path-aware online resource policy.
//!
//! `decide` reconciles the offline flight plan with the live radio snapshot.
//! It is a pure function of its arguments: no I/O, no shared state, safe to
//! call from any number of tasks at once.

use crate::capacity::estimate_quota;
use crate::error::ValidationError;
use crate::models::{
    DecisionStep, FlightPlanPolicy, PathSegmentPlan, RadioSnapshot, ResourceDecision,
    ServiceProfile, UavState,
};
use crate::rules::PolicyConfig;

/// Produce the resource decision for one indication.
pub fn decide(
    uav: &UavState,
    radio: &RadioSnapshot,
    plan: Option<&FlightPlanPolicy>,
    service: Option<&ServiceProfile>,
    config: &PolicyConfig,
) -> Result<ResourceDecision, ValidationError> {
    validate_inputs(uav, radio, plan, service, config)?;

    let mut trace = Vec::new();

    let active_seg: Option<&PathSegmentPlan> = match (plan, uav.path_position) {
        (Some(plan), Some(pos)) => plan.active_segment(pos),
        _ => None,
    };

    let target_cell_id = choose_cell(radio, active_seg, config, &mut trace);

    let slice_id = match (&uav.slice_id, active_seg) {
        (Some(slice_id), _) => {
            trace.push(DecisionStep::SliceFromUav { slice_id: slice_id.clone() });
            Some(slice_id.clone())
        }
        (None, Some(seg)) => match &seg.slice_id {
            Some(slice_id) => {
                trace.push(DecisionStep::SliceFromSegment { slice_id: slice_id.clone() });
                Some(slice_id.clone())
            }
            None => {
                trace.push(DecisionStep::SliceUnset);
                None
            }
        },
        (None, None) => {
            trace.push(DecisionStep::SliceUnset);
            None
        }
    };

    let prb_quota = match (service, active_seg) {
        (Some(service), _) => {
            let sinr_db = sinr_proxy(radio, &target_cell_id, config);
            let quota = estimate_quota(service.target_bitrate_bps, sinr_db, config)?;
            trace.push(DecisionStep::QuotaFromCapacity {
                service: service.name.clone(),
                sinr_db,
                quota,
            });
            quota
        }
        (None, Some(seg)) => {
            let quota = config.clamp_quota(seg.base_prb_quota);
            trace.push(DecisionStep::QuotaFromSegment { quota });
            quota
        }
        (None, None) => {
            let quota = config.clamp_quota(config.default_quota);
            trace.push(DecisionStep::QuotaDefault { quota });
            quota
        }
    };

    Ok(ResourceDecision {
        uav_id: uav.uav_id.clone(),
        target_cell_id,
        slice_id,
        prb_quota: Some(prb_quota),
        reason: render_reason(&trace),
        trace,
    })
}

/// Cell selection: plan-aware when a segment is active, reactive otherwise.
fn choose_cell(
    radio: &RadioSnapshot,
    active_seg: Option<&PathSegmentPlan>,
    config: &PolicyConfig,
    trace: &mut Vec<DecisionStep>,
) -> String {
    let serving = &radio.serving_cell_id;

    let candidate = match active_seg {
        Some(seg) if seg.planned_cell_id == *serving => {
            trace.push(DecisionStep::PlanMatch {
                planned_cell_id: seg.planned_cell_id.clone(),
            });
            None
        }
        Some(seg) => {
            trace.push(DecisionStep::PlanMismatch {
                planned_cell_id: seg.planned_cell_id.clone(),
            });
            Some(seg.planned_cell_id.clone())
        }
        None => {
            trace.push(DecisionStep::NoActiveSegment);
            match radio.neighbor_cell_ids.first() {
                Some(neighbor) => Some(neighbor.clone()),
                None => {
                    trace.push(DecisionStep::NoNeighbor);
                    None
                }
            }
        }
    };

    let Some(candidate) = candidate else {
        trace.push(DecisionStep::Stay { cell_id: serving.clone() });
        return serving.clone();
    };

    // Both checks are always recorded so the trace explains a stay as well
    // as a move.
    let overloaded = radio.prb_utilization_serving > config.overloaded_threshold;
    trace.push(DecisionStep::OverloadCheck {
        utilization: radio.prb_utilization_serving,
        threshold: config.overloaded_threshold,
        overloaded,
    });
    let advantage_db = radio.rsrp_best_neighbor - radio.rsrp_serving;
    let exceeded = advantage_db > config.hysteresis_db;
    trace.push(DecisionStep::HysteresisCheck {
        advantage_db,
        margin_db: config.hysteresis_db,
        exceeded,
    });

    if overloaded && exceeded {
        trace.push(DecisionStep::Handover {
            target_cell_id: candidate.clone(),
        });
        candidate
    } else {
        trace.push(DecisionStep::Stay { cell_id: serving.clone() });
        serving.clone()
    }
}

/// SINR used for capacity estimation.
///
/// An explicit SINR report wins; otherwise the RSRP of the chosen cell less
/// the noise floor. After a handover the chosen cell is the best neighbor.
pub fn sinr_proxy(radio: &RadioSnapshot, target_cell_id: &str, config: &PolicyConfig) -> f64 {
    if let Some(sinr_db) = radio.sinr_db {
        return sinr_db;
    }
    let rsrp = if target_cell_id == radio.serving_cell_id {
        radio.rsrp_serving
    } else {
        radio.rsrp_best_neighbor
    };
    rsrp - config.noise_floor_dbm
}

fn render_reason(trace: &[DecisionStep]) -> String {
    trace
        .iter()
        .map(|step| step.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

fn check_fraction(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if value.is_nan() {
        return Err(ValidationError::NonFinite(field));
    }
    if !(0.0..=1.0).contains(&value) {
        return Err(ValidationError::OutOfRange { field, value });
    }
    Ok(())
}

fn check_finite(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ValidationError::NonFinite(field))
    }
}

fn validate_inputs(
    uav: &UavState,
    radio: &RadioSnapshot,
    plan: Option<&FlightPlanPolicy>,
    service: Option<&ServiceProfile>,
    config: &PolicyConfig,
) -> Result<(), ValidationError> {
    let config_errors = config.validate();
    if !config_errors.is_empty() {
        return Err(ValidationError::InvalidConfig(config_errors.join("; ")));
    }

    if uav.uav_id.trim().is_empty() {
        return Err(ValidationError::MissingField("uav_id"));
    }
    check_finite("position.x", uav.position.x)?;
    check_finite("position.y", uav.position.y)?;
    check_finite("position.z", uav.position.z)?;
    if let Some(pos) = uav.path_position {
        check_fraction("path_position", pos)?;
    }

    if radio.serving_cell_id.trim().is_empty() {
        return Err(ValidationError::MissingField("serving_cell_id"));
    }
    check_finite("rsrp_serving", radio.rsrp_serving)?;
    check_finite("rsrp_best_neighbor", radio.rsrp_best_neighbor)?;
    check_fraction("prb_utilization_serving", radio.prb_utilization_serving)?;
    if let Some(util) = radio.prb_utilization_slice {
        check_fraction("prb_utilization_slice", util)?;
    }
    if let Some(sinr_db) = radio.sinr_db {
        check_finite("sinr_db", sinr_db)?;
    }

    if let Some(plan) = plan {
        if plan.uav_id != uav.uav_id {
            return Err(ValidationError::PlanOwnerMismatch {
                uav_id: uav.uav_id.clone(),
                plan_uav_id: plan.uav_id.clone(),
            });
        }
        let errors = plan.validate();
        if !errors.is_empty() {
            return Err(ValidationError::InvalidPlan(errors.join("; ")));
        }
    }

    if let Some(service) = service {
        if service.name.trim().is_empty() {
            return Err(ValidationError::MissingField("service_profile.name"));
        }
        if !service.target_bitrate_bps.is_finite() || service.target_bitrate_bps <= 0.0 {
            return Err(ValidationError::InvalidBitrate(service.target_bitrate_bps));
        }
        check_finite("service_profile.min_sinr_db", service.min_sinr_db)?;
    }

    Ok(())
}
