//! In-memory decision history and plan store.
//!
//! The decision engine itself holds no state; everything the transport
//! remembers between requests lives here.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use std::collections::{BTreeSet, VecDeque};
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use uav_core::{FlightPlanPolicy, ResourceDecision};

use crate::cache::{prune_cache, CacheEntry};
use crate::config::Config;

/// One entry of the decision history log.
#[derive(Debug, Clone, Serialize)]
pub struct DecisionRecord {
    pub timestamp: DateTime<Utc>,
    pub uav_id: String,
    pub target_cell_id: String,
    pub slice_id: Option<String>,
    pub prb_quota: Option<u32>,
    pub reason: String,
}

impl DecisionRecord {
    pub fn from_decision(decision: &ResourceDecision, timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            uav_id: decision.uav_id.clone(),
            target_cell_id: decision.target_cell_id.clone(),
            slice_id: decision.slice_id.clone(),
            prb_quota: decision.prb_quota,
            reason: decision.reason.clone(),
        }
    }
}

struct StoredPlan {
    plan: FlightPlanPolicy,
    stored_at: Instant,
}

impl CacheEntry for StoredPlan {
    fn stored_at(&self) -> Instant {
        self.stored_at
    }
}

/// Application state shared by all handlers.
pub struct AppState {
    config: Config,
    /// Bounded log, oldest first
    history: Mutex<VecDeque<DecisionRecord>>,
    plans: DashMap<String, StoredPlan>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            history: Mutex::new(VecDeque::with_capacity(config.max_history.min(4096))),
            plans: DashMap::new(),
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn history(&self) -> MutexGuard<'_, VecDeque<DecisionRecord>> {
        self.history
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Append a decision, evicting the oldest beyond `max_history`.
    pub fn record_decision(&self, decision: &ResourceDecision) -> DecisionRecord {
        let record = DecisionRecord::from_decision(decision, Utc::now());
        let mut history = self.history();
        history.push_back(record.clone());
        while history.len() > self.config.max_history {
            history.pop_front();
        }
        record
    }

    /// Most recent decisions first.
    pub fn recent_decisions(&self, limit: usize) -> Vec<DecisionRecord> {
        self.history().iter().rev().take(limit).cloned().collect()
    }

    pub fn decision_count(&self) -> usize {
        self.history().len()
    }

    /// Distinct UAV ids in the history, sorted.
    pub fn unique_uavs(&self) -> Vec<String> {
        self.history()
            .iter()
            .map(|record| record.uav_id.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Store a plan for its UAV, replacing any previous one wholesale.
    pub fn store_plan(&self, plan: FlightPlanPolicy) -> Option<FlightPlanPolicy> {
        let previous = self
            .plans
            .insert(
                plan.uav_id.clone(),
                StoredPlan {
                    plan,
                    stored_at: Instant::now(),
                },
            )
            .map(|stored| stored.plan);
        self.prune_plans();
        previous
    }

    /// The current plan for `uav_id`, unless it has expired.
    pub fn get_plan(&self, uav_id: &str) -> Option<FlightPlanPolicy> {
        let ttl = self.plan_ttl();
        if let Some(stored) = self.plans.get(uav_id) {
            if stored.stored_at.elapsed() <= ttl {
                return Some(stored.plan.clone());
            }
        } else {
            return None;
        }
        self.plans.remove(uav_id);
        None
    }

    pub fn remove_plan(&self, uav_id: &str) -> Option<FlightPlanPolicy> {
        self.plans.remove(uav_id).map(|(_, stored)| stored.plan)
    }

    pub fn plan_count(&self) -> usize {
        self.plans.len()
    }

    /// Evict expired plans and enforce the store capacity.
    pub fn prune_plans(&self) -> usize {
        prune_cache(&self.plans, self.config.max_stored_plans, self.plan_ttl())
    }

    fn plan_ttl(&self) -> Duration {
        Duration::from_secs(self.config.plan_ttl_s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uav_core::PathSegmentPlan;

    fn decision(uav_id: &str, cell: &str) -> ResourceDecision {
        ResourceDecision {
            uav_id: uav_id.into(),
            target_cell_id: cell.into(),
            slice_id: None,
            prb_quota: Some(5),
            reason: "stay".into(),
            trace: Vec::new(),
        }
    }

    fn plan(uav_id: &str, cell: &str) -> FlightPlanPolicy {
        FlightPlanPolicy {
            uav_id: uav_id.into(),
            segments: vec![PathSegmentPlan {
                start_pos: 0.0,
                end_pos: 1.0,
                planned_cell_id: cell.into(),
                slice_id: None,
                base_prb_quota: 10,
            }],
        }
    }

    #[test]
    fn history_is_bounded_and_newest_first() {
        let state = AppState::new(Config {
            max_history: 3,
            ..Config::default()
        });
        for i in 0..5 {
            state.record_decision(&decision(&format!("uav-{}", i), "cell-A"));
        }
        assert_eq!(state.decision_count(), 3);
        let recent: Vec<String> = state.recent_decisions(10).into_iter().map(|r| r.uav_id).collect();
        assert_eq!(recent, vec!["uav-4", "uav-3", "uav-2"]);
        assert_eq!(state.recent_decisions(1).len(), 1);
        assert_eq!(state.unique_uavs(), vec!["uav-2", "uav-3", "uav-4"]);
    }

    #[test]
    fn plans_are_replaced_wholesale() {
        let state = AppState::new(Config::default());
        assert!(state.store_plan(plan("uav-001", "cell-A")).is_none());
        let previous = state.store_plan(plan("uav-001", "cell-B")).unwrap();
        assert_eq!(previous.segments[0].planned_cell_id, "cell-A");
        assert_eq!(
            state.get_plan("uav-001").unwrap().segments[0].planned_cell_id,
            "cell-B"
        );
        assert_eq!(state.plan_count(), 1);
        assert!(state.remove_plan("uav-001").is_some());
        assert!(state.get_plan("uav-001").is_none());
    }

    #[test]
    fn plan_store_respects_capacity() {
        let state = AppState::new(Config {
            max_stored_plans: 2,
            ..Config::default()
        });
        for i in 0..4 {
            state.store_plan(plan(&format!("uav-{}", i), "cell-A"));
            std::thread::sleep(Duration::from_millis(2));
        }
        assert_eq!(state.plan_count(), 2);
        assert!(state.get_plan("uav-3").is_some());
    }
}
