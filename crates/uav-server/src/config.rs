//! Server configuration from environment.

use std::env;
use std::str::FromStr;

use uav_core::PolicyConfig;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_port: u16,
    /// Decisions kept in the in-memory history log
    pub max_history: usize,
    /// Flight plans kept in the plan store before the oldest are evicted
    pub max_stored_plans: usize,
    /// Age after which a stored plan is dropped
    pub plan_ttl_s: u64,
    pub policy: PolicyConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 5000,
            max_history: 1000,
            max_stored_plans: 1024,
            plan_ttl_s: 3600,
            policy: PolicyConfig::default(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Config::default();
        let policy_defaults = PolicyConfig::default();
        Self {
            server_port: env_or("UAV_POLICY_PORT", defaults.server_port),
            max_history: env_or("UAV_POLICY_MAX_HISTORY", defaults.max_history).max(1),
            max_stored_plans: env_or("UAV_POLICY_MAX_PLANS", defaults.max_stored_plans).max(1),
            plan_ttl_s: env_or("UAV_POLICY_PLAN_TTL_S", defaults.plan_ttl_s),
            policy: PolicyConfig {
                overloaded_threshold: env_or(
                    "UAV_POLICY_OVERLOAD_THRESHOLD",
                    policy_defaults.overloaded_threshold,
                ),
                hysteresis_db: env_or("UAV_POLICY_HYSTERESIS_DB", policy_defaults.hysteresis_db),
                min_quota: env_or("UAV_POLICY_MIN_QUOTA", policy_defaults.min_quota),
                max_quota: env_or("UAV_POLICY_MAX_QUOTA", policy_defaults.max_quota),
                default_quota: env_or("UAV_POLICY_DEFAULT_QUOTA", policy_defaults.default_quota),
                noise_floor_dbm: env_or(
                    "UAV_POLICY_NOISE_FLOOR_DBM",
                    policy_defaults.noise_floor_dbm,
                ),
                ..policy_defaults
            },
        }
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_or_falls_back_on_missing_or_garbage() {
        assert_eq!(env_or("UAV_POLICY_TEST_UNSET_KEY", 42u16), 42);
        env::set_var("UAV_POLICY_TEST_GARBAGE_KEY", "not-a-number");
        assert_eq!(env_or("UAV_POLICY_TEST_GARBAGE_KEY", 0.8f64), 0.8);
        env::set_var("UAV_POLICY_TEST_PADDED_KEY", " 7 ");
        assert_eq!(env_or("UAV_POLICY_TEST_PADDED_KEY", 5u32), 7);
    }

    #[test]
    fn zero_plan_capacity_keeps_one_slot() {
        env::set_var("UAV_POLICY_MAX_PLANS", "0");
        let config = Config::from_env();
        env::remove_var("UAV_POLICY_MAX_PLANS");
        assert_eq!(config.max_stored_plans, 1);
    }

    #[test]
    fn defaults_produce_a_valid_policy() {
        assert!(Config::default().policy.validate().is_empty());
    }
}
