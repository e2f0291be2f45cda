//! Cycle-based call limiter.
//!
//! Calls are recorded per [`LimitKey`] as the cycle they happened in. A call
//! is refused once the key's gauge reaches the policy's threshold; refused
//! calls are not recorded.

use std::collections::{HashMap, VecDeque};

use serde::{Deserialize, Serialize};

use crate::domain::models::TaskKind;

/// Kind of guarded action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LimitAction {
    /// Moving towards an objective's target.
    Approach,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LimitKey {
    /// Usually the acting unit's id.
    pub scope: String,
    pub task: TaskKind,
    pub action: LimitAction,
}

impl LimitKey {
    pub fn new(scope: impl Into<String>, task: TaskKind, action: LimitAction) -> Self {
        Self {
            scope: scope.into(),
            task,
            action,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LimitPolicy {
    /// Limit after `max_calls` calls, each within `adjacency_margin` cycles
    /// of the previous one, the latest within `adjacency_margin` of now.
    Consecutive {
        max_calls: usize,
        adjacency_margin: u64,
    },
    /// Limit once the call rate over the last `bucket_size` calls reaches
    /// `max_rate` calls per cycle.
    Frequency { max_rate: f64, bucket_size: usize },
}

impl LimitPolicy {
    fn window(&self) -> usize {
        match self {
            Self::Consecutive { max_calls, .. } => *max_calls,
            Self::Frequency { bucket_size, .. } => *bucket_size,
        }
    }

    fn gauge(&self, records: &VecDeque<u64>, now: u64) -> f64 {
        match *self {
            Self::Consecutive {
                adjacency_margin, ..
            } => {
                // The run must reach up to `now`; an old run does not count.
                let mut previous = now;
                let mut run = 0_u32;
                for &cycle in records.iter().rev() {
                    if previous.saturating_sub(cycle) > adjacency_margin {
                        break;
                    }
                    previous = cycle;
                    run += 1;
                }
                f64::from(run)
            }
            Self::Frequency { .. } => {
                let Some(&first) = records.front() else {
                    return 0.0;
                };
                let elapsed = now.saturating_sub(first).max(1);
                records.len() as f64 / elapsed as f64
            }
        }
    }

    fn limit(&self) -> f64 {
        match *self {
            Self::Consecutive { max_calls, .. } => max_calls as f64,
            Self::Frequency { max_rate, .. } => max_rate,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitDecision {
    Allowed,
    Limited,
}

#[derive(Debug, Clone)]
pub struct CallLimiter {
    policy: LimitPolicy,
    clear_on_limit: bool,
    history: HashMap<LimitKey, VecDeque<u64>>,
}

impl CallLimiter {
    pub fn new(policy: LimitPolicy) -> Self {
        Self {
            policy,
            clear_on_limit: false,
            history: HashMap::new(),
        }
    }

    /// Forget a key's history whenever it hits the limit.
    pub fn clearing_on_limit(mut self) -> Self {
        self.clear_on_limit = true;
        self
    }

    pub fn policy(&self) -> LimitPolicy {
        self.policy
    }

    /// Record a call attempt at cycle `now`.
    pub fn call(&mut self, key: LimitKey, now: u64) -> LimitDecision {
        let window = self.policy.window();
        let records = self.history.entry(key).or_default();
        while records.len() > window {
            records.pop_front();
        }

        if self.policy.gauge(records, now) >= self.policy.limit() {
            if self.clear_on_limit {
                records.clear();
            }
            return LimitDecision::Limited;
        }
        records.push_back(now);
        LimitDecision::Allowed
    }

    pub fn recorded(&self, key: &LimitKey) -> usize {
        self.history.get(key).map_or(0, VecDeque::len)
    }

    /// Calls recorded under any key scoped to `scope`.
    pub fn recorded_in_scope(&self, scope: &str) -> usize {
        self.history
            .iter()
            .filter(|(key, _)| key.scope == scope)
            .map(|(_, records)| records.len())
            .sum()
    }

    /// Keep only keys whose scope passes `keep`. Returns how many keys were
    /// dropped.
    pub fn retain_scopes(&mut self, keep: impl Fn(&str) -> bool) -> usize {
        let before = self.history.len();
        self.history.retain(|key, _| keep(&key.scope));
        before - self.history.len()
    }

    pub fn clear(&mut self) {
        self.history.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> LimitKey {
        LimitKey::new("w1", TaskKind::RoadConstruction, LimitAction::Approach)
    }

    fn consecutive() -> CallLimiter {
        CallLimiter::new(LimitPolicy::Consecutive {
            max_calls: 5,
            adjacency_margin: 2,
        })
    }

    #[test]
    fn test_consecutive_limits_after_run() {
        let mut limiter = consecutive().clearing_on_limit();
        for cycle in [10, 11, 13, 14, 16] {
            assert_eq!(limiter.call(key(), cycle), LimitDecision::Allowed);
        }
        assert_eq!(limiter.call(key(), 17), LimitDecision::Limited);
        assert_eq!(limiter.recorded(&key()), 0);
        assert_eq!(limiter.call(key(), 18), LimitDecision::Allowed);
    }

    #[test]
    fn test_gap_breaks_consecutive_run() {
        let mut limiter = consecutive();
        for cycle in [10, 11, 12, 13, 20] {
            assert_eq!(limiter.call(key(), cycle), LimitDecision::Allowed);
        }
        // Trailing run is [20] only.
        assert_eq!(limiter.call(key(), 21), LimitDecision::Allowed);
    }

    #[test]
    fn test_stale_run_does_not_limit_fresh_call() {
        let mut limiter = consecutive();
        for cycle in 1..=5 {
            assert_eq!(limiter.call(key(), cycle), LimitDecision::Allowed);
        }
        assert_eq!(limiter.call(key(), 5_000), LimitDecision::Allowed);
        assert_eq!(limiter.call(key(), 5_001), LimitDecision::Allowed);
    }

    #[test]
    fn test_keys_are_independent() {
        let mut limiter = consecutive();
        for cycle in 0..5 {
            limiter.call(key(), cycle);
        }
        let other = LimitKey::new("w2", TaskKind::RoadConstruction, LimitAction::Approach);
        assert_eq!(limiter.call(other, 5), LimitDecision::Allowed);
        assert_eq!(limiter.call(key(), 5), LimitDecision::Limited);
    }

    #[test]
    fn test_frequency_policy() {
        let mut limiter = CallLimiter::new(LimitPolicy::Frequency {
            max_rate: 0.5,
            bucket_size: 4,
        });
        for cycle in [0, 10, 10, 11, 12] {
            assert_eq!(limiter.call(key(), cycle), LimitDecision::Allowed);
        }
        // The oldest call slides out: 4 calls over 3 cycles.
        assert_eq!(limiter.call(key(), 13), LimitDecision::Limited);
        assert_eq!(limiter.recorded(&key()), 4);
    }

    #[test]
    fn test_frequency_limits_bursts() {
        let mut limiter = CallLimiter::new(LimitPolicy::Frequency {
            max_rate: 2.0,
            bucket_size: 10,
        });
        assert_eq!(limiter.call(key(), 100), LimitDecision::Allowed);
        assert_eq!(limiter.call(key(), 100), LimitDecision::Allowed);
        assert_eq!(limiter.call(key(), 100), LimitDecision::Limited);
    }

    #[test]
    fn test_retain_scopes() {
        let mut limiter = consecutive();
        let other = LimitKey::new("w2", TaskKind::WallRepairing, LimitAction::Approach);
        limiter.call(key(), 1);
        limiter.call(other.clone(), 1);
        limiter.call(other, 2);

        assert_eq!(limiter.retain_scopes(|scope| scope == "w2"), 1);
        assert_eq!(limiter.recorded(&key()), 0);
        assert_eq!(limiter.recorded_in_scope("w2"), 2);
    }
}
