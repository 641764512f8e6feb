// Request governor - gates outbound AI calls through three quotas
// Author: kelexine (https://github.com/kelexine)

use super::models::{DailySnapshot, DenialReason, Permission, UsageStats};
use crate::config::LimitsConfig;
use crate::storage::KeyValueStore;
use crate::utils::Clock;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::{debug, info};

/// Storage key for the persisted daily counter.
pub const DAILY_STATE_KEY: &str = "rh_daily_requests";

const MINUTE_MS: i64 = 60 * 1000;
const DAY_MS: i64 = 24 * 60 * 60 * 1000;

/// Decides whether an outbound AI request may be sent right now.
///
/// Three independent limits apply, checked in this order:
/// 1. a rolling 24 hour quota (`daily_limit`)
/// 2. a fixed gap after the previous request (`cooldown_ms`)
/// 3. a trailing 60 second quota (`per_minute_limit`)
///
/// In-memory counters are authoritative while the process runs. The daily
/// counter is mirrored to a [`KeyValueStore`] on every recorded request and
/// read back at construction and in [`RequestGovernor::usage_stats`].
pub struct RequestGovernor {
    limits: LimitsConfig,
    clock: Arc<dyn Clock>,
    store: Arc<dyn KeyValueStore>,
    state: Mutex<GovernorState>,
}

#[derive(Debug)]
struct GovernorState {
    /// Requests inside the trailing minute, oldest first.
    recent: VecDeque<i64>,
    last_request: Option<i64>,
    daily_count: u32,
    daily_reset: i64,
}

impl GovernorState {
    fn new(now: i64) -> Self {
        Self {
            recent: VecDeque::new(),
            last_request: None,
            daily_count: 0,
            daily_reset: now,
        }
    }

    /// The daily window rolls forward from the last reset, not at midnight.
    fn roll_daily_window(&mut self, now: i64) {
        if now.saturating_sub(self.daily_reset) >= DAY_MS {
            debug!("Daily window elapsed, resetting counter from {}", self.daily_count);
            self.daily_count = 0;
            self.daily_reset = now;
        }
    }

    fn prune_recent(&mut self, now: i64) {
        let cutoff = now.saturating_sub(MINUTE_MS);
        while self.recent.front().is_some_and(|&t| t <= cutoff) {
            self.recent.pop_front();
        }
    }

    fn evaluate(&mut self, limits: &LimitsConfig, now: i64) -> Permission {
        self.roll_daily_window(now);

        if self.daily_count >= limits.daily_limit {
            let elapsed = now.saturating_sub(self.daily_reset);
            return denied(DenialReason::DailyLimit, DAY_MS.saturating_sub(elapsed));
        }

        if let Some(last) = self.last_request {
            let elapsed = now.saturating_sub(last);
            let cooldown = i64::try_from(limits.cooldown_ms).unwrap_or(i64::MAX);
            if elapsed < cooldown {
                return denied(DenialReason::Cooldown, cooldown - elapsed);
            }
        }

        self.prune_recent(now);
        if self.recent.len() >= limits.per_minute_limit as usize {
            let oldest = self.recent.front().copied().unwrap_or(now);
            return denied(
                DenialReason::PerMinute,
                MINUTE_MS.saturating_sub(now.saturating_sub(oldest)),
            );
        }

        Permission::Allowed
    }

    fn record(&mut self, now: i64) {
        self.recent.push_back(now);
        self.last_request = Some(now);
        self.daily_count = self.daily_count.saturating_add(1);
    }

    /// Take over a persisted counter if its window is still open.
    ///
    /// Reset times in the future or too far in the past to subtract are
    /// treated like a missing snapshot.
    fn adopt(&mut self, snapshot: DailySnapshot, now: i64) {
        let fresh = now
            .checked_sub(snapshot.reset_time)
            .is_some_and(|age| (0..DAY_MS).contains(&age));
        if !fresh {
            debug!("Ignoring daily snapshot with reset time {}", snapshot.reset_time);
            return;
        }
        self.daily_count = snapshot.count;
        self.daily_reset = snapshot.reset_time;
    }

    fn snapshot(&self) -> DailySnapshot {
        DailySnapshot {
            count: self.daily_count,
            reset_time: self.daily_reset,
        }
    }
}

fn denied(reason: DenialReason, wait_ms: i64) -> Permission {
    Permission::Denied {
        reason,
        wait_ms: wait_ms.max(0) as u64,
    }
}

impl RequestGovernor {
    /// Create a governor, picking up any persisted daily counter.
    pub fn new(
        limits: LimitsConfig,
        clock: Arc<dyn Clock>,
        store: Arc<dyn KeyValueStore>,
    ) -> Self {
        let now = clock.now_millis();
        let mut state = GovernorState::new(now);

        if let Some(snapshot) = load_snapshot(store.as_ref()) {
            state.adopt(snapshot, now);
            if state.daily_count > 0 {
                info!(
                    "Restored daily usage: {}/{} requests",
                    state.daily_count, limits.daily_limit
                );
            }
        }

        Self {
            limits,
            clock,
            store,
            state: Mutex::new(state),
        }
    }

    /// Check whether a request may be sent now without consuming quota.
    ///
    /// Calling this repeatedly gives the same answer until time passes or a
    /// request is recorded.
    pub fn check_permission(&self) -> Permission {
        let now = self.clock.now_millis();
        let permission = self.state.lock().evaluate(&self.limits, now);
        observe(&permission);
        permission
    }

    /// Count one request that was actually sent.
    ///
    /// Must be called once per outbound request. Does not re-check the limits.
    pub fn record_request(&self) {
        let now = self.clock.now_millis();
        let snapshot = {
            let mut state = self.state.lock();
            state.record(now);
            state.snapshot()
        };
        self.persist(snapshot);
    }

    /// Check and, when allowed, record in one step.
    ///
    /// Use this when several tasks share the governor: two callers can never
    /// both pass the check before either is counted.
    pub fn try_acquire(&self) -> Permission {
        let now = self.clock.now_millis();
        let (permission, snapshot) = {
            let mut state = self.state.lock();
            let permission = state.evaluate(&self.limits, now);
            if permission.is_allowed() {
                state.record(now);
                (permission, Some(state.snapshot()))
            } else {
                (permission, None)
            }
        };

        observe(&permission);
        if let Some(snapshot) = snapshot {
            self.persist(snapshot);
        }
        permission
    }

    /// Daily quota usage, refreshed from durable storage first.
    pub fn usage_stats(&self) -> UsageStats {
        let now = self.clock.now_millis();
        let persisted = load_snapshot(self.store.as_ref());

        let used = {
            let mut state = self.state.lock();
            if let Some(snapshot) = persisted {
                state.adopt(snapshot, now);
            }
            state.roll_daily_window(now);
            state.daily_count
        };

        crate::metrics::update_daily_usage(used);

        UsageStats {
            used,
            limit: self.limits.daily_limit,
            remaining: self.limits.daily_limit.saturating_sub(used),
        }
    }

    fn persist(&self, snapshot: DailySnapshot) {
        crate::metrics::update_daily_usage(snapshot.count);

        let encoded = match serde_json::to_string(&snapshot) {
            Ok(encoded) => encoded,
            Err(e) => {
                debug!("Could not encode daily snapshot: {}", e);
                return;
            }
        };

        // Losing the snapshot only means a restart forgets today's usage
        if let Err(e) = self.store.set(DAILY_STATE_KEY, &encoded) {
            debug!("Could not persist daily snapshot: {}", e);
        }
    }
}

fn load_snapshot(store: &dyn KeyValueStore) -> Option<DailySnapshot> {
    let raw = match store.get(DAILY_STATE_KEY) {
        Ok(raw) => raw?,
        Err(e) => {
            debug!("Could not read daily snapshot: {}", e);
            return None;
        }
    };

    match serde_json::from_str(&raw) {
        Ok(snapshot) => Some(snapshot),
        Err(e) => {
            debug!("Ignoring malformed daily snapshot: {}", e);
            None
        }
    }
}

fn observe(permission: &Permission) {
    match permission {
        Permission::Allowed => crate::metrics::record_governor_decision("allowed"),
        Permission::Denied { reason, wait_ms } => {
            debug!("Request denied ({}), retry in {} ms", reason.as_str(), wait_ms);
            crate::metrics::record_governor_decision(reason.as_str());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use crate::utils::ManualClock;
    use std::time::Duration;

    fn governor_at(start: i64) -> (RequestGovernor, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(start));
        let governor = RequestGovernor::new(
            LimitsConfig::default(),
            clock.clone(),
            Arc::new(MemoryStore::new()),
        );
        (governor, clock)
    }

    #[test]
    fn test_fresh_governor_allows() {
        let (governor, _) = governor_at(1_000_000);
        assert_eq!(governor.check_permission(), Permission::Allowed);
    }

    #[test]
    fn test_daily_wait_counts_down_from_reset() {
        let limits = LimitsConfig {
            daily_limit: 1,
            ..LimitsConfig::default()
        };
        let clock = Arc::new(ManualClock::new(0));
        let governor = RequestGovernor::new(limits, clock.clone(), Arc::new(MemoryStore::new()));

        governor.record_request();
        clock.advance(Duration::from_secs(60 * 60));

        assert_eq!(
            governor.check_permission(),
            Permission::Denied {
                reason: DenialReason::DailyLimit,
                wait_ms: (DAY_MS - 60 * 60 * 1000) as u64,
            }
        );
    }

    #[test]
    fn test_backward_clock_keeps_daily_count() {
        let limits = LimitsConfig {
            daily_limit: 1,
            ..LimitsConfig::default()
        };
        let clock = Arc::new(ManualClock::new(10 * DAY_MS));
        let governor = RequestGovernor::new(limits, clock.clone(), Arc::new(MemoryStore::new()));

        governor.record_request();
        clock.advance(Duration::from_millis((DAY_MS - 1) as u64));
        assert_eq!(governor.check_permission().wait(), Duration::from_millis(1));

        // Moving the clock back must not reopen the quota
        clock.set(0);
        assert_eq!(
            governor.check_permission().reason(),
            Some(DenialReason::DailyLimit)
        );
    }

    #[test]
    fn test_prune_keeps_only_trailing_minute() {
        let mut state = GovernorState::new(0);
        state.record(0);
        state.record(30_000);
        state.record(59_999);

        state.prune_recent(60_000);
        assert_eq!(state.recent, VecDeque::from(vec![30_000, 59_999]));
    }
}
