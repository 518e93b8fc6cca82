use serde::Serialize;

use super::RateLimitExceeded;
use super::policy::RateLimitPolicy;

pub type Decision = Result<(), RateLimitExceeded>;

// What one request did to an identity's record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Allowed,
    // this request went over quota and started the lockout
    LockedOut(RateLimitExceeded),
    // lockout already running
    Denied(RateLimitExceeded),
}

impl Admission {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Admission::Allowed)
    }

    pub fn into_decision(self) -> Decision {
        match self {
            Admission::Allowed => Ok(()),
            Admission::LockedOut(denied) | Admission::Denied(denied) => Err(denied),
        }
    }
}

// Per-identity counting state, unix millis
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RateState {
    pub count: u32,
    pub window_start_ms: i64,
    pub lockout_start_ms: Option<i64>,
    pub last_seen_ms: i64,
    // neither window nor lockout runs past this point
    pub expires_at_ms: i64,
}

impl RateState {
    pub fn first(policy: &RateLimitPolicy, now_ms: i64) -> Self {
        Self {
            count: 1,
            window_start_ms: now_ms,
            lockout_start_ms: None,
            last_seen_ms: now_ms,
            expires_at_ms: now_ms.saturating_add(policy.window_ms()),
        }
    }

    pub fn is_locked_out(&self) -> bool {
        self.lockout_start_ms.is_some()
    }

    // Active lockout is checked before the window; an expired one resets the record first.
    pub fn admit(&mut self, policy: &RateLimitPolicy, now_ms: i64) -> Admission {
        self.last_seen_ms = now_ms;

        if let Some(lockout_start) = self.lockout_start_ms {
            let elapsed = now_ms.saturating_sub(lockout_start).max(0);
            if elapsed < policy.lockout_ms() {
                return Admission::Denied(RateLimitExceeded::from_millis(
                    policy.lockout_ms() - elapsed,
                ));
            }
            self.lockout_start_ms = None;
            self.count = 0;
            self.window_start_ms = now_ms;
        }

        if now_ms.saturating_sub(self.window_start_ms) > policy.window_ms() {
            self.count = 1;
            self.window_start_ms = now_ms;
        } else {
            self.count = self.count.saturating_add(1);
        }

        if self.count > policy.max_requests {
            self.lockout_start_ms = Some(now_ms);
            self.expires_at_ms = now_ms.saturating_add(policy.lockout_ms());
            return Admission::LockedOut(RateLimitExceeded::from_millis(policy.lockout_ms()));
        }

        self.expires_at_ms = self.window_start_ms.saturating_add(policy.window_ms());
        Admission::Allowed
    }

    pub fn is_idle(&self, now_ms: i64, idle_ms: i64) -> bool {
        now_ms >= self.expires_at_ms && now_ms.saturating_sub(self.last_seen_ms) >= idle_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn policy(max_requests: u32) -> RateLimitPolicy {
        RateLimitPolicy::new(Duration::from_secs(60), max_requests, Duration::from_secs(30))
    }

    #[test]
    fn first_request_starts_a_window() {
        let state = RateState::first(&policy(3), 1_000);
        assert_eq!(state.count, 1);
        assert_eq!(state.window_start_ms, 1_000);
        assert!(!state.is_locked_out());
        assert_eq!(state.expires_at_ms, 61_000);
    }

    #[test]
    fn quota_is_inclusive() {
        let policy = policy(3);
        let mut state = RateState::first(&policy, 0);
        assert!(state.admit(&policy, 10).is_allowed());
        assert!(state.admit(&policy, 20).is_allowed());
        assert_eq!(state.count, 3);

        let err = state.admit(&policy, 30).into_decision().unwrap_err();
        assert_eq!(err.retry_after_secs, 30);
        assert_eq!(state.lockout_start_ms, Some(30));
        assert_eq!(state.expires_at_ms, 30_030);
    }

    #[test]
    fn only_the_triggering_request_reports_a_new_lockout() {
        let policy = policy(1);
        let mut state = RateState::first(&policy, 0);

        let trigger = state.admit(&policy, 0);
        assert_eq!(
            trigger,
            Admission::LockedOut(RateLimitExceeded { retry_after_secs: 30 })
        );
        assert!(matches!(state.admit(&policy, 0), Admission::Denied(_)));
        assert!(matches!(state.admit(&policy, 29_999), Admission::Denied(_)));
    }

    #[test]
    fn locked_out_request_leaves_counters_alone() {
        let policy = policy(1);
        let mut state = RateState::first(&policy, 0);
        assert!(!state.admit(&policy, 0).is_allowed());
        let before = (state.count, state.window_start_ms);

        let err = state.admit(&policy, 10_500).into_decision().unwrap_err();
        // 19.5s left rounds up
        assert_eq!(err.retry_after_secs, 20);
        assert_eq!((state.count, state.window_start_ms), before);
        assert_eq!(state.last_seen_ms, 10_500);
    }

    #[test]
    fn expired_lockout_resets_to_a_fresh_window() {
        let policy = policy(1);
        let mut state = RateState::first(&policy, 0);
        assert!(!state.admit(&policy, 5).is_allowed());

        assert!(state.admit(&policy, 30_005).is_allowed());
        assert_eq!(state.count, 1);
        assert_eq!(state.window_start_ms, 30_005);
        assert_eq!(state.lockout_start_ms, None);
    }

    #[test]
    fn window_boundary_is_exclusive() {
        let policy = policy(2);
        let mut state = RateState::first(&policy, 0);
        // exactly one window later still counts toward the old window
        assert!(state.admit(&policy, 60_000).is_allowed());
        assert_eq!(state.count, 2);
        assert_eq!(state.window_start_ms, 0);

        assert!(state.admit(&policy, 60_001).is_allowed());
        assert_eq!(state.count, 1);
        assert_eq!(state.window_start_ms, 60_001);
    }

    #[test]
    fn clock_going_backwards_does_not_extend_countdown() {
        let policy = policy(1);
        let mut state = RateState::first(&policy, 10_000);
        assert!(!state.admit(&policy, 10_000).is_allowed());

        let err = state.admit(&policy, 9_000).into_decision().unwrap_err();
        assert_eq!(err.retry_after_secs, 30);
    }

    #[test]
    fn huge_policy_still_enforces_quota_and_lockout() {
        let policy = RateLimitPolicy::new(
            Duration::from_secs(u64::MAX),
            1,
            Duration::from_secs(u64::MAX),
        );
        let now = 1_700_000_000_000;
        let mut state = RateState::first(&policy, now);
        assert_eq!(state.expires_at_ms, i64::MAX);

        let allowed = 1 + (0..9i64)
            .filter(|i| state.admit(&policy, now + i * 1_000).is_allowed())
            .count();
        assert_eq!(allowed, 1);
        assert!(state.is_locked_out());
        assert!(!state.is_idle(i64::MAX - 1, 0));
    }

    #[test]
    fn idle_requires_expiry_and_quiet_time() {
        let policy = policy(5);
        let state = RateState::first(&policy, 0);
        assert!(!state.is_idle(59_999, 0));
        assert!(state.is_idle(60_000, 0));
        assert!(!state.is_idle(60_000, 120_000));
        assert!(state.is_idle(120_000, 120_000));
    }
}
