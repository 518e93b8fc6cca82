use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_WINDOW: Duration = Duration::from_secs(5 * 60);
pub const DEFAULT_MAX_REQUESTS: u32 = 5;
pub const DEFAULT_LOCKOUT: Duration = Duration::from_secs(5 * 60);

// Window, quota and penalty for one call site.
// Deserializes from a partial object; missing fields take the defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(from = "PolicyOverrides", into = "PolicyOverrides")]
pub struct RateLimitPolicy {
    pub window: Duration,
    pub max_requests: u32, // the next one triggers a lockout
    pub lockout: Duration,
}

impl RateLimitPolicy {
    pub const fn new(window: Duration, max_requests: u32, lockout: Duration) -> Self {
        Self {
            window,
            max_requests,
            lockout,
        }
    }

    // Durations past i64 millis clamp to i64::MAX
    pub fn window_ms(&self) -> i64 {
        i64::try_from(self.window.as_millis()).unwrap_or(i64::MAX)
    }

    pub fn lockout_ms(&self) -> i64 {
        i64::try_from(self.lockout.as_millis()).unwrap_or(i64::MAX)
    }
}

impl Default for RateLimitPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW, DEFAULT_MAX_REQUESTS, DEFAULT_LOCKOUT)
    }
}

// Unset fields are taken from a base policy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct PolicyOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window_secs: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_requests: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lockout_secs: Option<u64>,
}

impl PolicyOverrides {
    pub fn apply(self, base: RateLimitPolicy) -> RateLimitPolicy {
        RateLimitPolicy {
            window: self
                .window_secs
                .map(Duration::from_secs)
                .unwrap_or(base.window),
            max_requests: self.max_requests.unwrap_or(base.max_requests),
            lockout: self
                .lockout_secs
                .map(Duration::from_secs)
                .unwrap_or(base.lockout),
        }
    }
}

impl From<PolicyOverrides> for RateLimitPolicy {
    fn from(overrides: PolicyOverrides) -> Self {
        overrides.apply(RateLimitPolicy::default())
    }
}

impl From<RateLimitPolicy> for PolicyOverrides {
    fn from(policy: RateLimitPolicy) -> Self {
        Self {
            window_secs: Some(policy.window.as_secs()),
            max_requests: Some(policy.max_requests),
            lockout_secs: Some(policy.lockout.as_secs()),
        }
    }
}
