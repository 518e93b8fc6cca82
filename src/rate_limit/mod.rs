mod clock;
mod controller;
mod feature;
mod policy;
mod state;
mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use controller::{AdmissionController, run_sweeper};
pub use feature::{Feature, IdentityRule, UnknownFeature};
pub use policy::{
    DEFAULT_LOCKOUT, DEFAULT_MAX_REQUESTS, DEFAULT_WINDOW, PolicyOverrides, RateLimitPolicy,
};
pub use state::{Admission, Decision, RateState};
pub use store::{InMemoryRateStore, RateStore};

use serde::Serialize;
use std::fmt;

// Users and guests never share quota, even for the same raw id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Keyspace {
    User,
    Guest,
}

impl Keyspace {
    pub fn from_authenticated(is_authenticated: bool) -> Self {
        if is_authenticated {
            Keyspace::User
        } else {
            Keyspace::Guest
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Keyspace::User => "user",
            Keyspace::Guest => "guest",
        }
    }
}

impl fmt::Display for Keyspace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Too many requests. Please try again in {retry_after_secs} seconds.")]
pub struct RateLimitExceeded {
    // rounded up
    pub retry_after_secs: u64,
}

impl RateLimitExceeded {
    pub fn from_millis(remaining_ms: i64) -> Self {
        let remaining_ms = remaining_ms.max(0) as u64;
        Self {
            retry_after_secs: remaining_ms.div_ceil(1000),
        }
    }
}
