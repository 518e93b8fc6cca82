use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::time::Duration;

use super::Keyspace;
use super::policy::RateLimitPolicy;
use super::state::{Admission, RateState};

// Backing storage for rate state. `check` must be one read-modify-write per
// (keyspace, identity); a shared store (Redis, a row lock) plugs in here.
pub trait RateStore: Send + Sync {
    fn check(
        &self,
        keyspace: Keyspace,
        identity: &str,
        policy: &RateLimitPolicy,
        now_ms: i64,
    ) -> Admission;

    fn get(&self, keyspace: Keyspace, identity: &str) -> Option<RateState>;

    // Returns how many records were removed
    fn sweep_idle(&self, now_ms: i64, idle_ttl: Duration) -> usize;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// One map per keyspace
#[derive(Debug, Default)]
pub struct InMemoryRateStore {
    users: DashMap<String, RateState>,
    guests: DashMap<String, RateState>,
}

impl InMemoryRateStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn map(&self, keyspace: Keyspace) -> &DashMap<String, RateState> {
        match keyspace {
            Keyspace::User => &self.users,
            Keyspace::Guest => &self.guests,
        }
    }
}

impl RateStore for InMemoryRateStore {
    fn check(
        &self,
        keyspace: Keyspace,
        identity: &str,
        policy: &RateLimitPolicy,
        now_ms: i64,
    ) -> Admission {
        // entry() holds the shard write lock for the whole update
        match self.map(keyspace).entry(identity.to_string()) {
            Entry::Occupied(mut occupied) => occupied.get_mut().admit(policy, now_ms),
            Entry::Vacant(vacant) => {
                vacant.insert(RateState::first(policy, now_ms));
                Admission::Allowed
            }
        }
    }

    fn get(&self, keyspace: Keyspace, identity: &str) -> Option<RateState> {
        self.map(keyspace)
            .get(identity)
            .map(|entry| entry.value().clone())
    }

    fn sweep_idle(&self, now_ms: i64, idle_ttl: Duration) -> usize {
        let idle_ms = i64::try_from(idle_ttl.as_millis()).unwrap_or(i64::MAX);
        let mut removed = 0;
        for map in [&self.users, &self.guests] {
            map.retain(|_, state| {
                let idle = state.is_idle(now_ms, idle_ms);
                if idle {
                    removed += 1;
                }
                !idle
            });
        }
        removed
    }

    fn len(&self) -> usize {
        self.users.len() + self.guests.len()
    }
}
