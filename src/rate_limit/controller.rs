use std::sync::Arc;
use std::time::Duration;

use super::clock::{Clock, SystemClock};
use super::policy::RateLimitPolicy;
use super::state::{Admission, Decision, RateState};
use super::store::{InMemoryRateStore, RateStore};
use super::Keyspace;
use crate::metrics::{ADMISSIONS_ALLOWED, ADMISSIONS_DENIED, LOCKOUTS_TOTAL, TRACKED_IDENTITIES};

// Shared by every guarded entry point; clones share the store
#[derive(Clone)]
pub struct AdmissionController {
    store: Arc<dyn RateStore>,
    clock: Arc<dyn Clock>,
    default_policy: RateLimitPolicy,
}

impl AdmissionController {
    pub fn new(
        store: Arc<dyn RateStore>,
        clock: Arc<dyn Clock>,
        default_policy: RateLimitPolicy,
    ) -> Self {
        Self {
            store,
            clock,
            default_policy,
        }
    }

    pub fn in_memory(default_policy: RateLimitPolicy) -> Self {
        Self::new(
            Arc::new(InMemoryRateStore::new()),
            Arc::new(SystemClock),
            default_policy,
        )
    }

    pub fn default_policy(&self) -> &RateLimitPolicy {
        &self.default_policy
    }

    // Denials carry the remaining lockout, recomputed on every call
    pub fn check_admission(
        &self,
        identity: &str,
        is_authenticated: bool,
        policy: Option<RateLimitPolicy>,
    ) -> Decision {
        self.admit(identity, is_authenticated, policy).into_decision()
    }

    // Same as check_admission, but tells a fresh lockout apart from one already running
    pub fn admit(
        &self,
        identity: &str,
        is_authenticated: bool,
        policy: Option<RateLimitPolicy>,
    ) -> Admission {
        let keyspace = Keyspace::from_authenticated(is_authenticated);
        let policy = policy.unwrap_or(self.default_policy);
        let now_ms = self.clock.now_ms();

        let admission = self.store.check(keyspace, identity, &policy, now_ms);

        match &admission {
            Admission::Allowed => {
                ADMISSIONS_ALLOWED.inc();
                tracing::debug!(%keyspace, identity, "request admitted");
            }
            Admission::LockedOut(denied) => {
                ADMISSIONS_DENIED.inc();
                LOCKOUTS_TOTAL.inc();
                tracing::warn!(
                    %keyspace,
                    identity,
                    max_requests = policy.max_requests,
                    retry_after = denied.retry_after_secs,
                    "quota exceeded, identity locked out"
                );
            }
            Admission::Denied(denied) => {
                ADMISSIONS_DENIED.inc();
                tracing::debug!(
                    %keyspace,
                    identity,
                    retry_after = denied.retry_after_secs,
                    "request denied during lockout"
                );
            }
        }
        TRACKED_IDENTITIES.set(self.store.len() as f64);

        admission
    }

    pub fn state(&self, identity: &str, is_authenticated: bool) -> Option<RateState> {
        self.store
            .get(Keyspace::from_authenticated(is_authenticated), identity)
    }

    pub fn tracked_identities(&self) -> usize {
        self.store.len()
    }

    pub fn sweep_idle(&self, idle_ttl: Duration) -> usize {
        let removed = self.store.sweep_idle(self.clock.now_ms(), idle_ttl);
        TRACKED_IDENTITIES.set(self.store.len() as f64);
        removed
    }
}

// Background eviction of idle records
pub async fn run_sweeper(controller: AdmissionController, interval: Duration, idle_ttl: Duration) {
    let mut ticker = tokio::time::interval(interval);
    tracing::info!(?interval, ?idle_ttl, "rate state sweeper started");

    loop {
        ticker.tick().await;
        let removed = controller.sweep_idle(idle_ttl);
        if removed > 0 {
            crate::metrics::SWEPT_IDENTITIES.inc_by(removed as f64);
            tracing::debug!(removed, remaining = controller.tracked_identities(), "swept idle rate state");
        }
    }
}
