use dashmap::DashMap;
use sha2::{Digest, Sha256};
use std::time::{Duration, Instant};

use crate::models::{GenerateRequest, GenerateResponse};
use crate::rate_limit::Feature;

// Cached backend response with timestamp
#[derive(Clone)]
pub struct CacheEntry {
    pub response: GenerateResponse,
    pub created_at: Instant,
}

pub type ResponseCache = DashMap<String, CacheEntry>;

// Cache key: hash of feature + model + prompt
pub fn make_cache_key(feature: Feature, req: &GenerateRequest) -> String {
    let mut hasher = Sha256::new();
    hasher.update(feature.slug());
    hasher.update([0u8]);
    hasher.update(&req.model);
    hasher.update([0u8]);
    hasher.update(&req.prompt);
    format!("{:x}", hasher.finalize())
}

// Fresh entry for key, if any
pub fn lookup(cache: &ResponseCache, key: &str, ttl: Duration) -> Option<GenerateResponse> {
    cache
        .get(key)
        .filter(|entry| entry.created_at.elapsed() < ttl)
        .map(|entry| entry.response.clone())
}
