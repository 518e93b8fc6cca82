use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

use crate::cache::{CacheEntry, ResponseCache, lookup, make_cache_key};
use crate::error::GatewayError;
use crate::load_balancer::LoadBalancer;
use crate::metrics::{CACHE_HITS, CACHE_MISSES, CACHE_SIZE};
use crate::models::{BatchedRequest, GenerateRequest, GenerateResponse};

// Drains admitted requests one at a time: cache first, then the next healthy backend
pub async fn batch_worker(
    mut rx: mpsc::Receiver<BatchedRequest>,
    client: reqwest::Client,
    load_balancer: Arc<LoadBalancer>,
    cache: Arc<ResponseCache>,
    ttl: Duration,
) {
    tracing::info!("batch worker started");

    while let Some(batched_req) = rx.recv().await {
        let cache_key = make_cache_key(batched_req.feature, &batched_req.request);

        if let Some(response) = lookup(&cache, &cache_key, ttl) {
            CACHE_HITS.inc();
            tracing::debug!(feature = %batched_req.feature, "cache hit");
            let _ = batched_req.response_tx.send(Ok(response));
            continue;
        }
        CACHE_MISSES.inc();

        let result = match load_balancer.get_backend() {
            Some(backend) => {
                tracing::debug!(feature = %batched_req.feature, url = %backend.url, "forwarding to backend");
                let result = call_backend(&client, &backend.url, &batched_req.request).await;
                if result.is_err() {
                    backend.set_healthy(false);
                    tracing::warn!(url = %backend.url, "backend failed, marked unhealthy");
                }
                result
            }
            None => Err(GatewayError::NoHealthyBackend),
        };

        if let Ok(body) = &result {
            cache.insert(
                cache_key,
                CacheEntry {
                    response: body.clone(),
                    created_at: Instant::now(),
                },
            );
            CACHE_SIZE.set(cache.len() as f64);
        }

        // Receiver may have gone away with its client
        let _ = batched_req.response_tx.send(result);
    }

    tracing::info!("batch worker stopped");
}

async fn call_backend(
    client: &reqwest::Client,
    base_url: &str,
    request: &GenerateRequest,
) -> Result<GenerateResponse, GatewayError> {
    let res = client
        .post(format!("{}/api/generate", base_url))
        .json(request)
        .send()
        .await
        .map_err(|e| GatewayError::Upstream(format!("request failed: {}", e)))?;

    if !res.status().is_success() {
        return Err(GatewayError::Upstream(format!(
            "backend returned {}",
            res.status()
        )));
    }

    res.json::<GenerateResponse>()
        .await
        .map_err(|e| GatewayError::Upstream(format!("parse error: {}", e)))
}
