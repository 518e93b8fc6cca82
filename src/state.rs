use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use crate::cache::ResponseCache;
use crate::error::GatewayError;
use crate::load_balancer::LoadBalancer;
use crate::models::BatchedRequest;
use crate::rate_limit::AdmissionController;
use crate::worker::batch_worker;

const QUEUE_DEPTH: usize = 100;
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

// app's shared state
pub struct AppState {
    pub client: reqwest::Client,
    pub cache: Arc<ResponseCache>,
    pub load_balancer: Arc<LoadBalancer>,
    pub admission: AdmissionController,
    pub batch_tx: mpsc::Sender<BatchedRequest>,
}

impl AppState {
    // Spawns the batch worker on the current runtime
    pub fn start(
        backends: &str,
        cache_ttl: Duration,
        admission: AdmissionController,
    ) -> Result<Arc<Self>, GatewayError> {
        let load_balancer = Arc::new(LoadBalancer::new(backends)?);
        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| GatewayError::Upstream(format!("client setup failed: {}", e)))?;
        let cache = Arc::new(ResponseCache::new());
        let (batch_tx, batch_rx) = mpsc::channel::<BatchedRequest>(QUEUE_DEPTH);

        tokio::spawn(batch_worker(
            batch_rx,
            client.clone(),
            Arc::clone(&load_balancer),
            Arc::clone(&cache),
            cache_ttl,
        ));

        Ok(Arc::new(Self {
            client,
            cache,
            load_balancer,
            admission,
            batch_tx,
        }))
    }
}
