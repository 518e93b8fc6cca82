use clap::Parser;
use std::time::Duration;

use crate::rate_limit::RateLimitPolicy;

// CLI argument structure, every flag can also come from the environment
#[derive(Parser, Debug, Clone)]
#[command(name = "studyai-gateway")]
#[command(about = "Admission-controlled gateway for StudyAI's generative features")]
pub struct Args {
    // Port to run the server on
    #[arg(short, long, env = "STUDYAI_PORT", default_value_t = 8080)]
    pub port: u16,

    // Generative backends (comma-separated)
    // Example: "localhost:11434,localhost:11435"
    #[arg(short, long, env = "STUDYAI_BACKENDS", default_value = "localhost:11434")]
    pub backends: String,

    // Cache TTL in seconds
    #[arg(short, long, env = "STUDYAI_CACHE_TTL", default_value_t = 30)]
    pub cache_ttl: u64,

    // Default policy: max requests per window
    #[arg(long, env = "STUDYAI_RATE_LIMIT", default_value_t = 5)]
    pub rate_limit: u32,

    // Default policy: window in seconds
    #[arg(long, env = "STUDYAI_RATE_WINDOW", default_value_t = 300)]
    pub rate_window: u64,

    // Default policy: lockout in seconds
    #[arg(long, env = "STUDYAI_LOCKOUT", default_value_t = 300)]
    pub lockout: u64,

    // Health check interval in seconds
    #[arg(long, env = "STUDYAI_HEALTH_INTERVAL", default_value_t = 30)]
    pub health_interval: u64,

    // How often idle rate state is swept, in seconds
    #[arg(long, env = "STUDYAI_SWEEP_INTERVAL", default_value_t = 60)]
    pub sweep_interval: u64,

    // Idle time before a settled record is evicted, in seconds.
    // Keep it above the longest window and lockout in use.
    #[arg(long, env = "STUDYAI_IDLE_TTL", default_value_t = 900)]
    pub idle_ttl: u64,
}

impl Args {
    pub fn default_policy(&self) -> RateLimitPolicy {
        RateLimitPolicy::new(
            Duration::from_secs(self.rate_window),
            self.rate_limit,
            Duration::from_secs(self.lockout),
        )
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl)
    }

    pub fn health_interval(&self) -> Duration {
        Duration::from_secs(self.health_interval)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval)
    }

    pub fn idle_ttl(&self) -> Duration {
        Duration::from_secs(self.idle_ttl)
    }
}
