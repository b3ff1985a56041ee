use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use governor::{
    clock::{Clock, DefaultClock},
    DefaultKeyedRateLimiter, Quota, RateLimiter,
};
use std::net::{IpAddr, Ipv4Addr};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use crate::error::TtsError;
use crate::utils::header_utils::extract_client_ip;

/// Bucket shared by requests whose peer address is unknown
const UNKNOWN_CLIENT: IpAddr = IpAddr::V4(Ipv4Addr::UNSPECIFIED);

/// Configuration for rate limiting
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Requests per second allowed
    pub per_second: u32,
    /// Burst size (max requests in a single burst)
    pub burst_size: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            per_second: 1,
            burst_size: 5,
        }
    }
}

/// Rate limiter that tracks limits per client address
#[derive(Clone)]
pub struct PerIpRateLimiter {
    limiter: Arc<DefaultKeyedRateLimiter<IpAddr>>,
    config: RateLimitConfig,
    trust_proxy: bool,
    clock: DefaultClock,
}

impl PerIpRateLimiter {
    /// `trust_proxy` lets forwarded headers choose the bucket
    pub fn new(config: RateLimitConfig, trust_proxy: bool) -> Self {
        // burst_size requests immediately, then refill at per_second
        let per_second = NonZeroU32::new(config.per_second).unwrap_or(NonZeroU32::MIN);
        let burst = NonZeroU32::new(config.burst_size).unwrap_or(NonZeroU32::MIN);
        let quota = Quota::per_second(per_second).allow_burst(burst);

        Self {
            limiter: Arc::new(RateLimiter::keyed(quota)),
            config,
            trust_proxy,
            clock: DefaultClock::default(),
        }
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Check whether a request from `client` may proceed
    ///
    /// On rejection, returns how long the client should wait.
    pub fn check(&self, client: IpAddr) -> Result<(), Duration> {
        self.limiter
            .check_key(&client)
            .map_err(|not_until| not_until.wait_time_from(self.clock.now()))
    }

    /// Forget clients whose buckets have fully refilled
    pub fn evict_idle(&self) {
        self.limiter.retain_recent();
        self.limiter.shrink_to_fit();
    }

    pub fn tracked_clients_count(&self) -> usize {
        self.limiter.len()
    }
}

/// Background task that periodically drops idle client buckets
pub async fn eviction_task(limiter: PerIpRateLimiter, interval: Duration) {
    loop {
        tokio::time::sleep(interval).await;

        let before = limiter.tracked_clients_count();
        limiter.evict_idle();
        tracing::debug!(
            before,
            after = limiter.tracked_clients_count(),
            "Evicted idle rate limit buckets"
        );
    }
}

/// Middleware enforcing per-IP limits
///
/// Clients without a discoverable address share one bucket.
pub async fn rate_limit_middleware(
    State(limiter): State<PerIpRateLimiter>,
    request: Request,
    next: Next,
) -> Response {
    let client = extract_client_ip(&request, limiter.trust_proxy).unwrap_or(UNKNOWN_CLIENT);

    match limiter.check(client) {
        Ok(()) => next.run(request).await,
        Err(wait) => {
            tracing::warn!(
                client_ip = %client,
                path = %request.uri().path(),
                retry_after_secs = wait.as_secs().max(1),
                "Rate limit exceeded"
            );
            TtsError::RateLimited(wait).into_response()
        }
    }
}
