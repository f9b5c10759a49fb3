use crate::config::ResilienceConfig;
use crate::error::{FailoverTier, ProviderError, ProviderResult, RouteError};
use crate::models::route::ResultQuality;
use crate::resilience::circuit::{CircuitBreaker, CircuitSnapshot};
use moka::future::Cache;
use rand::RngExt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// A provider value plus where it came from. Anything other than
/// `ResultQuality::Fresh` means a failover tier answered.
#[derive(Debug, Clone)]
pub struct Fetched<T> {
    pub value: T,
    pub quality: ResultQuality,
}

/// Resilience wrapper around one external dependency: a coalescing
/// read-through cache, retry with exponential backoff, a circuit breaker,
/// and the ordered failover chain (last-known-good -> alternate source ->
/// degraded default).
///
/// Coalescing comes from moka's `try_get_with`: concurrent callers sharing
/// a cache key attach to the single in-flight init future, so exactly one
/// upstream call is issued and its result (or error) is broadcast to all
/// waiters.
pub struct Guarded<T: Clone + Send + Sync + 'static> {
    name: &'static str,
    breaker: Arc<CircuitBreaker>,
    fresh: Cache<String, T>,
    /// Last-known-good values, kept far longer than the fresh TTL; first
    /// failover tier when upstream is down.
    stale: Cache<String, T>,
    config: ResilienceConfig,
}

impl<T: Clone + Send + Sync + 'static> Guarded<T> {
    pub fn new(name: &'static str, config: ResilienceConfig) -> Self {
        let fresh = Cache::builder()
            .time_to_live(config.fresh_ttl)
            .max_capacity(config.cache_max_entries)
            .build();
        let stale = Cache::builder()
            .time_to_live(config.stale_ttl)
            .max_capacity(config.cache_max_entries)
            .build();
        let breaker = Arc::new(CircuitBreaker::new(
            name,
            config.failure_threshold,
            config.reset_timeout,
            config.half_open_probes,
        ));
        Guarded {
            name,
            breaker,
            fresh,
            stale,
            config,
        }
    }

    pub fn circuit_snapshot(&self) -> CircuitSnapshot {
        self.breaker.snapshot()
    }

    /// Fetch through the full resilience stack without an alternate source.
    pub async fn call<F, Fut>(
        &self,
        key: String,
        fetch: F,
        degraded: Option<T>,
    ) -> Result<Fetched<T>, RouteError>
    where
        F: Fn() -> Fut + Send + Sync,
        Fut: Future<Output = ProviderResult<T>> + Send,
    {
        self.call_inner(key, fetch, None::<fn() -> Fut>, degraded)
            .await
    }

    /// Fetch with an alternate data source tried after the stale cache.
    pub async fn call_with_alternate<F, Fut, A, AFut>(
        &self,
        key: String,
        fetch: F,
        alternate: A,
        degraded: Option<T>,
    ) -> Result<Fetched<T>, RouteError>
    where
        F: Fn() -> Fut + Send + Sync,
        Fut: Future<Output = ProviderResult<T>> + Send,
        A: Fn() -> AFut + Send + Sync,
        AFut: Future<Output = ProviderResult<T>> + Send,
    {
        self.call_inner(key, fetch, Some(alternate), degraded).await
    }

    async fn call_inner<F, Fut, A, AFut>(
        &self,
        key: String,
        fetch: F,
        alternate: Option<A>,
        degraded: Option<T>,
    ) -> Result<Fetched<T>, RouteError>
    where
        F: Fn() -> Fut + Send + Sync,
        Fut: Future<Output = ProviderResult<T>> + Send,
        A: Fn() -> AFut + Send + Sync,
        AFut: Future<Output = ProviderResult<T>> + Send,
    {
        let primary = self
            .fresh
            .try_get_with(key.clone(), async {
                let value = self.fetch_with_retries(&fetch).await?;
                self.stale.insert(key.clone(), value.clone()).await;
                Ok::<T, ProviderError>(value)
            })
            .await;

        let primary_err: Arc<ProviderError> = match primary {
            Ok(value) => {
                return Ok(Fetched {
                    value,
                    quality: ResultQuality::Fresh,
                })
            }
            Err(e) => e,
        };

        // Failover chain. Terminal but non-fatal: the tier that answered is
        // reported through the quality flag, never swallowed.
        tracing::warn!(
            dependency = self.name,
            error = %primary_err,
            "Primary fetch failed, entering failover chain"
        );

        if let Some(value) = self.stale.get(&key).await {
            tracing::info!(dependency = self.name, "Serving last-known-good value");
            return Ok(Fetched {
                value,
                quality: ResultQuality::Cached,
            });
        }

        if let Some(alternate) = alternate {
            match alternate().await {
                Ok(value) => {
                    tracing::info!(dependency = self.name, "Serving alternate-source value");
                    return Ok(Fetched {
                        value,
                        quality: ResultQuality::Fallback,
                    });
                }
                Err(e) => {
                    tracing::warn!(
                        dependency = self.name,
                        error = %e,
                        "Alternate source also failed"
                    );
                }
            }
        }

        if let Some(value) = degraded {
            tracing::warn!(dependency = self.name, "Serving degraded default value");
            return Ok(Fetched {
                value,
                quality: ResultQuality::Degraded,
            });
        }

        // A rate limit that survived the whole chain is reported as such,
        // not folded into a generic outage.
        match &*primary_err {
            ProviderError::RateLimited => Err(RouteError::RateLimited(self.name.to_string())),
            _ => Err(RouteError::ProviderUnavailable {
                dependency: self.name.to_string(),
                attempted: FailoverTier::DegradedDefault,
            }),
        }
    }

    /// One logical fetch: breaker gate, then up to `max_retries` retries with
    /// exponential backoff and jitter. Each failed upstream attempt counts
    /// against the breaker.
    async fn fetch_with_retries<F, Fut>(&self, fetch: &F) -> ProviderResult<T>
    where
        F: Fn() -> Fut + Send + Sync,
        Fut: Future<Output = ProviderResult<T>> + Send,
    {
        let mut attempt: u32 = 0;
        loop {
            if !self.breaker.can_request() {
                tracing::debug!(dependency = self.name, "Circuit open, short-circuiting");
                return Err(ProviderError::CircuitOpen);
            }

            match fetch().await {
                Ok(value) => {
                    self.breaker.record_success();
                    return Ok(value);
                }
                Err(e) => {
                    self.breaker.record_failure();
                    if !e.is_transient() || attempt >= self.config.max_retries {
                        return Err(e);
                    }
                    let delay = self.backoff_delay(attempt);
                    tracing::debug!(
                        dependency = self.name,
                        attempt = attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Retrying provider call"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }

    fn backoff_delay(&self, attempt: u32) -> Duration {
        let base = self.config.backoff_base.as_millis() as u64;
        let exp = base.saturating_mul(1u64 << attempt.min(16));
        let jitter = rand::rng().random_range(0..=base / 2 + 1);
        Duration::from_millis(exp + jitter)
    }
}
