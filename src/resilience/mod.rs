//! Resilience layer: per-dependency circuit breakers plus a coalescing
//! read-through cache with retry and an ordered failover chain.

mod circuit;
mod guard;

pub use circuit::{CircuitBreaker, CircuitSnapshot, CircuitState};
pub use guard::{Fetched, Guarded};
