//! Resilience primitives
//!
//! Bounded retry with a pluggable error policy and backoff strategy.

pub mod retry;

pub use retry::{
    BackoffStrategy, RetryConfig, RetryDecision, RetryError, RetryExecutor, RetryPolicy,
    RetryResult,
};
