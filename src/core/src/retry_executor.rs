// Copyright 2025 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Retries a single HTTP call.
//!
//! The [RetryExecutor] calls an inner function until it succeeds, fails with
//! a non-retryable outcome, or runs out of attempts. The outcome of each
//! attempt is classified as follows:
//!
//! - Transport failures are retryable, unless the [CallContext] is cancelled
//!   or past its deadline.
//! - Responses with status 429 or 503 are retryable. The `Retry-After`
//!   header, if present, is used as the delay before the next attempt.
//! - Responses with any other 5xx status, except 501 and 505, are retryable.
//! - Everything else is returned to the caller.
//!
//! When the attempts are exhausted the outcome of the last attempt is
//! returned unchanged. Each attempt, and each delay between attempts, is
//! raced against the call context.

use crate::Result;
use crate::backoff_policy::{BackoffPolicy, BackoffPolicyArg};
use crate::call_context::CallContext;
use crate::exponential_backoff::{DEFAULT_MAXIMUM_DELAY, ExponentialBackoff};
use crate::retry_after;
use http::{HeaderMap, StatusCode};
use std::sync::Arc;
use std::time::Duration;

/// The default number of retries.
pub const DEFAULT_MAX_RETRIES: u32 = 4;

/// The parts of an HTTP response used to decide if a request is retried.
pub trait RetryableResponse {
    fn status(&self) -> StatusCode;
    fn headers(&self) -> &HeaderMap;
}

impl RetryableResponse for reqwest::Response {
    fn status(&self) -> StatusCode {
        reqwest::Response::status(self)
    }
    fn headers(&self) -> &HeaderMap {
        reqwest::Response::headers(self)
    }
}

impl<B> RetryableResponse for http::Response<B> {
    fn status(&self) -> StatusCode {
        http::Response::status(self)
    }
    fn headers(&self) -> &HeaderMap {
        http::Response::headers(self)
    }
}

/// Runs the retry loop around a single HTTP call.
///
/// # Example
/// ```
/// # use platform_sdk_core::retry_executor::RetryExecutor;
/// # use platform_sdk_core::call_context::CallContext;
/// use std::time::Duration;
/// # tokio_test::block_on(async {
/// let executor = RetryExecutor::new()
///     .with_max_retries(2)
///     .with_max_retry_interval(Duration::from_secs(5));
/// let ctx = CallContext::new();
/// let response = executor
///     .invoke(&ctx, async |_timeout| {
///         Ok(http::Response::builder().status(200).body("ok").unwrap())
///     })
///     .await?;
/// assert_eq!(response.status(), 200);
/// # platform_sdk_core::Result::<()>::Ok(()) });
/// ```
#[derive(Clone, Debug)]
pub struct RetryExecutor {
    max_retries: u32,
    max_retry_interval: Duration,
    backoff_policy: Arc<dyn BackoffPolicy>,
}

impl RetryExecutor {
    /// Creates an executor with the default configuration.
    ///
    /// The defaults are 4 retries, a 30 second maximum retry interval, and
    /// [ExponentialBackoff] with its default parameters.
    pub fn new() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            max_retry_interval: DEFAULT_MAXIMUM_DELAY,
            backoff_policy: Arc::new(ExponentialBackoff::default()),
        }
    }

    /// Sets the maximum number of retries.
    ///
    /// With `0` each call is attempted exactly once.
    pub fn with_max_retries(mut self, v: u32) -> Self {
        self.max_retries = v;
        self
    }

    /// Sets the maximum delay between two attempts.
    ///
    /// This also caps the delays requested by `Retry-After` headers.
    pub fn with_max_retry_interval(mut self, v: Duration) -> Self {
        self.max_retry_interval = v;
        self
    }

    /// Sets the backoff policy used when the server provides no hint.
    pub fn with_backoff_policy<V: Into<BackoffPolicyArg>>(mut self, v: V) -> Self {
        self.backoff_policy = v.into().into();
        self
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn max_retry_interval(&self) -> Duration {
        self.max_retry_interval
    }

    /// Calls `inner` until it returns a final outcome.
    ///
    /// `inner` receives the time remaining before the deadline in `ctx`, if
    /// any, and should use it as the timeout for the attempt.
    pub async fn invoke<F, R>(&self, ctx: &CallContext, inner: F) -> Result<R>
    where
        F: AsyncFnMut(Option<Duration>) -> Result<R> + Send,
        R: RetryableResponse,
    {
        self.invoke_with_sleep(ctx, inner, async |d| tokio::time::sleep(d).await)
            .await
    }

    pub(crate) async fn invoke_with_sleep<F, S, R>(
        &self,
        ctx: &CallContext,
        mut inner: F,
        sleep: S,
    ) -> Result<R>
    where
        F: AsyncFnMut(Option<Duration>) -> Result<R> + Send,
        S: AsyncFn(Duration) + Send,
        R: RetryableResponse,
    {
        let loop_start = tokio::time::Instant::now().into_std();
        let mut attempt_count = 0_u32;
        loop {
            ctx.check()?;
            attempt_count += 1;
            let result = tokio::select! {
                biased;
                e = ctx.done() => return Err(e),
                r = inner(ctx.remaining_time()) => r,
            };
            let retry = match &result {
                Ok(response) => retryable_status(response.status(), response.headers())
                    .map(|hint| (hint, format!("status {}", response.status()))),
                Err(e) if e.is_transport() || e.is_timeout() => {
                    // The attempt may have failed because the call deadline
                    // expired, report that instead of the transport error.
                    ctx.check()?;
                    Some((None, e.to_string()))
                }
                Err(_) => None,
            };
            let Some((hint, reason)) = retry else {
                return result;
            };
            if attempt_count > self.max_retries {
                tracing::debug!(
                    attempt = attempt_count,
                    reason = %reason,
                    "retry attempts exhausted"
                );
                return result;
            }
            let delay = hint
                .unwrap_or_else(|| self.backoff_policy.on_failure(loop_start, attempt_count))
                .min(self.max_retry_interval);
            tracing::debug!(
                attempt = attempt_count,
                delay = ?delay,
                reason = %reason,
                "retrying request"
            );
            drop(result);
            tokio::select! {
                biased;
                e = ctx.done() => return Err(e),
                _ = sleep(delay) => {},
            }
        }
    }
}

impl Default for RetryExecutor {
    fn default() -> Self {
        Self::new()
    }
}

/// Returns `Some(hint)` when a response with `status` should be retried.
///
/// The hint is the delay requested by the server, if any.
fn retryable_status(status: StatusCode, headers: &HeaderMap) -> Option<Option<Duration>> {
    match status.as_u16() {
        429 | 503 => Some(retry_after::from_headers(headers)),
        501 | 505 => None,
        500..=599 => Some(None),
        _ => None,
    }
}
