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

//! The delay between attempts of a retried request.
//!
//! The [RetryExecutor] consults the backoff policy after each retryable
//! failure, unless the response carries a `Retry-After` header. The server
//! hint always wins. Whatever the source, the delay is capped at the
//! executor's maximum retry interval.
//!
//! The default policy is [ExponentialBackoff]. Applications can install their
//! own policy with [ClientConfig::with_backoff_policy].
//!
//! # Example
//! ```
//! # use platform_sdk_core::backoff_policy::BackoffPolicy;
//! # use platform_sdk_core::options::ClientConfig;
//! use std::time::{Duration, Instant};
//!
//! // Waits 250ms after the first failure, 500ms after the second, and so on.
//! #[derive(Debug)]
//! struct Linear;
//! impl BackoffPolicy for Linear {
//!     fn on_failure(&self, _loop_start: Instant, attempt_count: u32) -> Duration {
//!         Duration::from_millis(250) * attempt_count
//!     }
//! }
//!
//! let config = ClientConfig::new("https://api.example.com")
//!     .with_max_retries(3)
//!     .with_max_retry_interval(Duration::from_secs(1))
//!     .with_backoff_policy(Linear);
//! ```
//!
//! [RetryExecutor]: crate::retry_executor::RetryExecutor
//! [ExponentialBackoff]: crate::exponential_backoff::ExponentialBackoff
//! [ClientConfig::with_backoff_policy]: crate::options::ClientConfig::with_backoff_policy

use std::sync::Arc;
use std::time::{Duration, Instant};

/// Computes the delay before the next attempt.
pub trait BackoffPolicy: Send + Sync + std::fmt::Debug {
    /// Returns the delay after the failure of attempt number `attempt_count`.
    ///
    /// Called only for retryable failures without a `Retry-After` hint, so
    /// `attempt_count` starts at 1. `loop_start` is when the first attempt
    /// started.
    fn on_failure(&self, loop_start: Instant, attempt_count: u32) -> Duration;
}

/// Holds the backoff policy of a [ClientConfig][crate::options::ClientConfig].
#[derive(Clone, Debug)]
pub struct BackoffPolicyArg(pub(crate) Arc<dyn BackoffPolicy>);

impl<T: BackoffPolicy + 'static> From<T> for BackoffPolicyArg {
    fn from(value: T) -> Self {
        Self(Arc::new(value))
    }
}

impl From<Arc<dyn BackoffPolicy>> for BackoffPolicyArg {
    fn from(value: Arc<dyn BackoffPolicy>) -> Self {
        Self(value)
    }
}

impl From<BackoffPolicyArg> for Arc<dyn BackoffPolicy> {
    fn from(value: BackoffPolicyArg) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::call_context::CallContext;
    use crate::retry_executor::RetryExecutor;
    use http::StatusCode;
    use http::header::RETRY_AFTER;
    use std::sync::Mutex;

    #[derive(Debug, Default)]
    struct Recording {
        attempts: Mutex<Vec<u32>>,
    }

    impl BackoffPolicy for Arc<Recording> {
        fn on_failure(&self, _loop_start: Instant, attempt_count: u32) -> Duration {
            self.attempts
                .lock()
                .expect("test mutex is never poisoned")
                .push(attempt_count);
            Duration::from_secs(attempt_count as u64 * 10)
        }
    }

    fn response(code: u16, retry_after: Option<&'static str>) -> crate::Result<http::Response<()>> {
        let builder = http::Response::builder().status(code);
        let builder = retry_after
            .into_iter()
            .fold(builder, |b, v| b.header(RETRY_AFTER, v));
        Ok(builder.body(()).expect("hard-coded test response is valid"))
    }

    #[test]
    fn arg_conversions() {
        let policy: Arc<dyn BackoffPolicy> = Arc::new(Arc::new(Recording::default()));
        let arg = BackoffPolicyArg::from(policy.clone());
        let back: Arc<dyn BackoffPolicy> = arg.into();
        assert!(Arc::ptr_eq(&policy, &back));

        let arg = BackoffPolicyArg::from(Arc::new(Recording::default()));
        assert!(format!("{arg:?}").contains("Recording"), "{arg:?}");
    }

    #[tokio::test]
    async fn consulted_without_hint_and_capped() -> anyhow::Result<()> {
        let recording = Arc::new(Recording::default());
        let executor = RetryExecutor::new()
            .with_max_retries(3)
            .with_max_retry_interval(Duration::from_secs(15))
            .with_backoff_policy(recording.clone());

        let mut codes = vec![
            response(200, None),
            response(500, None),
            response(503, Some("2")),
            response(502, None),
        ];
        let delays = Mutex::new(Vec::new());
        let got = executor
            .invoke_with_sleep(
                &CallContext::new(),
                async |_| codes.pop().expect("at most four attempts"),
                async |d| delays.lock().expect("test mutex is never poisoned").push(d),
            )
            .await?;
        assert_eq!(got.status(), StatusCode::OK);

        // The `Retry-After` hint replaces the policy on the second attempt.
        assert_eq!(
            *recording.attempts.lock().expect("test mutex is never poisoned"),
            vec![1, 3]
        );
        assert_eq!(
            *delays.lock().expect("test mutex is never poisoned"),
            vec![
                Duration::from_secs(10),
                Duration::from_secs(2),
                Duration::from_secs(15),
            ]
        );
        Ok(())
    }
}
