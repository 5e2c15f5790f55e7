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

//! Deadlines and cancellation for a single call.
//!
//! Every request executed by the pipeline receives a [CallContext]. The
//! context carries an optional deadline and a cancellation token. The retry
//! executor races each attempt, and each backoff sleep, against the context,
//! so a cancelled call returns promptly even while waiting to retry.
//!
//! # Example
//! ```
//! # use platform_sdk_core::call_context::CallContext;
//! use std::time::Duration;
//! # tokio_test::block_on(async {
//! let ctx = CallContext::new().with_timeout(Duration::from_secs(10));
//! assert!(ctx.check().is_ok());
//! ctx.cancel();
//! assert!(ctx.check().is_err_and(|e| e.is_cancelled()));
//! # });
//! ```

use crate::Result;
use crate::error::Error;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// The cancellation token and deadline for a call.
///
/// Clones share the cancellation token, cancelling any clone cancels all of
/// them.
#[derive(Clone, Debug, Default)]
pub struct CallContext {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl CallContext {
    /// Creates a context without a deadline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the deadline to `timeout` from now.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Sets the deadline.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Replaces the cancellation token, typically with a child of a token
    /// owned by the application.
    pub fn with_cancellation_token(mut self, token: CancellationToken) -> Self {
        self.token = token;
        self
    }

    /// Cancels the call.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// The time left before the deadline, `None` if there is no deadline.
    ///
    /// Returns [Duration::ZERO] once the deadline has passed.
    pub fn remaining_time(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    /// Returns an error if the call is cancelled or past its deadline.
    pub fn check(&self) -> Result<()> {
        if self.token.is_cancelled() {
            return Err(cancelled_error());
        }
        match self.deadline {
            Some(d) if Instant::now() >= d => Err(deadline_error()),
            _ => Ok(()),
        }
    }

    /// Completes when the call is cancelled or reaches its deadline.
    ///
    /// The returned error describes which of the two happened. Without a
    /// deadline this only completes on cancellation.
    pub async fn done(&self) -> Error {
        let deadline = async {
            match self.deadline {
                Some(d) => tokio::time::sleep_until(d).await,
                None => std::future::pending::<()>().await,
            }
        };
        tokio::select! {
            biased;
            _ = self.token.cancelled() => cancelled_error(),
            _ = deadline => deadline_error(),
        }
    }
}

fn cancelled_error() -> Error {
    Error::cancelled("the call context was cancelled")
}

fn deadline_error() -> Error {
    Error::timeout("the call context deadline expired")
}
