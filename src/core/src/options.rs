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

//! Client configuration.
//!
//! Applications configure the request pipeline with a [ClientConfig]. The
//! configuration is consumed when the [ReqwestClient] is created and treated
//! as read-only afterwards.
//!
//! [ReqwestClient]: crate::http_client::ReqwestClient

use crate::backoff_policy::BackoffPolicyArg;
use crate::exponential_backoff::DEFAULT_MAXIMUM_DELAY;
use http::HeaderMap;
use std::time::Duration;

/// Configuration for the request pipeline.
///
/// # Example
/// ```
/// # use platform_sdk_core::options::ClientConfig;
/// use std::time::Duration;
/// let config = ClientConfig::new("https://api.example.com")
///     .with_timeout(Duration::from_secs(60))
///     .with_max_retries(3)
///     .with_max_retry_interval(Duration::from_secs(20));
/// assert_eq!(config.max_retries(), 3);
/// ```
#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub(crate) endpoint: String,
    pub(crate) default_headers: HeaderMap,
    pub(crate) timeout: Option<Duration>,
    pub(crate) disable_ssl_verification: bool,
    pub(crate) max_retries: u32,
    pub(crate) max_retry_interval: Duration,
    pub(crate) backoff_policy: Option<BackoffPolicyArg>,
}

impl ClientConfig {
    /// Creates a configuration for the given service endpoint.
    ///
    /// Retries are disabled by default, use [with_max_retries] to enable
    /// them.
    ///
    /// [with_max_retries]: ClientConfig::with_max_retries
    pub fn new<V: Into<String>>(endpoint: V) -> Self {
        Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            default_headers: HeaderMap::new(),
            timeout: None,
            disable_ssl_verification: false,
            max_retries: 0,
            max_retry_interval: DEFAULT_MAXIMUM_DELAY,
            backoff_policy: None,
        }
    }

    /// Headers added to every request, unless the request already sets them.
    pub fn with_default_headers(mut self, v: HeaderMap) -> Self {
        self.default_headers = v;
        self
    }

    /// The timeout for each attempt.
    pub fn with_timeout(mut self, v: Duration) -> Self {
        self.timeout = Some(v);
        self
    }

    /// Disables TLS certificate verification.
    ///
    /// Only use this in test environments.
    pub fn with_disable_ssl_verification(mut self, v: bool) -> Self {
        self.disable_ssl_verification = v;
        self
    }

    /// The maximum number of retries, `0` disables retries.
    pub fn with_max_retries(mut self, v: u32) -> Self {
        self.max_retries = v;
        self
    }

    /// The maximum delay between two attempts.
    ///
    /// Zero values are ignored. The default is 30 seconds.
    pub fn with_max_retry_interval(mut self, v: Duration) -> Self {
        if !v.is_zero() {
            self.max_retry_interval = v;
        }
        self
    }

    /// The backoff policy used when the server does not send `Retry-After`.
    pub fn with_backoff_policy<V: Into<BackoffPolicyArg>>(mut self, v: V) -> Self {
        self.backoff_policy = Some(v.into());
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn default_headers(&self) -> &HeaderMap {
        &self.default_headers
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn disable_ssl_verification(&self) -> bool {
        self.disable_ssl_verification
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn max_retry_interval(&self) -> Duration {
        self.max_retry_interval
    }
}
