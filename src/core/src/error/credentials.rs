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

use super::HttpError;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter, Result};
use std::sync::Arc;

/// Represents an error obtaining or applying credentials.
///
/// Authenticators may fail to fetch a token from a token endpoint, either
/// because the endpoint rejected the request or because the transport failed.
/// These errors are reported with this type. When the token endpoint returned
/// a non-2xx response the [source][std::error::Error::source] is an
/// [HttpError] carrying the status code, headers, and payload.
///
/// Applications rarely need to create instances of this error type. The
/// exception might be when testing application code, where the application is
/// mocking an authenticator.
///
/// # Example
/// ```
/// # use platform_sdk_core::error::CredentialsError;
/// let err = CredentialsError::from_msg(
///     true, "simulated retryable error while trying to fetch a token");
/// assert!(err.is_transient());
/// assert!(format!("{err}").contains("simulated retryable error"));
/// ```
#[derive(Clone, Debug)]
pub struct CredentialsError {
    /// If `true`, the operation that resulted in this error might succeed
    /// upon retry.
    is_transient: bool,

    message: Option<String>,

    source: Option<Arc<dyn Error + Send + Sync>>,
}

impl CredentialsError {
    /// Creates a new `CredentialsError` with a message and a source.
    ///
    /// # Arguments
    /// * `is_transient` - whether the error is transient.
    /// * `message` - a description of the failure.
    /// * `source` - the underlying error that caused the failure.
    pub fn new<M, T>(is_transient: bool, message: M, source: T) -> Self
    where
        M: Into<String>,
        T: Error + Send + Sync + 'static,
    {
        CredentialsError {
            is_transient,
            message: Some(message.into()),
            source: Some(Arc::new(source)),
        }
    }

    /// Creates a new `CredentialsError` from a message.
    ///
    /// # Example
    /// ```
    /// # use platform_sdk_core::error::CredentialsError;
    /// let err = CredentialsError::from_msg(false, "simulated permanent error");
    /// assert!(!err.is_transient());
    /// ```
    pub fn from_msg<M: Into<String>>(is_transient: bool, message: M) -> Self {
        CredentialsError {
            is_transient,
            message: Some(message.into()),
            source: None,
        }
    }

    /// Creates a new `CredentialsError` from a source error.
    ///
    /// The message is the `Display` format of the source.
    pub fn from_source<T: Error + Send + Sync + 'static>(is_transient: bool, source: T) -> Self {
        CredentialsError {
            is_transient,
            message: None,
            source: Some(Arc::new(source)),
        }
    }

    /// Creates a new `CredentialsError` for a non-2xx token endpoint response.
    ///
    /// The message is extracted from the payload, see [HttpError::message].
    /// Responses with status 408, 429, 500, or 503 are transient.
    pub fn from_http_error(error: HttpError) -> Self {
        let is_transient = matches!(error.status_code(), 408 | 429 | 500 | 503);
        CredentialsError {
            is_transient,
            message: Some(error.message()),
            source: Some(Arc::new(error)),
        }
    }

    /// Returns `true` if the error is transient; otherwise returns `false`.
    pub fn is_transient(&self) -> bool {
        self.is_transient
    }

    /// The [HttpError] reported by the token endpoint, if any.
    ///
    /// # Example
    /// ```
    /// # use platform_sdk_core::error::{CredentialsError, HttpError};
    /// let err = CredentialsError::from_http_error(
    ///     HttpError::new(400, http::HeaderMap::new(), Some(r#"{"message":"bad apikey"}"#.into())));
    /// assert_eq!(err.http_error().map(|e| e.status_code()), Some(400));
    /// assert!(format!("{err}").contains("bad apikey"));
    /// ```
    pub fn http_error(&self) -> Option<&HttpError> {
        self.source
            .as_ref()
            .and_then(|s| s.downcast_ref::<HttpError>())
    }
}

impl std::error::Error for CredentialsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|arc| arc.as_ref() as &(dyn std::error::Error + 'static))
    }
}

const TRANSIENT_MSG: &str = "but future attempts may succeed";
const PERMANENT_MSG: &str = "and future attempts will not succeed";

impl Display for CredentialsError {
    /// Formats the error message to include retryability and source.
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        let msg = if self.is_transient {
            TRANSIENT_MSG
        } else {
            PERMANENT_MSG
        };
        match (&self.message, &self.source) {
            (Some(message), _) => write!(f, "{message} {msg}"),
            (None, Some(source)) => write!(f, "{source} {msg}"),
            (None, None) => write!(f, "cannot obtain credentials {msg}"),
        }
    }
}
