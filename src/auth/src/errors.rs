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

//! Errors created when fetching or applying credentials.

use http::StatusCode;
use std::error::Error;

pub use sdk_core::error::CredentialsError;
pub use sdk_core::error::HttpError;

/// Returns `true` if a token endpoint response with this status may succeed
/// when retried.
pub(crate) fn is_transient(c: StatusCode) -> bool {
    match c {
        // Internal server errors do not indicate that there is anything wrong
        // with our request, so we retry them.
        StatusCode::INTERNAL_SERVER_ERROR
        | StatusCode::SERVICE_UNAVAILABLE
        | StatusCode::REQUEST_TIMEOUT
        | StatusCode::TOO_MANY_REQUESTS => true,
        _ => false,
    }
}

/// A helper to create a transient error.
pub(crate) fn transient<T: Error + Send + Sync + 'static>(source: T) -> CredentialsError {
    CredentialsError::from_source(true, source)
}

/// A helper to create a non-transient error.
pub(crate) fn non_transient<T: Error + Send + Sync + 'static>(source: T) -> CredentialsError {
    CredentialsError::from_source(false, source)
}

pub(crate) fn non_transient_from_str<T: Into<String>>(message: T) -> CredentialsError {
    CredentialsError::from_msg(false, message)
}

/// Maps errors sending a request to a token endpoint.
pub(crate) fn from_send_error(e: reqwest::Error) -> CredentialsError {
    CredentialsError::new(
        !e.is_builder(),
        format!("failed to send the token request: {e}"),
        e,
    )
}
