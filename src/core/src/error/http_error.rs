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

use bytes::Bytes;
use http::{HeaderMap, StatusCode};
use serde_json::Value;

/// The message reported when a JSON error payload has no recognized field.
pub const UNKNOWN_ERROR_MESSAGE: &str = "unknown error";

/// An error describing a non-2xx HTTP response.
///
/// Both the request pipeline and the token endpoints report unsuccessful
/// responses with this type. It preserves the status code, the response
/// headers, and the raw payload, so callers can inspect all of them.
#[derive(Debug, Default, Clone)]
pub struct HttpError {
    status_code: u16,
    headers: HeaderMap,
    payload: Option<Bytes>,
}

impl HttpError {
    /// Creates a new [HttpError] with the given status code, headers, and payload.
    ///
    /// # Example
    /// ```
    /// # use platform_sdk_core::error::HttpError;
    /// let error = HttpError::new(404, http::HeaderMap::new(), Some("not here".into()));
    /// assert_eq!(error.status_code(), 404);
    /// assert_eq!(error.message(), "not here");
    /// ```
    pub fn new(status_code: u16, headers: HeaderMap, payload: Option<Bytes>) -> Self {
        Self {
            status_code,
            headers,
            payload,
        }
    }

    /// Returns the status code associated with the HTTP error response.
    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    /// Returns a reference to the headers associated with the HTTP error
    /// response.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns a reference to the payload associated with the HTTP error
    /// response.
    pub fn payload(&self) -> Option<&Bytes> {
        self.payload.as_ref()
    }

    /// Returns a human readable message describing the error.
    ///
    /// Payloads that are not JSON objects are returned verbatim. For JSON
    /// objects the first field found, in order, among `error`, `message`,
    /// `errors[0].message`, and `errorMessage` is the message. JSON objects
    /// without any of these fields produce [UNKNOWN_ERROR_MESSAGE]. An empty
    /// payload produces the canonical reason for the status code.
    pub fn message(&self) -> String {
        match self.payload.as_ref() {
            Some(p) if !p.is_empty() => extract_error_message(p),
            _ => StatusCode::from_u16(self.status_code)
                .ok()
                .and_then(|s| s.canonical_reason())
                .unwrap_or(UNKNOWN_ERROR_MESSAGE)
                .to_string(),
        }
    }
}

/// Extracts the error message from an error response body.
///
/// See [HttpError::message] for the rules.
pub fn extract_error_message(body: &[u8]) -> String {
    match serde_json::from_slice::<Value>(body) {
        Ok(v @ Value::Object(_)) => {
            message_from_json(&v).unwrap_or_else(|| UNKNOWN_ERROR_MESSAGE.to_string())
        }
        _ => String::from_utf8_lossy(body).into_owned(),
    }
}

fn message_from_json(v: &Value) -> Option<String> {
    ["/error", "/message", "/errors/0/message", "/errorMessage"]
        .into_iter()
        .find_map(|p| v.pointer(p).and_then(Value::as_str))
        .map(str::to_string)
}

impl std::fmt::Display for HttpError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "HTTP error: code={}, message={}",
            self.status_code,
            self.message()
        )
    }
}

impl std::error::Error for HttpError {}
