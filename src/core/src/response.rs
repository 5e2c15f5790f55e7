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

//! Response types.
//!
//! The request pipeline returns the decoded body together with the response
//! status and headers. Most applications only need the body.
//!
//! # Example
//! ```
//! # use platform_sdk_core::response::Response;
//! let response = Response::from("abc123".to_string());
//! assert_eq!(response.status(), http::StatusCode::OK);
//! assert_eq!(response.into_body(), "abc123");
//! ```

use http::{HeaderMap, StatusCode};

/// A successful response: the body and the response metadata.
#[derive(Clone, Debug)]
pub struct Response<T> {
    parts: Parts,
    body: T,
}

impl<T> Response<T> {
    /// Creates a response with the given body and default metadata.
    pub fn from(body: T) -> Self {
        Self {
            body,
            parts: Parts::default(),
        }
    }

    pub fn from_parts(parts: Parts, body: T) -> Self {
        Self { parts, body }
    }

    pub fn status(&self) -> StatusCode {
        self.parts.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.parts.headers
    }

    pub fn body(&self) -> &T {
        &self.body
    }

    pub fn into_parts(self) -> (Parts, T) {
        (self.parts, self.body)
    }

    pub fn into_body(self) -> T {
        self.body
    }
}

/// The response status and headers.
#[derive(Clone, Debug, Default)]
#[non_exhaustive]
pub struct Parts {
    pub status: StatusCode,
    pub headers: HeaderMap,
}

impl Parts {
    pub fn new() -> Self {
        Parts::default()
    }

    pub fn set_status<V: Into<StatusCode>>(mut self, v: V) -> Self {
        self.status = v.into();
        self
    }

    pub fn set_headers<V: Into<HeaderMap>>(mut self, v: V) -> Self {
        self.headers = v.into();
        self
    }
}
