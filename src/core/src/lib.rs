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

//! Platform SDK helpers.
//!
//! This crate contains the types shared by the platform SDK libraries: the
//! error model, the retry executor and its backoff policies, the call context
//! used for deadlines and cancellation, and the request pipeline that applies
//! an [Authenticate] implementation to every outbound request.
//!
//! [Authenticate]: crate::authenticate::Authenticate

/// An alias of [std::result::Result] where the error is always [crate::error::Error].
///
/// This is the result type used by all functions wrapping HTTP requests.
pub type Result<T> = std::result::Result<T, crate::error::Error>;

/// The core error types.
pub mod error;

/// The seam between the request pipeline and the authentication libraries.
pub mod authenticate;

pub mod backoff_policy;
pub mod call_context;
pub mod exponential_backoff;
pub mod options;
pub mod response;
pub mod retry_executor;

/// The request pipeline: default headers, authentication, retries, and
/// response classification.
pub mod http_client;

/// Parses `Retry-After` response headers.
pub(crate) mod retry_after;
