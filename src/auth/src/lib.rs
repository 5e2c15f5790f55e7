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

//! Platform SDK for Rust - Authentication Components
//!
//! This crate contains the authenticators used by the platform SDK clients.
//! An [Authenticator] adds credentials to outbound requests. Some
//! authenticators use static credentials (basic authentication, a fixed bearer
//! token, or no credentials at all). Others exchange a secret for a
//! short-lived access token, and cache that token until it needs to be
//! refreshed:
//!
//! - [api_key]: exchanges an API key at the IAM token endpoint.
//! - [assume]: uses an API key token to assume the identity of a trusted
//!   profile.
//! - [instance_metadata]: uses the identity of the compute instance running
//!   the application.
//! - [container]: exchanges a compute resource token read from a file.
//! - [session]: exchanges a username and password (or API key) with a
//!   session endpoint.
//!
//! Cached tokens are refreshed in the background when they approach their
//! expiration time, and synchronously once they expire. At most one refresh
//! per authenticator is in flight at any time.
//!
//! # Example
//! ```
//! # use platform_sdk_auth::credentials::bearer;
//! # use sdk_core::authenticate::Authenticate;
//! # tokio_test::block_on(async {
//! let authenticator = bearer::Builder::new("my-token").build()?;
//! let mut headers = http::HeaderMap::new();
//! authenticator.authenticate(&mut headers).await?;
//! assert_eq!(headers.get("authorization").unwrap(), "Bearer my-token");
//! # anyhow::Ok(()) });
//! ```
//!
//! [Authenticator]: crate::credentials::Authenticator
//! [api_key]: crate::credentials::api_key
//! [assume]: crate::credentials::assume
//! [instance_metadata]: crate::credentials::instance_metadata
//! [container]: crate::credentials::container
//! [session]: crate::credentials::session

pub mod build_errors;
pub mod errors;

/// Authenticators and their builders.
pub mod credentials;

/// Configuration properties for the authenticators.
pub mod properties;

/// Types and functions to work with access tokens.
pub mod token;

/// The token cache
pub(crate) mod token_cache;

/// A `Result` alias where the `Err` case is
/// `platform_sdk_auth::errors::CredentialsError`.
pub(crate) type Result<T> = std::result::Result<T, crate::errors::CredentialsError>;

pub(crate) mod constants;
pub(crate) mod headers_util;
pub(crate) mod http;
pub(crate) mod jwt;
