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

use crate::error::CredentialsError;
use http::HeaderMap;
use std::sync::Arc;

/// Adds credentials to outbound requests.
///
/// The request pipeline calls [authenticate][Authenticate::authenticate]
/// once per logical request, before the first attempt. Implementations add
/// the `Authorization` header, or leave the headers unchanged when no
/// credentials are needed. If this function fails the request is not sent.
///
/// Implementations must be safe to call from many tasks concurrently.
///
/// # Example
/// ```
/// # use platform_sdk_core::authenticate::Authenticate;
/// # use platform_sdk_core::error::CredentialsError;
/// # use http::{HeaderMap, HeaderValue, header::AUTHORIZATION};
/// #[derive(Debug)]
/// struct Fixed;
///
/// #[async_trait::async_trait]
/// impl Authenticate for Fixed {
///     fn authentication_type(&self) -> &'static str { "fixed" }
///     async fn authenticate(&self, headers: &mut HeaderMap) -> Result<(), CredentialsError> {
///         headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer test-only"));
///         Ok(())
///     }
/// }
/// ```
#[async_trait::async_trait]
pub trait Authenticate: std::fmt::Debug + Send + Sync {
    /// A short name for the kind of credentials, e.g. `"bearerToken"`.
    fn authentication_type(&self) -> &'static str;

    /// Adds the credentials to `headers`.
    async fn authenticate(&self, headers: &mut HeaderMap) -> Result<(), CredentialsError>;
}

#[async_trait::async_trait]
impl<T: Authenticate + ?Sized> Authenticate for Arc<T> {
    fn authentication_type(&self) -> &'static str {
        T::authentication_type(self)
    }

    async fn authenticate(&self, headers: &mut HeaderMap) -> Result<(), CredentialsError> {
        T::authenticate(self, headers).await
    }
}
