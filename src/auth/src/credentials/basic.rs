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

//! Basic authentication.
//!
//! Requests carry an `Authorization: Basic ...` header with the base64
//! encoded user name and password. No tokens are involved.

use crate::build_errors::{BuildResult, Error as BuilderError, require};
use crate::credentials::Authenticator;
use crate::headers_util::{basic_value, set_authorization};
use crate::properties::{self, PASSWORD, USERNAME};
use http::{HeaderMap, HeaderValue};
use std::collections::HashMap;

/// Adds a basic authentication header to each request.
#[derive(Clone, Debug)]
pub struct BasicAuthenticator {
    // Marked as sensitive, its `Debug` output is censored.
    header: HeaderValue,
}

impl BasicAuthenticator {
    pub(crate) fn apply(&self, headers: &mut HeaderMap) {
        set_authorization(headers, self.header.clone());
    }
}

/// A builder for basic authenticators.
pub struct Builder {
    username: String,
    password: String,
}

impl Builder {
    /// Creates a new builder with the given user name and password.
    ///
    /// # Example
    /// ```
    /// # use platform_sdk_auth::credentials::basic::Builder;
    /// let authenticator = Builder::new("my-user", "my-password").build()?;
    /// # Ok::<(), anyhow::Error>(())
    /// ```
    pub fn new<U: Into<String>, P: Into<String>>(username: U, password: P) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Creates a builder from the `username` and `password` properties.
    pub fn from_properties(props: &HashMap<String, String>) -> BuildResult<Self> {
        let username =
            properties::get(props, USERNAME).ok_or(BuilderError::missing_field(USERNAME))?;
        let password =
            properties::get(props, PASSWORD).ok_or(BuilderError::missing_field(PASSWORD))?;
        Ok(Self::new(username, password))
    }

    /// Returns an [Authenticator] with the configured settings.
    ///
    /// Fails if the user name or password are empty, or wrapped in braces or
    /// quotes.
    pub fn build(self) -> BuildResult<Authenticator> {
        require(USERNAME, &self.username)?;
        require(PASSWORD, &self.password)?;
        let header =
            basic_value(&self.username, &self.password).map_err(BuilderError::invalid_configuration)?;
        Ok(Authenticator::Basic(BasicAuthenticator { header }))
    }
}

impl std::fmt::Debug for Builder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Builder")
            .field("username", &self.username)
            .field("password", &"[censored]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::AUTHTYPE_BASIC;
    use crate::credentials::tests::authorization;
    use sdk_core::authenticate::Authenticate;
    use test_case::test_case;

    #[tokio::test]
    async fn authenticate() -> anyhow::Result<()> {
        let authenticator = Builder::new("Aladdin", "open sesame").build()?;
        assert_eq!(authenticator.authentication_type(), AUTHTYPE_BASIC);
        assert_eq!(
            authorization(&authenticator).await?.as_deref(),
            Some("Basic QWxhZGRpbjpvcGVuIHNlc2FtZQ==")
        );
        assert_eq!(authenticator.token().await?, None);
        Ok(())
    }

    #[test_case("", "password")]
    #[test_case("user", "")]
    fn missing(username: &str, password: &str) {
        let got = Builder::new(username, password).build();
        assert!(matches!(&got, Err(e) if e.is_missing_field()), "{got:?}");
    }

    #[test_case("{user}", "password")]
    #[test_case("user", "\"password\"")]
    fn invalid(username: &str, password: &str) {
        let got = Builder::new(username, password).build();
        assert!(
            matches!(&got, Err(e) if e.is_invalid_configuration()),
            "{got:?}"
        );
    }

    #[test]
    fn from_properties() -> anyhow::Result<()> {
        let props = HashMap::from(
            [("username", "user"), ("password", "password")]
                .map(|(k, v)| (k.to_string(), v.to_string())),
        );
        let authenticator = Builder::from_properties(&props)?.build()?;
        assert!(matches!(authenticator, Authenticator::Basic(_)));

        let props = HashMap::from([("username".to_string(), "user".to_string())]);
        let got = Builder::from_properties(&props);
        assert!(matches!(&got, Err(e) if e.is_missing_field()), "{got:?}");
        Ok(())
    }

    #[test]
    fn debug() -> anyhow::Result<()> {
        let builder = Builder::new("user", "secret-password");
        let got = format!("{builder:?}");
        assert!(!got.contains("secret-password"), "{got}");

        let authenticator = builder.build()?;
        let got = format!("{authenticator:?}");
        assert!(!got.contains("dXNlcjpzZWNyZXQtcGFzc3dvcmQ="), "{got}");
        Ok(())
    }
}
