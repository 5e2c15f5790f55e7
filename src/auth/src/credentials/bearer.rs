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

//! Static bearer token authentication.
//!
//! The application supplies the access token, and is responsible for
//! replacing the authenticator before the token expires. These
//! authenticators never refresh the token.

use crate::build_errors::{BuildResult, Error as BuilderError, require};
use crate::credentials::Authenticator;
use crate::headers_util::{bearer_value, set_authorization};
use crate::properties::{self, BEARER_TOKEN};
use http::{HeaderMap, HeaderValue};
use std::collections::HashMap;

/// Adds a fixed bearer token to each request.
#[derive(Clone)]
pub struct BearerAuthenticator {
    token: String,
    header: HeaderValue,
}

impl BearerAuthenticator {
    /// The bearer token.
    pub fn token(&self) -> &str {
        &self.token
    }

    pub(crate) fn apply(&self, headers: &mut HeaderMap) {
        set_authorization(headers, self.header.clone());
    }
}

impl std::fmt::Debug for BearerAuthenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BearerAuthenticator")
            .field("token", &"[censored]")
            .finish()
    }
}

/// A builder for static bearer token authenticators.
pub struct Builder {
    token: String,
}

impl Builder {
    /// Creates a new builder with the given token.
    pub fn new<T: Into<String>>(token: T) -> Self {
        Self {
            token: token.into(),
        }
    }

    /// Creates a builder from the `bearer_token` property.
    pub fn from_properties(props: &HashMap<String, String>) -> BuildResult<Self> {
        properties::get(props, BEARER_TOKEN)
            .map(Self::new)
            .ok_or(BuilderError::missing_field(BEARER_TOKEN))
    }

    /// Returns an [Authenticator] with the configured settings.
    ///
    /// Fails if the token is empty.
    pub fn build(self) -> BuildResult<Authenticator> {
        require(BEARER_TOKEN, &self.token)?;
        let header = bearer_value(&self.token).map_err(BuilderError::invalid_configuration)?;
        Ok(Authenticator::Bearer(BearerAuthenticator {
            token: self.token,
            header,
        }))
    }
}

impl std::fmt::Debug for Builder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Builder")
            .field("token", &"[censored]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::AUTHTYPE_BEARER_TOKEN;
    use crate::credentials::tests::authorization;
    use sdk_core::authenticate::Authenticate;

    #[tokio::test]
    async fn authenticate() -> anyhow::Result<()> {
        let authenticator = Builder::new("test-token").build()?;
        assert_eq!(authenticator.authentication_type(), AUTHTYPE_BEARER_TOKEN);
        assert_eq!(
            authorization(&authenticator).await?.as_deref(),
            Some("Bearer test-token")
        );
        assert_eq!(authenticator.token().await?.as_deref(), Some("test-token"));
        Ok(())
    }

    #[test]
    fn validation() {
        let got = Builder::new("").build();
        assert!(matches!(&got, Err(e) if e.is_missing_field()), "{got:?}");
        let got = Builder::new("{token}").build();
        assert!(
            matches!(&got, Err(e) if e.is_invalid_configuration()),
            "{got:?}"
        );
        let got = Builder::new("bad\ntoken").build();
        assert!(
            matches!(&got, Err(e) if e.is_invalid_configuration()),
            "{got:?}"
        );
    }

    #[test]
    fn from_properties() -> anyhow::Result<()> {
        let props = HashMap::from([("bearer_token".to_string(), "test-token".to_string())]);
        let authenticator = Builder::from_properties(&props)?.build()?;
        assert!(matches!(&authenticator, Authenticator::Bearer(b) if b.token() == "test-token"));

        let got = Builder::from_properties(&HashMap::new());
        assert!(matches!(&got, Err(e) if e.is_missing_field()), "{got:?}");
        Ok(())
    }

    #[test]
    fn debug() -> anyhow::Result<()> {
        let builder = Builder::new("secret-token");
        let got = format!("{builder:?}");
        assert!(!got.contains("secret-token"), "{got}");
        let got = format!("{:?}", builder.build()?);
        assert!(!got.contains("secret-token"), "{got}");
        Ok(())
    }
}
