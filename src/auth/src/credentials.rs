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

use crate::build_errors::{BuildResult, Error as BuilderError, require};
use crate::errors::CredentialsError;
use crate::headers_util::{basic_value, bearer_value, set_authorization};
use crate::properties::{CLIENT_ID, CLIENT_SECRET};
use crate::token::TokenSource;
use crate::token_cache::TokenCache;
use http::{HeaderMap, HeaderValue};
use sdk_core::authenticate::Authenticate;

pub mod api_key;
pub mod assume;
pub mod basic;
pub mod bearer;
pub mod container;
pub mod instance_metadata;
pub mod no_auth;
pub mod session;

pub(crate) mod profile;

/// A `Result` alias where the `Err` case is [CredentialsError].
pub type Result<T> = std::result::Result<T, CredentialsError>;

/// The authentication type of [basic] authenticators.
pub const AUTHTYPE_BASIC: &str = "basic";
/// The authentication type of [bearer] authenticators.
pub const AUTHTYPE_BEARER_TOKEN: &str = "bearerToken";
/// The authentication type of [no_auth] authenticators.
pub const AUTHTYPE_NO_AUTH: &str = "noAuth";
/// The authentication type of [api_key] authenticators.
pub const AUTHTYPE_API_KEY: &str = "iam";
/// The authentication type of [assume] authenticators.
pub const AUTHTYPE_ASSUME: &str = "iamAssume";
/// The authentication type of [instance_metadata] authenticators.
pub const AUTHTYPE_INSTANCE_METADATA: &str = "vpc";
/// The authentication type of [container] authenticators.
pub const AUTHTYPE_CONTAINER: &str = "container";
/// The authentication type of [session] authenticators.
pub const AUTHTYPE_SESSION: &str = "session";

/// Adds credentials to the requests of a client.
///
/// Each variant is created by the `Builder` in the module of the same name.
/// Token-based authenticators cache their token, and clones share the cache.
/// Applications can share one authenticator between several clients.
///
/// # Example
/// ```
/// # use platform_sdk_auth::credentials::{Authenticator, basic};
/// # use sdk_core::authenticate::Authenticate;
/// let authenticator = basic::Builder::new("my-user", "my-password").build()?;
/// assert!(matches!(authenticator, Authenticator::Basic(_)));
/// assert_eq!(authenticator.authentication_type(), "basic");
/// # Ok::<(), anyhow::Error>(())
/// ```
#[derive(Clone, Debug)]
pub enum Authenticator {
    /// Basic authentication with a user name and password.
    Basic(basic::BasicAuthenticator),
    /// A static bearer token, never refreshed.
    Bearer(bearer::BearerAuthenticator),
    /// No credentials.
    NoAuth,
    /// Access tokens obtained in exchange for an API key.
    ApiKey(api_key::ApiKeyAuthenticator),
    /// Access tokens for a trusted profile, obtained with an API key token.
    Assume(assume::AssumeAuthenticator),
    /// Access tokens for the identity of the compute instance.
    InstanceMetadata(instance_metadata::InstanceMetadataAuthenticator),
    /// Access tokens obtained in exchange for a compute resource token.
    Container(container::ContainerAuthenticator),
    /// Access tokens from a session endpoint.
    Session(session::SessionAuthenticator),
}

impl Authenticator {
    /// Returns the current access token, if this authenticator uses them.
    ///
    /// Token-based authenticators fetch (or refresh) the token as needed.
    /// Basic and no-auth authenticators return `None`.
    pub async fn token(&self) -> Result<Option<String>> {
        let token = match self {
            Self::Basic(_) | Self::NoAuth => return Ok(None),
            Self::Bearer(a) => a.token().to_string(),
            Self::ApiKey(a) => a.token().await?,
            Self::Assume(a) => a.token().await?,
            Self::InstanceMetadata(a) => a.token().await?,
            Self::Container(a) => a.token().await?,
            Self::Session(a) => a.token().await?,
        };
        Ok(Some(token))
    }
}

#[async_trait::async_trait]
impl Authenticate for Authenticator {
    fn authentication_type(&self) -> &'static str {
        match self {
            Self::Basic(_) => AUTHTYPE_BASIC,
            Self::Bearer(_) => AUTHTYPE_BEARER_TOKEN,
            Self::NoAuth => AUTHTYPE_NO_AUTH,
            Self::ApiKey(_) => AUTHTYPE_API_KEY,
            Self::Assume(_) => AUTHTYPE_ASSUME,
            Self::InstanceMetadata(_) => AUTHTYPE_INSTANCE_METADATA,
            Self::Container(_) => AUTHTYPE_CONTAINER,
            Self::Session(_) => AUTHTYPE_SESSION,
        }
    }

    async fn authenticate(&self, headers: &mut HeaderMap) -> Result<()> {
        match self {
            Self::Basic(a) => a.apply(headers),
            Self::Bearer(a) => a.apply(headers),
            Self::NoAuth => {}
            Self::ApiKey(a) => a.inner.apply(headers).await?,
            Self::Assume(a) => a.inner.apply(headers).await?,
            Self::InstanceMetadata(a) => a.inner.apply(headers).await?,
            Self::Container(a) => a.inner.apply(headers).await?,
            Self::Session(a) => a.inner.apply(headers).await?,
        }
        Ok(())
    }
}

/// Validates the optional client credentials for a token server.
///
/// Both the client id and secret must be set, or neither. Returns the value of
/// the `Authorization: Basic` header sent to the token server.
pub(crate) fn client_auth(
    client_id: Option<&str>,
    client_secret: Option<&str>,
) -> BuildResult<Option<HeaderValue>> {
    match (client_id, client_secret) {
        (None, None) => Ok(None),
        (Some(id), Some(secret)) => {
            require(CLIENT_ID, id)?;
            require(CLIENT_SECRET, secret)?;
            basic_value(id, secret)
                .map(Some)
                .map_err(BuilderError::invalid_configuration)
        }
        _ => Err(BuilderError::invalid_configuration(
            "the client_id and client_secret must be both set or both unset",
        )),
    }
}

/// The state shared by all token-based authenticators.
///
/// A static access token, if configured, is used instead of the cache.
pub(crate) struct CachedToken<T> {
    static_token: Option<String>,
    cache: TokenCache<T>,
}

impl<T: TokenSource + 'static> CachedToken<T> {
    pub(crate) fn new(source: T, static_token: Option<String>) -> Self {
        Self {
            static_token,
            cache: TokenCache::new(source),
        }
    }

    pub(crate) async fn token(&self) -> Result<String> {
        match &self.static_token {
            Some(t) => Ok(t.clone()),
            None => self.cache.token().await,
        }
    }

    pub(crate) async fn apply(&self, headers: &mut HeaderMap) -> Result<()> {
        let token = self.token().await?;
        set_authorization(headers, bearer_value(&token)?);
        Ok(())
    }
}

impl<T> Clone for CachedToken<T> {
    fn clone(&self) -> Self {
        Self {
            static_token: self.static_token.clone(),
            cache: self.cache.clone(),
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for CachedToken<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachedToken")
            .field("static_token", &self.static_token.as_ref().map(|_| "[censored]"))
            .field("cache", &self.cache)
            .finish()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::token::TokenData;
    use crate::token::tests::MockTokenSource;
    use http::header::AUTHORIZATION;

    static_assertions::assert_impl_all!(Authenticator: Clone, Send, Sync, std::fmt::Debug);

    /// Returns the `Authorization` header set by `authenticator`.
    pub(crate) async fn authorization(authenticator: &Authenticator) -> anyhow::Result<Option<String>> {
        let mut headers = HeaderMap::new();
        authenticator.authenticate(&mut headers).await?;
        let value = headers
            .get(AUTHORIZATION)
            .map(|v| {
                assert!(v.is_sensitive(), "{v:?}");
                v.to_str().map(str::to_string)
            })
            .transpose()?;
        Ok(value)
    }

    #[tokio::test]
    async fn static_token_bypasses_cache() -> anyhow::Result<()> {
        let mut mock = MockTokenSource::new();
        mock.expect_fetch().never();
        let cached = CachedToken::new(mock, Some("static-token".to_string()));
        assert_eq!(cached.token().await?, "static-token");
        let mut headers = HeaderMap::new();
        cached.apply(&mut headers).await?;
        assert_eq!(
            headers.get(AUTHORIZATION).map(|v| v.to_str()).transpose()?,
            Some("Bearer static-token")
        );
        Ok(())
    }

    #[tokio::test]
    async fn uses_cache() -> anyhow::Result<()> {
        let mut mock = MockTokenSource::new();
        mock.expect_fetch().times(1).return_once(|| {
            let now = crate::token::now();
            Ok(TokenData::new("cached-token", now, now + 3600))
        });
        let cached = CachedToken::new(mock, None);
        let clone = cached.clone();
        assert_eq!(cached.token().await?, "cached-token");
        assert_eq!(clone.token().await?, "cached-token");
        Ok(())
    }

    #[tokio::test]
    async fn fetch_error_aborts() {
        let mut mock = MockTokenSource::new();
        mock.expect_fetch()
            .times(1)
            .return_once(|| Err(crate::errors::non_transient_from_str("fail")));
        let cached = CachedToken::new(mock, None);
        let mut headers = HeaderMap::new();
        let got = cached.apply(&mut headers).await;
        assert!(got.is_err(), "{got:?}");
        assert!(headers.is_empty(), "{headers:?}");
    }

    #[test]
    fn debug() {
        let cached = CachedToken::new(MockTokenSource::new(), Some("secret-token".to_string()));
        let got = format!("{cached:?}");
        assert!(!got.contains("secret-token"), "{got}");
    }

    #[test]
    fn client_auth_validation() -> anyhow::Result<()> {
        assert_eq!(client_auth(None, None)?, None);
        let value = client_auth(Some("id"), Some("secret"))?;
        assert_eq!(
            value.as_ref().map(|v| v.to_str()).transpose()?,
            Some("Basic aWQ6c2VjcmV0")
        );

        let got = client_auth(Some("id"), None);
        assert!(matches!(&got, Err(e) if e.is_invalid_configuration()), "{got:?}");
        let got = client_auth(None, Some("secret"));
        assert!(matches!(&got, Err(e) if e.is_invalid_configuration()), "{got:?}");
        let got = client_auth(Some(""), Some("secret"));
        assert!(matches!(&got, Err(e) if e.is_missing_field()), "{got:?}");
        Ok(())
    }

    #[tokio::test]
    async fn no_auth() -> anyhow::Result<()> {
        let authenticator = Authenticator::NoAuth;
        assert_eq!(authenticator.authentication_type(), AUTHTYPE_NO_AUTH);
        assert_eq!(authorization(&authenticator).await?, None);
        assert_eq!(authenticator.token().await?, None);
        Ok(())
    }
}
