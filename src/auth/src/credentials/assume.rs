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

//! Assumes the identity of a trusted profile.
//!
//! These authenticators make two token exchanges. First, an API key is
//! exchanged for an access token, as the [api_key] authenticators do. Then
//! that token is exchanged for a token of the trusted profile. Each token has
//! its own cache, and is refreshed independently.
//!
//! [api_key]: super::api_key

use crate::build_errors::{BuildResult, Error as BuilderError};
use crate::constants::{ASSUME_GRANT_TYPE, DEFAULT_IAM_URL, IAM_RESPONSE_TYPE, IAM_TOKEN_PATH};
use crate::credentials::api_key::{self, ApiKeyAuthenticator};
use crate::credentials::profile::{Profile, ProfileFields};
use crate::credentials::{Authenticator, CachedToken, Result};
use crate::http::TokenClient;
use crate::properties::{self, APIKEY, AUTH_DISABLE_SSL, AUTH_URL, CLIENT_ID, CLIENT_SECRET};
use crate::token::{TokenData, TokenResponse, TokenSource, now};
use http::HeaderMap;
use http::header::ACCEPT;
use std::collections::HashMap;

/// Obtains access tokens for a trusted profile.
#[derive(Clone, Debug)]
pub struct AssumeAuthenticator {
    pub(crate) inner: CachedToken<AssumeSource>,
}

impl AssumeAuthenticator {
    /// Returns a valid access token for the trusted profile, fetching a new
    /// one if needed.
    pub async fn token(&self) -> Result<String> {
        self.inner.token().await
    }
}

#[derive(Debug)]
pub(crate) struct AssumeSource {
    client: TokenClient,
    upstream: ApiKeyAuthenticator,
    profile: Profile,
}

#[async_trait::async_trait]
impl TokenSource for AssumeSource {
    async fn fetch(&self) -> Result<TokenData> {
        let access_token = self.upstream.token().await?;
        let mut form = vec![
            ("grant_type", ASSUME_GRANT_TYPE),
            ("access_token", access_token.as_str()),
            ("response_type", IAM_RESPONSE_TYPE),
        ];
        form.extend(self.profile.form_fields());
        let builder = self
            .client
            .request(reqwest::Method::POST, IAM_TOKEN_PATH)
            .header(ACCEPT, "application/json")
            .form(&form);
        let response = self.client.execute::<TokenResponse>(builder).await?;
        response.into_token_data(now())
    }
}

/// A builder for trusted profile authenticators.
///
/// Exactly one of the profile id, the profile CRN, or the profile name must
/// be set. The profile name requires the account id too.
///
/// # Example
/// ```
/// # use platform_sdk_auth::credentials::assume::Builder;
/// let authenticator = Builder::new("my-api-key")
///     .with_profile_name("my-profile")
///     .with_account("my-account-id")
///     .build()?;
/// # Ok::<(), anyhow::Error>(())
/// ```
pub struct Builder {
    api_key: String,
    profile: ProfileFields,
    client_id: Option<String>,
    client_secret: Option<String>,
    url: Option<String>,
    disable_ssl_verification: bool,
    headers: HeaderMap,
}

impl Builder {
    /// Creates a new builder with the given API key.
    pub fn new<T: Into<String>>(api_key: T) -> Self {
        Self {
            api_key: api_key.into(),
            profile: ProfileFields::default(),
            client_id: None,
            client_secret: None,
            url: None,
            disable_ssl_verification: false,
            headers: HeaderMap::new(),
        }
    }

    /// Creates a builder from the `apikey`, `profile_id`, `profile_crn`,
    /// `profile_name`, `account`, `client_id`, `client_secret`, `auth_url`,
    /// and `auth_disable_ssl` properties.
    pub fn from_properties(props: &HashMap<String, String>) -> BuildResult<Self> {
        let api_key = properties::get(props, APIKEY).ok_or(BuilderError::missing_field(APIKEY))?;
        let mut builder = Self::new(api_key)
            .with_disable_ssl_verification(properties::get_bool(props, AUTH_DISABLE_SSL));
        builder.profile = ProfileFields::from_properties(props);
        builder.client_id = properties::get(props, CLIENT_ID).map(str::to_string);
        builder.client_secret = properties::get(props, CLIENT_SECRET).map(str::to_string);
        builder.url = properties::get(props, AUTH_URL).map(str::to_string);
        Ok(builder)
    }

    /// Selects the trusted profile by id.
    pub fn with_profile_id<T: Into<String>>(mut self, v: T) -> Self {
        self.profile.id = Some(v.into());
        self
    }

    /// Selects the trusted profile by CRN.
    pub fn with_profile_crn<T: Into<String>>(mut self, v: T) -> Self {
        self.profile.crn = Some(v.into());
        self
    }

    /// Selects the trusted profile by name.
    ///
    /// The account id must be set too.
    pub fn with_profile_name<T: Into<String>>(mut self, v: T) -> Self {
        self.profile.name = Some(v.into());
        self
    }

    /// Sets the account that owns the profile selected by name.
    pub fn with_account<T: Into<String>>(mut self, v: T) -> Self {
        self.profile.account = Some(v.into());
        self
    }

    /// Sets the client id used to exchange the API key.
    pub fn with_client_id<T: Into<String>>(mut self, v: T) -> Self {
        self.client_id = Some(v.into());
        self
    }

    /// Sets the client secret used to exchange the API key.
    pub fn with_client_secret<T: Into<String>>(mut self, v: T) -> Self {
        self.client_secret = Some(v.into());
        self
    }

    /// Overrides the token server URL, used for both exchanges.
    pub fn with_url<T: Into<String>>(mut self, v: T) -> Self {
        self.url = Some(v.into());
        self
    }

    /// Disables TLS certificate verification for the token server.
    pub fn with_disable_ssl_verification(mut self, v: bool) -> Self {
        self.disable_ssl_verification = v;
        self
    }

    /// Adds headers to the token requests.
    pub fn with_headers(mut self, v: HeaderMap) -> Self {
        self.headers = v;
        self
    }

    /// Returns an [Authenticator] with the configured settings.
    ///
    /// Fails if the API key is empty, if the profile selector is missing or
    /// ambiguous, or if the profile name is set without an account.
    pub fn build(self) -> BuildResult<Authenticator> {
        let profile = self.profile.require()?;
        if let Profile::Name { account: None, .. } = &profile {
            return Err(BuilderError::invalid_configuration(
                "the account must be set when the profile is selected by name",
            ));
        }
        let url = self.url.unwrap_or_else(|| DEFAULT_IAM_URL.to_string());
        let upstream = self
            .client_id
            .into_iter()
            .fold(api_key::Builder::new(self.api_key), |b, v| b.with_client_id(v));
        let upstream = self
            .client_secret
            .into_iter()
            .fold(upstream, |b, v| b.with_client_secret(v))
            .with_url(url.clone())
            .with_disable_ssl_verification(self.disable_ssl_verification)
            .with_headers(self.headers.clone())
            .build_authenticator()?;
        let client = TokenClient::new(url, self.disable_ssl_verification, self.headers)?;
        let source = AssumeSource {
            client,
            upstream,
            profile,
        };
        Ok(Authenticator::Assume(AssumeAuthenticator {
            inner: CachedToken::new(source, None),
        }))
    }
}

impl std::fmt::Debug for Builder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Builder")
            .field("api_key", &"[censored]")
            .field("profile", &self.profile)
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret.as_ref().map(|_| "[censored]"))
            .field("url", &self.url)
            .field("disable_ssl_verification", &self.disable_ssl_verification)
            .field("headers", &self.headers)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::APIKEY_GRANT_TYPE;
    use crate::credentials::AUTHTYPE_ASSUME;
    use crate::credentials::tests::authorization;
    use httptest::matchers::{all_of, contains, key, not, request, url_decoded};
    use httptest::responders::{json_encoded, status_code};
    use httptest::{Expectation, Server};
    use sdk_core::authenticate::Authenticate;
    use serde_json::json;

    type TestResult = anyhow::Result<()>;

    fn token_response(token: &str) -> serde_json::Value {
        let now = now();
        json!({
            "access_token": token,
            "token_type": "Bearer",
            "expires_in": 3600,
            "expiration": now + 3600,
        })
    }

    fn expect_api_key_exchange(server: &Server) {
        server.expect(
            Expectation::matching(all_of![
                request::method_path("POST", IAM_TOKEN_PATH),
                request::body(url_decoded(contains(("grant_type", APIKEY_GRANT_TYPE)))),
                request::body(url_decoded(contains(("apikey", "test-api-key")))),
            ])
            .times(1)
            .respond_with(json_encoded(token_response("api-key-token"))),
        );
    }

    #[tokio::test]
    async fn assume_by_id() -> TestResult {
        let server = Server::run();
        expect_api_key_exchange(&server);
        server.expect(
            Expectation::matching(all_of![
                request::method_path("POST", IAM_TOKEN_PATH),
                request::body(url_decoded(contains(("grant_type", ASSUME_GRANT_TYPE)))),
                request::body(url_decoded(contains(("access_token", "api-key-token")))),
                request::body(url_decoded(contains(("profile_id", "test-profile-id")))),
                request::body(url_decoded(contains(("response_type", IAM_RESPONSE_TYPE)))),
                request::body(url_decoded(not(contains(key("apikey"))))),
            ])
            .times(1)
            .respond_with(json_encoded(token_response("profile-token"))),
        );

        let authenticator = Builder::new("test-api-key")
            .with_profile_id("test-profile-id")
            .with_url(server.url_str(""))
            .build()?;
        assert_eq!(authenticator.authentication_type(), AUTHTYPE_ASSUME);
        assert_eq!(
            authorization(&authenticator).await?.as_deref(),
            Some("Bearer profile-token")
        );
        assert_eq!(
            authenticator.token().await?.as_deref(),
            Some("profile-token")
        );
        Ok(())
    }

    #[tokio::test]
    async fn assume_by_name() -> TestResult {
        let server = Server::run();
        expect_api_key_exchange(&server);
        server.expect(
            Expectation::matching(all_of![
                request::method_path("POST", IAM_TOKEN_PATH),
                request::body(url_decoded(contains(("grant_type", ASSUME_GRANT_TYPE)))),
                request::body(url_decoded(contains(("profile_name", "test-profile")))),
                request::body(url_decoded(contains(("account", "test-account")))),
            ])
            .respond_with(json_encoded(token_response("profile-token"))),
        );

        let authenticator = Builder::new("test-api-key")
            .with_profile_name("test-profile")
            .with_account("test-account")
            .with_url(server.url_str(""))
            .build()?;
        assert_eq!(
            authorization(&authenticator).await?.as_deref(),
            Some("Bearer profile-token")
        );
        Ok(())
    }

    #[tokio::test]
    async fn upstream_error() -> TestResult {
        let server = Server::run();
        server.expect(
            Expectation::matching(all_of![
                request::method_path("POST", IAM_TOKEN_PATH),
                request::body(url_decoded(contains(("grant_type", APIKEY_GRANT_TYPE)))),
            ])
            .respond_with(status_code(503).body("try again")),
        );

        let authenticator = Builder::new("test-api-key")
            .with_profile_crn("test-crn")
            .with_url(server.url_str(""))
            .build()?;
        let err = authenticator.token().await.unwrap_err();
        assert!(err.is_transient(), "{err:?}");
        assert_eq!(err.http_error().map(|e| e.status_code()), Some(503));
        Ok(())
    }

    #[test]
    fn validation() {
        let got = Builder::new("test-api-key").build();
        assert!(
            matches!(&got, Err(e) if e.is_invalid_configuration()),
            "{got:?}"
        );
        let got = Builder::new("test-api-key")
            .with_profile_id("id")
            .with_profile_crn("crn")
            .build();
        assert!(
            matches!(&got, Err(e) if e.is_invalid_configuration()),
            "{got:?}"
        );
        let got = Builder::new("test-api-key")
            .with_profile_name("name")
            .build();
        assert!(
            matches!(&got, Err(e) if e.is_invalid_configuration()),
            "{got:?}"
        );
        let got = Builder::new("").with_profile_id("id").build();
        assert!(matches!(&got, Err(e) if e.is_missing_field()), "{got:?}");
        let got = Builder::new("test-api-key")
            .with_profile_id("id")
            .with_client_id("client")
            .build();
        assert!(
            matches!(&got, Err(e) if e.is_invalid_configuration()),
            "{got:?}"
        );
    }

    #[test]
    fn from_properties() -> TestResult {
        let props = HashMap::from(
            [("apikey", "test-api-key"), ("profile_crn", "test-crn")]
                .map(|(k, v)| (k.to_string(), v.to_string())),
        );
        let authenticator = Builder::from_properties(&props)?.build()?;
        assert!(matches!(authenticator, Authenticator::Assume(_)));

        let props = HashMap::from([("profile_crn".to_string(), "test-crn".to_string())]);
        let got = Builder::from_properties(&props);
        assert!(matches!(&got, Err(e) if e.is_missing_field()), "{got:?}");
        Ok(())
    }

    #[test]
    fn debug() -> TestResult {
        let builder = Builder::new("secret-api-key").with_profile_id("id");
        let got = format!("{builder:?}");
        assert!(!got.contains("secret-api-key"), "{got}");
        let got = format!("{:?}", builder.build()?);
        assert!(!got.contains("secret-api-key"), "{got}");
        Ok(())
    }
}
