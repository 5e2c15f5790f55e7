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

//! API key exchange.
//!
//! These authenticators exchange a long-lived API key for a short-lived
//! access token at the IAM token endpoint. The token is cached, and refreshed
//! before it expires.
//!
//! Some token servers also require client credentials (a client id and
//! secret). These are sent using basic authentication on the token request,
//! never on the requests to the service.

use crate::build_errors::{BuildResult, Error as BuilderError, check_optional, require};
use crate::constants::{APIKEY_GRANT_TYPE, DEFAULT_IAM_URL, IAM_RESPONSE_TYPE, IAM_TOKEN_PATH};
use crate::credentials::{Authenticator, CachedToken, Result, client_auth};
use crate::http::TokenClient;
use crate::properties::{
    self, APIKEY, AUTH_DISABLE_SSL, AUTH_URL, CLIENT_ID, CLIENT_SECRET, SCOPE,
};
use crate::token::{TokenData, TokenResponse, TokenSource, now};
use http::header::{ACCEPT, AUTHORIZATION};
use http::{HeaderMap, HeaderValue};
use std::collections::HashMap;

/// Obtains access tokens in exchange for an API key.
#[derive(Clone, Debug)]
pub struct ApiKeyAuthenticator {
    pub(crate) inner: CachedToken<ApiKeySource>,
}

impl ApiKeyAuthenticator {
    /// Returns a valid access token, fetching a new one if needed.
    pub async fn token(&self) -> Result<String> {
        self.inner.token().await
    }
}

pub(crate) struct ApiKeySource {
    client: TokenClient,
    api_key: String,
    client_auth: Option<HeaderValue>,
    scope: Option<String>,
}

impl std::fmt::Debug for ApiKeySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiKeySource")
            .field("client", &self.client)
            .field("api_key", &"[censored]")
            .field("client_auth", &self.client_auth)
            .field("scope", &self.scope)
            .finish()
    }
}

#[async_trait::async_trait]
impl TokenSource for ApiKeySource {
    async fn fetch(&self) -> Result<TokenData> {
        let mut form = vec![
            ("grant_type", APIKEY_GRANT_TYPE),
            ("apikey", self.api_key.as_str()),
            ("response_type", IAM_RESPONSE_TYPE),
        ];
        if let Some(scope) = &self.scope {
            form.push(("scope", scope.as_str()));
        }
        let builder = self
            .client
            .request(reqwest::Method::POST, IAM_TOKEN_PATH)
            .header(ACCEPT, "application/json")
            .form(&form);
        let builder = self
            .client_auth
            .iter()
            .fold(builder, |b, v| b.header(AUTHORIZATION, v.clone()));
        let response = self.client.execute::<TokenResponse>(builder).await?;
        response.into_token_data(now())
    }
}

/// A builder for API key authenticators.
///
/// # Example
/// ```
/// # use platform_sdk_auth::credentials::api_key::Builder;
/// let authenticator = Builder::new("my-api-key")
///     .with_url("https://iam.example.com")
///     .build()?;
/// # Ok::<(), anyhow::Error>(())
/// ```
pub struct Builder {
    api_key: String,
    client_id: Option<String>,
    client_secret: Option<String>,
    scope: Option<String>,
    url: Option<String>,
    disable_ssl_verification: bool,
    headers: HeaderMap,
    access_token: Option<String>,
}

impl Builder {
    /// Creates a new builder with the given API key.
    pub fn new<T: Into<String>>(api_key: T) -> Self {
        Self {
            api_key: api_key.into(),
            client_id: None,
            client_secret: None,
            scope: None,
            url: None,
            disable_ssl_verification: false,
            headers: HeaderMap::new(),
            access_token: None,
        }
    }

    /// Creates a builder from the `apikey`, `client_id`, `client_secret`,
    /// `scope`, `auth_url`, and `auth_disable_ssl` properties.
    pub fn from_properties(props: &HashMap<String, String>) -> BuildResult<Self> {
        let api_key = properties::get(props, APIKEY).ok_or(BuilderError::missing_field(APIKEY))?;
        let mut builder = Self::new(api_key)
            .with_disable_ssl_verification(properties::get_bool(props, AUTH_DISABLE_SSL));
        builder.client_id = properties::get(props, CLIENT_ID).map(str::to_string);
        builder.client_secret = properties::get(props, CLIENT_SECRET).map(str::to_string);
        builder.scope = properties::get(props, SCOPE).map(str::to_string);
        builder.url = properties::get(props, AUTH_URL).map(str::to_string);
        Ok(builder)
    }

    /// Sets the client id sent to the token server.
    ///
    /// The client secret must be set too.
    pub fn with_client_id<T: Into<String>>(mut self, v: T) -> Self {
        self.client_id = Some(v.into());
        self
    }

    /// Sets the client secret sent to the token server.
    ///
    /// The client id must be set too.
    pub fn with_client_secret<T: Into<String>>(mut self, v: T) -> Self {
        self.client_secret = Some(v.into());
        self
    }

    /// Sets the scope requested for the access tokens.
    pub fn with_scope<T: Into<String>>(mut self, v: T) -> Self {
        self.scope = Some(v.into());
        self
    }

    /// Overrides the token server URL.
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
    ///
    /// These headers replace any header with the same name set by the
    /// authenticator.
    pub fn with_headers(mut self, v: HeaderMap) -> Self {
        self.headers = v;
        self
    }

    /// Uses a fixed access token instead of fetching one.
    ///
    /// The token is never refreshed. The application is responsible for
    /// creating a new authenticator before the token expires.
    pub fn with_access_token<T: Into<String>>(mut self, v: T) -> Self {
        self.access_token = Some(v.into());
        self
    }

    /// Returns an [Authenticator] with the configured settings.
    ///
    /// Fails if the API key is empty, if only one of the client id and
    /// secret is set, or if any value is wrapped in braces or quotes.
    pub fn build(self) -> BuildResult<Authenticator> {
        Ok(Authenticator::ApiKey(self.build_authenticator()?))
    }

    pub(crate) fn build_authenticator(self) -> BuildResult<ApiKeyAuthenticator> {
        require(APIKEY, &self.api_key)?;
        check_optional(SCOPE, self.scope.as_deref())?;
        let client_auth = client_auth(self.client_id.as_deref(), self.client_secret.as_deref())?;
        let access_token = self.access_token.filter(|t| !t.is_empty());
        let client = TokenClient::new(
            self.url.unwrap_or_else(|| DEFAULT_IAM_URL.to_string()),
            self.disable_ssl_verification,
            self.headers,
        )?;
        let source = ApiKeySource {
            client,
            api_key: self.api_key,
            client_auth,
            scope: self.scope,
        };
        Ok(ApiKeyAuthenticator {
            inner: CachedToken::new(source, access_token),
        })
    }
}

impl std::fmt::Debug for Builder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Builder")
            .field("api_key", &"[censored]")
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret.as_ref().map(|_| "[censored]"))
            .field("scope", &self.scope)
            .field("url", &self.url)
            .field("disable_ssl_verification", &self.disable_ssl_verification)
            .field("headers", &self.headers)
            .field("access_token", &self.access_token.as_ref().map(|_| "[censored]"))
            .finish()
    }
}
