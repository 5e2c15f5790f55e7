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

//! Preauthenticated session authentication.
//!
//! Some deployments run their own authorization endpoint, which exchanges a
//! user name and either a password or an API key for a JWT. The expiration
//! of the session is read from the (unverified) claims of the JWT.

use crate::build_errors::{BuildResult, Error as BuilderError, check_value, require};
use crate::constants::SESSION_AUTHORIZE_PATH;
use crate::credentials::{Authenticator, CachedToken, Result};
use crate::http::TokenClient;
use crate::properties::{self, APIKEY, AUTH_DISABLE_SSL, AUTH_URL, PASSWORD, USERNAME};
use crate::token::{TokenData, TokenSource};
use http::HeaderMap;
use http::header::ACCEPT;
use std::collections::HashMap;

/// Obtains session tokens from an authorization endpoint.
#[derive(Clone, Debug)]
pub struct SessionAuthenticator {
    pub(crate) inner: CachedToken<SessionSource>,
}

impl SessionAuthenticator {
    /// Returns a valid session token, fetching a new one if needed.
    pub async fn token(&self) -> Result<String> {
        self.inner.token().await
    }
}

enum Secret {
    Password(String),
    ApiKey(String),
}

pub(crate) struct SessionSource {
    client: TokenClient,
    username: String,
    secret: Secret,
}

impl std::fmt::Debug for SessionSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let secret = match self.secret {
            Secret::Password(_) => "password: [censored]",
            Secret::ApiKey(_) => "api_key: [censored]",
        };
        f.debug_struct("SessionSource")
            .field("client", &self.client)
            .field("username", &self.username)
            .field("secret", &secret)
            .finish()
    }
}

#[derive(serde::Serialize)]
struct AuthorizeRequest<'a> {
    username: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    password: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    api_key: Option<&'a str>,
}

#[derive(serde::Deserialize)]
struct AuthorizeResponse {
    token: String,
}

#[async_trait::async_trait]
impl TokenSource for SessionSource {
    async fn fetch(&self) -> Result<TokenData> {
        let (password, api_key) = match &self.secret {
            Secret::Password(p) => (Some(p.as_str()), None),
            Secret::ApiKey(k) => (None, Some(k.as_str())),
        };
        let body = AuthorizeRequest {
            username: &self.username,
            password,
            api_key,
        };
        let builder = self
            .client
            .request(reqwest::Method::POST, SESSION_AUTHORIZE_PATH)
            .header(ACCEPT, "application/json")
            .json(&body);
        let response = self.client.execute::<AuthorizeResponse>(builder).await?;
        TokenData::from_jwt(response.token)
    }
}

/// A builder for session authenticators.
///
/// The authorization endpoint URL is required, and exactly one of the
/// password or the API key must be set.
///
/// # Example
/// ```
/// # use platform_sdk_auth::credentials::session::Builder;
/// let authenticator = Builder::new("my-user")
///     .with_password("my-password")
///     .with_url("https://cluster.example.com:8443")
///     .build()?;
/// # Ok::<(), anyhow::Error>(())
/// ```
pub struct Builder {
    username: String,
    password: Option<String>,
    api_key: Option<String>,
    url: Option<String>,
    disable_ssl_verification: bool,
    headers: HeaderMap,
    access_token: Option<String>,
}

impl Builder {
    /// Creates a new builder for the given user.
    pub fn new<T: Into<String>>(username: T) -> Self {
        Self {
            username: username.into(),
            password: None,
            api_key: None,
            url: None,
            disable_ssl_verification: false,
            headers: HeaderMap::new(),
            access_token: None,
        }
    }

    /// Creates a builder from the `username`, `password`, `apikey`,
    /// `auth_url`, and `auth_disable_ssl` properties.
    pub fn from_properties(props: &HashMap<String, String>) -> BuildResult<Self> {
        let username =
            properties::get(props, USERNAME).ok_or(BuilderError::missing_field(USERNAME))?;
        let get = |key: &str| properties::get(props, key).map(str::to_string);
        Ok(Self {
            password: get(PASSWORD),
            api_key: get(APIKEY),
            url: get(AUTH_URL),
            disable_ssl_verification: properties::get_bool(props, AUTH_DISABLE_SSL),
            ..Self::new(username)
        })
    }

    /// Authenticates with a password.
    pub fn with_password<T: Into<String>>(mut self, v: T) -> Self {
        self.password = Some(v.into());
        self
    }

    /// Authenticates with an API key.
    pub fn with_api_key<T: Into<String>>(mut self, v: T) -> Self {
        self.api_key = Some(v.into());
        self
    }

    /// Sets the URL of the authorization endpoint.
    pub fn with_url<T: Into<String>>(mut self, v: T) -> Self {
        self.url = Some(v.into());
        self
    }

    /// Disables TLS certificate verification for the authorization endpoint.
    pub fn with_disable_ssl_verification(mut self, v: bool) -> Self {
        self.disable_ssl_verification = v;
        self
    }

    /// Adds headers to the authorization requests.
    pub fn with_headers(mut self, v: HeaderMap) -> Self {
        self.headers = v;
        self
    }

    /// Uses a fixed session token instead of fetching one.
    pub fn with_access_token<T: Into<String>>(mut self, v: T) -> Self {
        self.access_token = Some(v.into());
        self
    }

    /// Returns an [Authenticator] with the configured settings.
    pub fn build(self) -> BuildResult<Authenticator> {
        require(USERNAME, &self.username)?;
        let url = self
            .url
            .filter(|u| !u.is_empty())
            .ok_or(BuilderError::missing_field("url"))?;
        let secret = match (self.password, self.api_key) {
            (Some(p), None) => {
                check_value(PASSWORD, &p)?;
                Secret::Password(p)
            }
            (None, Some(k)) => {
                check_value(APIKEY, &k)?;
                Secret::ApiKey(k)
            }
            _ => {
                return Err(BuilderError::invalid_configuration(
                    "exactly one of the password or the API key must be set",
                ));
            }
        };
        let client = TokenClient::new(url, self.disable_ssl_verification, self.headers)?;
        let source = SessionSource {
            client,
            username: self.username,
            secret,
        };
        let access_token = self.access_token.filter(|t| !t.is_empty());
        Ok(Authenticator::Session(SessionAuthenticator {
            inner: CachedToken::new(source, access_token),
        }))
    }
}

impl std::fmt::Debug for Builder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Builder")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "[censored]"))
            .field("api_key", &self.api_key.as_ref().map(|_| "[censored]"))
            .field("url", &self.url)
            .field("disable_ssl_verification", &self.disable_ssl_verification)
            .field("headers", &self.headers)
            .field("access_token", &self.access_token.as_ref().map(|_| "[censored]"))
            .finish()
    }
}
