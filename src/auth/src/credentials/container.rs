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

//! Compute resource token authentication.
//!
//! Workloads running in a container cluster receive a compute resource token
//! in a file, which the platform refreshes periodically. These authenticators
//! read the file on every refresh, and exchange its contents for an access
//! token of a trusted profile.

use crate::Result;
use crate::build_errors::{BuildResult, Error as BuilderError, check_optional};
use crate::constants::{
    CR_TOKEN_GRANT_TYPE, DEFAULT_CR_TOKEN_FILENAME, DEFAULT_IAM_URL, FALLBACK_CR_TOKEN_FILENAME,
    IAM_TOKEN_PATH,
};
use crate::credentials::profile::{Profile, ProfileFields};
use crate::credentials::{Authenticator, CachedToken, client_auth};
use crate::errors;
use crate::http::TokenClient;
use crate::properties::{
    self, AUTH_DISABLE_SSL, AUTH_URL, CLIENT_ID, CLIENT_SECRET, CR_TOKEN_FILENAME, SCOPE,
};
use crate::token::{TokenData, TokenResponse, TokenSource, now};
use http::header::{ACCEPT, AUTHORIZATION};
use http::{HeaderMap, HeaderValue};
use std::collections::HashMap;
use std::path::PathBuf;

/// Obtains access tokens in exchange for a compute resource token.
#[derive(Clone, Debug)]
pub struct ContainerAuthenticator {
    pub(crate) inner: CachedToken<ContainerSource>,
}

impl ContainerAuthenticator {
    /// Returns a valid access token, fetching a new one if needed.
    pub async fn token(&self) -> Result<String> {
        self.inner.token().await
    }
}

#[derive(Debug)]
pub(crate) struct ContainerSource {
    client: TokenClient,
    // Tried in order, the first readable file wins.
    filenames: Vec<PathBuf>,
    profile: Profile,
    client_auth: Option<HeaderValue>,
    scope: Option<String>,
}

impl ContainerSource {
    async fn read_cr_token(&self) -> Result<String> {
        let mut last_error = None;
        for filename in &self.filenames {
            match tokio::fs::read_to_string(filename).await {
                Ok(contents) => {
                    let token = contents.trim();
                    if token.is_empty() {
                        return Err(errors::non_transient_from_str(format!(
                            "the compute resource token file {} is empty",
                            filename.display()
                        )));
                    }
                    return Ok(token.to_string());
                }
                Err(e) => {
                    tracing::debug!("cannot read compute resource token from {filename:?}: {e}");
                    last_error = Some((filename, e));
                }
            }
        }
        let (filename, e) = last_error.ok_or_else(|| {
            errors::non_transient_from_str("no compute resource token file is configured")
        })?;
        Err(errors::CredentialsError::new(
            false,
            format!(
                "cannot read the compute resource token from {}",
                filename.display()
            ),
            e,
        ))
    }
}

#[async_trait::async_trait]
impl TokenSource for ContainerSource {
    async fn fetch(&self) -> Result<TokenData> {
        let cr_token = self.read_cr_token().await?;
        let mut form = vec![
            ("grant_type", CR_TOKEN_GRANT_TYPE),
            ("cr_token", cr_token.as_str()),
        ];
        form.extend(self.profile.form_fields());
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

/// A builder for compute resource token authenticators.
///
/// Exactly one of the profile id, the profile CRN, or the profile name must
/// be set.
///
/// # Example
/// ```
/// # use platform_sdk_auth::credentials::container::Builder;
/// let authenticator = Builder::new()
///     .with_profile_name("my-profile")
///     .build()?;
/// # Ok::<(), anyhow::Error>(())
/// ```
#[derive(Default)]
pub struct Builder {
    cr_token_filename: Option<PathBuf>,
    profile: ProfileFields,
    client_id: Option<String>,
    client_secret: Option<String>,
    scope: Option<String>,
    url: Option<String>,
    disable_ssl_verification: bool,
    headers: HeaderMap,
}

impl Builder {
    /// Creates a new builder.
    ///
    /// Unless configured, the compute resource token is read from
    /// `/var/run/secrets/tokens/vault-token`, or from
    /// `/var/run/secrets/tokens/sa-token` if the former does not exist.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a builder from the `cr_token_filename`, `profile_id`,
    /// `profile_crn`, `profile_name`, `client_id`, `client_secret`, `scope`,
    /// `auth_url`, and `auth_disable_ssl` properties.
    pub fn from_properties(props: &HashMap<String, String>) -> BuildResult<Self> {
        let get = |key: &str| properties::get(props, key).map(str::to_string);
        Ok(Self {
            cr_token_filename: get(CR_TOKEN_FILENAME).map(PathBuf::from),
            profile: ProfileFields::from_properties(props),
            client_id: get(CLIENT_ID),
            client_secret: get(CLIENT_SECRET),
            scope: get(SCOPE),
            url: get(AUTH_URL),
            disable_ssl_verification: properties::get_bool(props, AUTH_DISABLE_SSL),
            headers: HeaderMap::new(),
        })
    }

    /// Reads the compute resource token from this file.
    pub fn with_cr_token_filename<T: Into<PathBuf>>(mut self, v: T) -> Self {
        self.cr_token_filename = Some(v.into());
        self
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
    pub fn with_profile_name<T: Into<String>>(mut self, v: T) -> Self {
        self.profile.name = Some(v.into());
        self
    }

    /// Sets the client id sent to the token server.
    pub fn with_client_id<T: Into<String>>(mut self, v: T) -> Self {
        self.client_id = Some(v.into());
        self
    }

    /// Sets the client secret sent to the token server.
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
    pub fn with_headers(mut self, v: HeaderMap) -> Self {
        self.headers = v;
        self
    }

    /// Returns an [Authenticator] with the configured settings.
    ///
    /// Fails if the profile selector is missing or ambiguous, or if only one
    /// of the client id and secret is set.
    pub fn build(self) -> BuildResult<Authenticator> {
        let profile = self.profile.require()?;
        if let Profile::Name {
            account: Some(_), ..
        } = &profile
        {
            return Err(BuilderError::invalid_configuration(
                "the account is not used with compute resource tokens",
            ));
        }
        check_optional(SCOPE, self.scope.as_deref())?;
        let client_auth = client_auth(self.client_id.as_deref(), self.client_secret.as_deref())?;
        let filenames = match self.cr_token_filename {
            Some(f) => vec![f],
            None => vec![
                PathBuf::from(DEFAULT_CR_TOKEN_FILENAME),
                PathBuf::from(FALLBACK_CR_TOKEN_FILENAME),
            ],
        };
        let client = TokenClient::new(
            self.url.unwrap_or_else(|| DEFAULT_IAM_URL.to_string()),
            self.disable_ssl_verification,
            self.headers,
        )?;
        let source = ContainerSource {
            client,
            filenames,
            profile,
            client_auth,
            scope: self.scope,
        };
        Ok(Authenticator::Container(ContainerAuthenticator {
            inner: CachedToken::new(source, None),
        }))
    }
}

impl std::fmt::Debug for Builder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Builder")
            .field("cr_token_filename", &self.cr_token_filename)
            .field("profile", &self.profile)
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret.as_ref().map(|_| "[censored]"))
            .field("scope", &self.scope)
            .field("url", &self.url)
            .field("disable_ssl_verification", &self.disable_ssl_verification)
            .field("headers", &self.headers)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::AUTHTYPE_CONTAINER;
    use crate::credentials::tests::authorization;
    use httptest::matchers::{all_of, contains, request, url_decoded};
    use httptest::responders::json_encoded;
    use httptest::{Expectation, Server};
    use sdk_core::authenticate::Authenticate;
    use serde_json::json;
    use std::io::Write;

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

    #[tokio::test]
    async fn exchange_cr_token() -> TestResult {
        let mut file = tempfile::NamedTempFile::new()?;
        writeln!(file, "test-cr-token")?;

        let server = Server::run();
        server.expect(
            Expectation::matching(all_of![
                request::method_path("POST", IAM_TOKEN_PATH),
                request::body(url_decoded(contains(("grant_type", CR_TOKEN_GRANT_TYPE)))),
                request::body(url_decoded(contains(("cr_token", "test-cr-token")))),
                request::body(url_decoded(contains(("profile_name", "test-profile")))),
            ])
            .times(1)
            .respond_with(json_encoded(token_response("test-access-token"))),
        );

        let authenticator = Builder::new()
            .with_cr_token_filename(file.path())
            .with_profile_name("test-profile")
            .with_url(server.url_str(""))
            .build()?;
        assert_eq!(authenticator.authentication_type(), AUTHTYPE_CONTAINER);
        assert_eq!(
            authorization(&authenticator).await?.as_deref(),
            Some("Bearer test-access-token")
        );
        Ok(())
    }

    #[tokio::test]
    async fn missing_file() -> TestResult {
        let dir = tempfile::tempdir()?;
        let authenticator = Builder::new()
            .with_cr_token_filename(dir.path().join("missing"))
            .with_profile_id("test-id")
            .build()?;
        let err = authenticator.token().await.unwrap_err();
        assert!(!err.is_transient(), "{err:?}");
        assert!(err.to_string().contains("missing"), "{err}");
        Ok(())
    }

    #[tokio::test]
    async fn empty_file() -> TestResult {
        let file = tempfile::NamedTempFile::new()?;
        let authenticator = Builder::new()
            .with_cr_token_filename(file.path())
            .with_profile_id("test-id")
            .build()?;
        let err = authenticator.token().await.unwrap_err();
        assert!(err.to_string().contains("empty"), "{err}");
        Ok(())
    }

    #[tokio::test]
    async fn fallback_file() -> TestResult {
        let dir = tempfile::tempdir()?;
        let fallback = dir.path().join("sa-token");
        std::fs::write(&fallback, "fallback-cr-token")?;
        let source = ContainerSource {
            client: TokenClient::new("http://127.0.0.1:1", false, HeaderMap::new())?,
            filenames: vec![dir.path().join("vault-token"), fallback],
            profile: Profile::Id("test-id".into()),
            client_auth: None,
            scope: None,
        };
        assert_eq!(source.read_cr_token().await?, "fallback-cr-token");
        Ok(())
    }

    #[tokio::test]
    async fn first_readable_file_wins() -> TestResult {
        let dir = tempfile::tempdir()?;
        let primary = dir.path().join("vault-token");
        let fallback = dir.path().join("sa-token");
        std::fs::write(&primary, "primary-cr-token\n")?;
        std::fs::write(&fallback, "fallback-cr-token")?;
        let source = ContainerSource {
            client: TokenClient::new("http://127.0.0.1:1", false, HeaderMap::new())?,
            filenames: vec![primary, fallback],
            profile: Profile::Id("test-id".into()),
            client_auth: None,
            scope: None,
        };
        assert_eq!(source.read_cr_token().await?, "primary-cr-token");
        Ok(())
    }

    #[tokio::test]
    async fn no_files() -> TestResult {
        let source = ContainerSource {
            client: TokenClient::new("http://127.0.0.1:1", false, HeaderMap::new())?,
            filenames: Vec::new(),
            profile: Profile::Id("test-id".into()),
            client_auth: None,
            scope: None,
        };
        let err = source.read_cr_token().await.unwrap_err();
        assert!(!err.is_transient(), "{err:?}");
        assert!(err.to_string().contains("no compute resource token file"), "{err}");
        Ok(())
    }

    #[test]
    fn validation() {
        let got = Builder::new().build();
        assert!(
            matches!(&got, Err(e) if e.is_invalid_configuration()),
            "{got:?}"
        );
        let got = Builder::new()
            .with_profile_id("id")
            .with_profile_name("name")
            .build();
        assert!(
            matches!(&got, Err(e) if e.is_invalid_configuration()),
            "{got:?}"
        );
        let got = Builder::new()
            .with_profile_id("id")
            .with_client_secret("secret")
            .build();
        assert!(
            matches!(&got, Err(e) if e.is_invalid_configuration()),
            "{got:?}"
        );
    }

    #[test]
    fn from_properties() -> TestResult {
        let props = HashMap::from(
            [
                ("profile_crn", "test-crn"),
                ("cr_token_filename", "/tmp/test-only"),
            ]
            .map(|(k, v)| (k.to_string(), v.to_string())),
        );
        let builder = Builder::from_properties(&props)?;
        assert_eq!(
            builder.cr_token_filename.as_deref(),
            Some(std::path::Path::new("/tmp/test-only"))
        );
        let authenticator = builder.build()?;
        assert!(matches!(authenticator, Authenticator::Container(_)));
        Ok(())
    }
}
