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

//! Instance metadata service authentication.
//!
//! Applications running on a compute instance can use the identity of the
//! instance, without any secrets in their configuration. These authenticators
//! make two requests to the metadata service on each refresh:
//!
//! 1. Obtain an instance identity token.
//! 2. Exchange the instance identity token for an access token, optionally
//!    for a trusted profile linked to the instance.

use crate::Result;
use crate::build_errors::{BuildResult, Error as BuilderError};
use crate::constants::{
    DEFAULT_METADATA_URL, INSTANCE_TOKEN_LIFETIME, METADATA_FLAVOR_HEADER, METADATA_FLAVOR_VALUE,
    METADATA_IAM_TOKEN_PATH, METADATA_INSTANCE_TOKEN_PATH, METADATA_VERSION,
};
use crate::credentials::profile::{Profile, ProfileFields};
use crate::credentials::{Authenticator, CachedToken};
use crate::headers_util::bearer_value;
use crate::http::TokenClient;
use crate::properties::{self, AUTH_URL};
use crate::token::{TokenData, TokenResponse, TokenSource, now};
use http::header::{ACCEPT, AUTHORIZATION};
use http::HeaderMap;
use serde_json::json;
use std::collections::HashMap;

/// Obtains access tokens using the identity of the compute instance.
#[derive(Clone, Debug)]
pub struct InstanceMetadataAuthenticator {
    pub(crate) inner: CachedToken<MetadataSource>,
}

impl InstanceMetadataAuthenticator {
    /// Returns a valid access token, fetching a new one if needed.
    pub async fn token(&self) -> Result<String> {
        self.inner.token().await
    }
}

#[derive(Debug)]
pub(crate) struct MetadataSource {
    client: TokenClient,
    profile: Option<Profile>,
}

#[derive(serde::Deserialize)]
struct InstanceIdentityToken {
    access_token: String,
}

impl MetadataSource {
    async fn instance_identity_token(&self) -> Result<String> {
        let builder = self
            .client
            .request(reqwest::Method::PUT, METADATA_INSTANCE_TOKEN_PATH)
            .query(&[("version", METADATA_VERSION)])
            .header(METADATA_FLAVOR_HEADER, METADATA_FLAVOR_VALUE)
            .header(ACCEPT, "application/json")
            .json(&json!({"expires_in": INSTANCE_TOKEN_LIFETIME}));
        let response = self.client.execute::<InstanceIdentityToken>(builder).await?;
        Ok(response.access_token)
    }
}

#[async_trait::async_trait]
impl TokenSource for MetadataSource {
    async fn fetch(&self) -> Result<TokenData> {
        let instance_token = self.instance_identity_token().await?;
        let builder = self
            .client
            .request(reqwest::Method::POST, METADATA_IAM_TOKEN_PATH)
            .query(&[("version", METADATA_VERSION)])
            .header(ACCEPT, "application/json")
            .header(AUTHORIZATION, bearer_value(&instance_token)?);
        let builder = match &self.profile {
            None => builder,
            Some(Profile::Id(id)) => builder.json(&json!({"trusted_profile": {"id": id}})),
            Some(Profile::Crn(crn)) => builder.json(&json!({"trusted_profile": {"crn": crn}})),
            // Rejected by the builder.
            Some(Profile::Name { .. }) => builder,
        };
        let response = self.client.execute::<TokenResponse>(builder).await?;
        response.into_token_data(now())
    }
}

/// A builder for instance metadata authenticators.
///
/// # Example
/// ```
/// # use platform_sdk_auth::credentials::instance_metadata::Builder;
/// let authenticator = Builder::new()
///     .with_profile_id("my-profile-id")
///     .build()?;
/// # Ok::<(), anyhow::Error>(())
/// ```
#[derive(Debug, Default)]
pub struct Builder {
    profile: ProfileFields,
    url: Option<String>,
    headers: HeaderMap,
}

impl Builder {
    /// Creates a new builder, using the identity of the instance.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a builder from the `profile_id`, `profile_crn`, and `auth_url`
    /// properties.
    pub fn from_properties(props: &HashMap<String, String>) -> BuildResult<Self> {
        Ok(Self {
            profile: ProfileFields::from_properties(props),
            url: properties::get(props, AUTH_URL).map(str::to_string),
            headers: HeaderMap::new(),
        })
    }

    /// Uses the trusted profile with the given id.
    pub fn with_profile_id<T: Into<String>>(mut self, v: T) -> Self {
        self.profile.id = Some(v.into());
        self
    }

    /// Uses the trusted profile with the given CRN.
    pub fn with_profile_crn<T: Into<String>>(mut self, v: T) -> Self {
        self.profile.crn = Some(v.into());
        self
    }

    /// Overrides the metadata service URL.
    pub fn with_url<T: Into<String>>(mut self, v: T) -> Self {
        self.url = Some(v.into());
        self
    }

    /// Adds headers to the metadata service requests.
    pub fn with_headers(mut self, v: HeaderMap) -> Self {
        self.headers = v;
        self
    }

    /// Returns an [Authenticator] with the configured settings.
    ///
    /// Fails if both the profile id and CRN are set. Profiles cannot be
    /// selected by name.
    pub fn build(self) -> BuildResult<Authenticator> {
        let profile = self.profile.select()?;
        if let Some(Profile::Name { .. }) = profile {
            return Err(BuilderError::invalid_configuration(
                "the instance metadata service selects trusted profiles by id or CRN, not by name",
            ));
        }
        let client = TokenClient::new(
            self.url
                .unwrap_or_else(|| DEFAULT_METADATA_URL.to_string()),
            false,
            self.headers,
        )?;
        let source = MetadataSource { client, profile };
        Ok(Authenticator::InstanceMetadata(
            InstanceMetadataAuthenticator {
                inner: CachedToken::new(source, None),
            },
        ))
    }
}
