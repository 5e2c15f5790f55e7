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

use crate::Result;
use crate::build_errors::{BuildResult, Error as BuilderError};
use crate::constants::TOKEN_REQUEST_TIMEOUT;
use crate::errors::{self, CredentialsError, HttpError};
use http::HeaderMap;

/// Sends requests to a token endpoint.
///
/// The underlying `reqwest::Client` is created once and shared by all the
/// requests (and all the clones) of the token source.
#[derive(Clone, Debug)]
pub(crate) struct TokenClient {
    inner: reqwest::Client,
    url: String,
    headers: HeaderMap,
}

impl TokenClient {
    /// Creates a client for the token server at `url`.
    ///
    /// The `headers` are added to every request, replacing any header with
    /// the same name set by the token source.
    pub(crate) fn new<U: Into<String>>(
        url: U,
        disable_ssl_verification: bool,
        headers: HeaderMap,
    ) -> BuildResult<Self> {
        let url = url.into();
        url::Url::parse(&url).map_err(BuilderError::invalid_configuration)?;
        let inner = sdk_core::http_client::new_reqwest_client(
            disable_ssl_verification,
            Some(TOKEN_REQUEST_TIMEOUT),
        )
        .map_err(BuilderError::invalid_configuration)?;
        Ok(Self {
            inner,
            url: url.trim_end_matches('/').to_string(),
            headers,
        })
    }

    /// Starts a request for `path` on the token server.
    ///
    /// Some applications configure the full URL of the token endpoint, in
    /// that case `path` is not appended again.
    pub(crate) fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let url = if self.url.ends_with(path) {
            self.url.clone()
        } else {
            format!("{}{path}", self.url)
        };
        self.inner.request(method, url)
    }

    /// Sends the request and decodes the JSON response.
    pub(crate) async fn execute<O>(&self, builder: reqwest::RequestBuilder) -> Result<O>
    where
        O: serde::de::DeserializeOwned,
    {
        let builder = builder.headers(self.headers.clone());
        let response = builder.send().await.map_err(errors::from_send_error)?;
        let status = response.status();
        tracing::debug!(
            status = status.as_u16(),
            url = %response.url(),
            "token endpoint response"
        );
        if !status.is_success() {
            return Err(to_credentials_error(response).await);
        }
        let body = response.bytes().await.map_err(errors::transient)?;
        serde_json::from_slice::<O>(&body).map_err(|e| {
            CredentialsError::new(false, "cannot decode the token endpoint response", e)
        })
    }
}

async fn to_credentials_error(response: reqwest::Response) -> CredentialsError {
    let status = response.status();
    let headers = response.headers().clone();
    match response.bytes().await {
        Ok(body) => {
            let payload = (!body.is_empty()).then_some(body);
            CredentialsError::from_http_error(HttpError::new(status.as_u16(), headers, payload))
        }
        Err(e) => CredentialsError::new(
            errors::is_transient(status),
            format!("cannot read the token endpoint error response, status={status}"),
            e,
        ),
    }
}
