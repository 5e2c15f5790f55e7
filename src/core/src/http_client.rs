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
use crate::authenticate::Authenticate;
use crate::call_context::CallContext;
use crate::error::{Error, HttpError};
use crate::options::ClientConfig;
use crate::response::{Parts, Response};
use crate::retry_executor::RetryExecutor;
use bytes::Bytes;
use http::HeaderMap;
use std::sync::Arc;
use std::time::Duration;

/// Creates the `reqwest::Client` shared by all requests of a client.
///
/// The token sources in the authentication libraries use the same settings
/// for their own endpoints.
pub fn new_reqwest_client(
    disable_ssl_verification: bool,
    timeout: Option<Duration>,
) -> reqwest::Result<reqwest::Client> {
    let builder = reqwest::Client::builder().danger_accept_invalid_certs(disable_ssl_verification);
    timeout
        .into_iter()
        .fold(builder, |b, t| b.timeout(t))
        .build()
}

/// Sends requests to a service endpoint.
///
/// Each request goes through the same steps:
/// 1. The default headers are added, unless the request already sets them.
/// 2. The authenticator adds the credentials. If this fails the request is
///    not sent.
/// 3. The request is sent, and retried per the [RetryExecutor].
/// 4. Non-2xx responses are converted to errors, successful responses are
///    decoded.
#[derive(Clone, Debug)]
pub struct ReqwestClient {
    inner: reqwest::Client,
    authenticator: Arc<dyn Authenticate>,
    endpoint: String,
    default_headers: HeaderMap,
    timeout: Option<Duration>,
    executor: RetryExecutor,
}

impl ReqwestClient {
    pub fn new<A>(config: ClientConfig, authenticator: A) -> Result<Self>
    where
        A: Authenticate + 'static,
    {
        let inner = new_reqwest_client(config.disable_ssl_verification, None)
            .map_err(Error::transport)?;
        let executor = config.backoff_policy.into_iter().fold(
            RetryExecutor::new()
                .with_max_retries(config.max_retries)
                .with_max_retry_interval(config.max_retry_interval),
            |e, p| e.with_backoff_policy(p),
        );
        Ok(Self {
            inner,
            authenticator: Arc::new(authenticator),
            endpoint: config.endpoint,
            default_headers: config.default_headers,
            timeout: config.timeout,
            executor,
        })
    }

    /// The type of credentials used by this client.
    pub fn authentication_type(&self) -> &'static str {
        self.authenticator.authentication_type()
    }

    /// Starts a request for `path`, relative to the endpoint.
    pub fn builder<P: AsRef<str>>(&self, method: reqwest::Method, path: P) -> reqwest::RequestBuilder {
        self.inner
            .request(method, format!("{}{}", self.endpoint, path.as_ref()))
    }

    /// Sends the request and decodes a JSON response.
    ///
    /// Empty response bodies decode as `O::default()`.
    pub async fn execute<O: serde::de::DeserializeOwned + Default>(
        &self,
        ctx: &CallContext,
        builder: reqwest::RequestBuilder,
    ) -> Result<Response<O>> {
        let (parts, body) = self.execute_bytes(ctx, builder).await?.into_parts();
        let body = if body.is_empty() {
            O::default()
        } else {
            serde_json::from_slice::<O>(&body).map_err(Error::deser)?
        };
        Ok(Response::from_parts(parts, body))
    }

    /// Sends the request and returns the raw response body.
    pub async fn execute_bytes(
        &self,
        ctx: &CallContext,
        builder: reqwest::RequestBuilder,
    ) -> Result<Response<Bytes>> {
        let mut request = builder.build().map_err(Error::ser)?;
        for key in self.default_headers.keys() {
            if request.headers().contains_key(key) {
                continue;
            }
            for value in self.default_headers.get_all(key) {
                request.headers_mut().append(key.clone(), value.clone());
            }
        }

        tokio::select! {
            biased;
            e = ctx.done() => return Err(e),
            r = self.authenticator.authenticate(request.headers_mut()) => {
                r.map_err(Error::authentication)?
            }
        };

        let inner = async |remaining: Option<Duration>| {
            let mut attempt = request
                .try_clone()
                .ok_or_else(|| Error::other("the request body cannot be cloned"))?;
            *attempt.timeout_mut() = effective_timeout(self.timeout, remaining);
            self.inner.execute(attempt).await.map_err(map_send_error)
        };
        let response = self.executor.invoke(ctx, inner).await?;
        if !response.status().is_success() {
            return Err(to_http_error(response).await);
        }
        to_bytes_response(response).await
    }
}

fn effective_timeout(attempt: Option<Duration>, remaining: Option<Duration>) -> Option<Duration> {
    match (attempt, remaining) {
        (None, None) => None,
        (None, Some(t)) | (Some(t), None) => Some(t),
        (Some(a), Some(r)) => Some(a.min(r)),
    }
}

fn map_send_error(err: reqwest::Error) -> Error {
    match err {
        e if e.is_timeout() => Error::timeout(e),
        e => Error::transport(e),
    }
}

/// Converts a non-2xx response into an error.
pub async fn to_http_error(response: reqwest::Response) -> Error {
    let status_code = response.status().as_u16();
    let headers = response.headers().clone();
    match response.bytes().await {
        Ok(body) => {
            let payload = (!body.is_empty()).then_some(body);
            tracing::debug!(status_code, "the server returned an error response");
            Error::http(HttpError::new(status_code, headers, payload))
        }
        Err(e) => map_send_error(e),
    }
}

async fn to_bytes_response(response: reqwest::Response) -> Result<Response<Bytes>> {
    let parts = Parts::new()
        .set_status(response.status())
        .set_headers(response.headers().clone());
    let body = response.bytes().await.map_err(map_send_error)?;
    Ok(Response::from_parts(parts, body))
}
