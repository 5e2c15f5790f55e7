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

use super::{CredentialsError, HttpError};
use http::HeaderMap;
use std::error::Error as StdError;

type BoxError = Box<dyn StdError + Send + Sync>;

/// The core error returned by the request pipeline.
///
/// Requests fail for several reasons. The server may return a non-2xx
/// response, the transport may be unable to connect, the call context may be
/// cancelled or reach its deadline, or the authenticator may be unable to
/// produce credentials. This type offers a series of predicates to determine
/// the error kind, and accessors for the most common details. Applications
/// can query the error [source][std::error::Error::source] for deeper
/// information.
///
/// # Example
/// ```
/// use platform_sdk_core::error::Error;
/// match example_function() {
///     Err(e) if e.http_status_code() == Some(404) => {
///         println!("not found {e}");
///     },
///     Err(e) if e.is_timeout() || e.is_cancelled() => { println!("gave up {e}"); },
///     Err(e) => { println!("some other error {e}"); },
///     Ok(_) => { println!("success, how boring"); },
/// }
///
/// fn example_function() -> Result<String, Error> {
///     // ... details omitted ...
///     # use platform_sdk_core::error::HttpError;
///     # Err(Error::http(HttpError::new(404, http::HeaderMap::new(), None)))
/// }
/// ```
#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    source: Option<BoxError>,
}

impl Error {
    /// Creates an error from a non-2xx HTTP response.
    ///
    /// # Example
    /// ```
    /// use platform_sdk_core::error::{Error, HttpError};
    /// let error = Error::http(HttpError::new(400, http::HeaderMap::new(), Some("uh-oh".into())));
    /// assert_eq!(error.http_status_code(), Some(400));
    /// assert!(error.to_string().contains("uh-oh"));
    /// ```
    pub fn http(error: HttpError) -> Self {
        Self {
            kind: ErrorKind::Http(Box::new(error)),
            source: None,
        }
    }

    /// The server returned a non-2xx response.
    pub fn is_http(&self) -> bool {
        matches!(self.kind, ErrorKind::Http(_))
    }

    /// The [HttpError] associated with this error, if any.
    pub fn as_http(&self) -> Option<&HttpError> {
        match &self.kind {
            ErrorKind::Http(e) => Some(e.as_ref()),
            _ => None,
        }
    }

    /// The HTTP status code, if any, associated with this error.
    ///
    /// Authentication errors caused by a token endpoint returning a non-2xx
    /// response also report the status code of that response.
    pub fn http_status_code(&self) -> Option<u16> {
        self.http_details().map(HttpError::status_code)
    }

    /// The HTTP headers, if any, associated with this error.
    pub fn http_headers(&self) -> Option<&HeaderMap> {
        self.http_details().map(HttpError::headers)
    }

    /// The HTTP payload, if any, associated with this error.
    pub fn http_payload(&self) -> Option<&bytes::Bytes> {
        self.http_details().and_then(HttpError::payload)
    }

    fn http_details(&self) -> Option<&HttpError> {
        match &self.kind {
            ErrorKind::Http(e) => Some(e.as_ref()),
            ErrorKind::Authentication => self
                .source
                .as_ref()
                .and_then(|e| e.downcast_ref::<CredentialsError>())
                .and_then(CredentialsError::http_error),
            _ => None,
        }
    }

    /// Creates an error representing a failure to obtain or apply credentials.
    ///
    /// The request is never sent when this happens.
    pub fn authentication(source: CredentialsError) -> Self {
        Self {
            kind: ErrorKind::Authentication,
            source: Some(source.into()),
        }
    }

    /// The authenticator could not produce the credentials for the request.
    ///
    /// # Troubleshooting
    ///
    /// Inspect the source [CredentialsError]. If the token endpoint rejected
    /// the credentials the error includes the endpoint response.
    pub fn is_authentication(&self) -> bool {
        matches!(self.kind, ErrorKind::Authentication)
    }

    /// Creates an error representing a transport failure.
    ///
    /// # Example
    /// ```
    /// use std::error::Error as _;
    /// use platform_sdk_core::error::Error;
    /// let error = Error::transport("connection reset");
    /// assert!(error.is_transport());
    /// assert!(error.source().is_some());
    /// ```
    pub fn transport<T: Into<BoxError>>(source: T) -> Self {
        Self {
            kind: ErrorKind::Transport,
            source: Some(source.into()),
        }
    }

    /// The request could not be sent, or the response could not be received.
    pub fn is_transport(&self) -> bool {
        matches!(self.kind, ErrorKind::Transport)
    }

    /// Creates an error representing a timeout.
    ///
    /// # Example
    /// ```
    /// use std::error::Error as _;
    /// use platform_sdk_core::error::Error;
    /// let error = Error::timeout("simulated timeout");
    /// assert!(error.is_timeout());
    /// assert!(error.source().is_some());
    /// ```
    pub fn timeout<T: Into<BoxError>>(source: T) -> Self {
        Self {
            kind: ErrorKind::Timeout,
            source: Some(source.into()),
        }
    }

    /// The request could not be completed before its deadline.
    ///
    /// This is always a client-side generated error. Note that the request may
    /// or may not have started, and it may or may not complete in the server.
    ///
    /// # Troubleshooting
    ///
    /// The most common cause of this problem is setting a timeout value that is
    /// based on the observed latency when the server is not under load.
    /// Consider increasing the timeout value to handle temporary latency
    /// increases too.
    pub fn is_timeout(&self) -> bool {
        matches!(self.kind, ErrorKind::Timeout)
    }

    /// Creates an error representing a cancelled call.
    ///
    /// # Example
    /// ```
    /// use platform_sdk_core::error::Error;
    /// let error = Error::cancelled("the application cancelled the call");
    /// assert!(error.is_cancelled());
    /// ```
    pub fn cancelled<T: Into<BoxError>>(source: T) -> Self {
        Self {
            kind: ErrorKind::Cancelled,
            source: Some(source.into()),
        }
    }

    /// The application cancelled the call.
    pub fn is_cancelled(&self) -> bool {
        matches!(self.kind, ErrorKind::Cancelled)
    }

    /// Creates an error representing a serialization problem.
    pub fn ser<T: Into<BoxError>>(source: T) -> Self {
        Self {
            kind: ErrorKind::Serialization,
            source: Some(source.into()),
        }
    }

    /// The request could not be serialized.
    pub fn is_serialization(&self) -> bool {
        matches!(self.kind, ErrorKind::Serialization)
    }

    /// Creates an error representing a deserialization problem.
    ///
    /// # Example
    /// ```
    /// use std::error::Error as _;
    /// use platform_sdk_core::error::Error;
    /// let error = Error::deser("simulated problem");
    /// assert!(error.is_deserialization());
    /// assert!(error.source().is_some());
    /// ```
    pub fn deser<T: Into<BoxError>>(source: T) -> Self {
        Self {
            kind: ErrorKind::Deserialization,
            source: Some(source.into()),
        }
    }

    /// The response could not be deserialized.
    pub fn is_deserialization(&self) -> bool {
        matches!(self.kind, ErrorKind::Deserialization)
    }

    #[doc(hidden)]
    pub fn other<T: Into<BoxError>>(source: T) -> Self {
        Self {
            kind: ErrorKind::Other,
            source: Some(source.into()),
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (&self.kind, &self.source) {
            (ErrorKind::Http(e), _) => write!(f, "the server reports an error: {e}"),
            (ErrorKind::Serialization, Some(e)) => write!(f, "cannot serialize the request {e}"),
            (ErrorKind::Deserialization, Some(e)) => {
                write!(f, "cannot deserialize the response {e}")
            }
            (ErrorKind::Authentication, Some(e)) => {
                write!(f, "cannot create the authentication headers {e}")
            }
            (ErrorKind::Timeout, Some(e)) => {
                write!(f, "the request exceeded the request deadline {e}")
            }
            (ErrorKind::Cancelled, Some(e)) => write!(f, "the request was cancelled {e}"),
            (ErrorKind::Transport, Some(e)) => write!(f, "the transport reports an error: {e}"),
            (ErrorKind::Other, Some(e)) => {
                write!(f, "an unclassified problem making a request: {e}")
            }
            (_, None) => write!(f, "an unclassified problem making a request"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.kind {
            ErrorKind::Http(e) => Some(e.as_ref() as &(dyn std::error::Error + 'static)),
            _ => self
                .source
                .as_ref()
                .map(|e| e.as_ref() as &(dyn std::error::Error + 'static)),
        }
    }
}

/// The type of error held by an [Error] instance.
#[derive(Debug)]
enum ErrorKind {
    Authentication,
    Http(Box<HttpError>),
    Transport,
    Timeout,
    Cancelled,
    Serialization,
    Deserialization,
    Other,
}
