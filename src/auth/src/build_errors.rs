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

//! Errors created during authenticator construction.
//!
//! Builders validate their configuration before any network call is made.
//! Invalid configurations are never retried.

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The error type for [Authenticator] builders.
///
/// Applications rarely need to create instances of this error type. The
/// exception might be when testing application code, where the application is
/// mocking a client library behavior.
///
/// [Authenticator]: super::credentials::Authenticator
#[derive(thiserror::Error, Debug)]
#[error(transparent)]
pub struct Error(ErrorKind);

/// A `Result` alias where the `Err` case is [Error].
pub type BuildResult<T> = std::result::Result<T, Error>;

impl Error {
    /// A required field was missing, or empty.
    pub fn is_missing_field(&self) -> bool {
        matches!(self.0, ErrorKind::MissingField(_))
    }

    /// The configuration is invalid, e.g., mutually exclusive fields are set.
    pub fn is_invalid_configuration(&self) -> bool {
        matches!(self.0, ErrorKind::InvalidConfiguration(_))
    }

    /// A required field was missing from the builder.
    pub(crate) fn missing_field(field: &'static str) -> Error {
        Error(ErrorKind::MissingField(field))
    }

    /// The builder configuration is invalid.
    pub(crate) fn invalid_configuration<T>(source: T) -> Error
    where
        T: Into<BoxError>,
    {
        Error(ErrorKind::InvalidConfiguration(source.into()))
    }
}

#[derive(thiserror::Error, Debug)]
enum ErrorKind {
    #[error("missing required field: {0}")]
    MissingField(&'static str),
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(#[source] BoxError),
}

/// Rejects empty values.
pub(crate) fn require(field: &'static str, value: &str) -> BuildResult<()> {
    if value.is_empty() {
        return Err(Error::missing_field(field));
    }
    check_value(field, value)
}

/// Rejects values wrapped in braces or quotes.
///
/// These are a common mistake when copying values from JSON documents or
/// templates.
pub(crate) fn check_value(field: &'static str, value: &str) -> BuildResult<()> {
    let wrapped = |open: char, close: char| {
        value.len() >= 2 && value.starts_with(open) && value.ends_with(close)
    };
    if wrapped('{', '}') || wrapped('"', '"') {
        return Err(Error::invalid_configuration(format!(
            "the {field} value cannot start or end with curly brackets or quotes, please remove them"
        )));
    }
    Ok(())
}

/// Validates an optional value, ignoring `None`.
pub(crate) fn check_optional(field: &'static str, value: Option<&str>) -> BuildResult<()> {
    value.map_or(Ok(()), |v| check_value(field, v))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;
    use test_case::test_case;

    #[test]
    fn constructors() {
        let error = Error::missing_field("test field");
        assert!(error.is_missing_field(), "{error:?}");
        assert!(!error.is_invalid_configuration(), "{error:?}");
        assert!(error.source().is_none(), "{error:?}");
        assert!(error.to_string().contains("test field"), "{error}");

        let error = Error::invalid_configuration("test message");
        assert!(error.is_invalid_configuration(), "{error:?}");
        assert!(!error.is_missing_field(), "{error:?}");
        assert!(error.source().is_some(), "{error:?}");
        assert!(error.to_string().contains("test message"), "{error}");
    }

    #[test_case("{apikey}")]
    #[test_case("\"apikey\"")]
    #[test_case("{}")]
    fn wrapped_values(value: &str) {
        let got = check_value("apikey", value);
        assert!(
            matches!(&got, Err(e) if e.is_invalid_configuration()),
            "{got:?}"
        );
        assert!(got.unwrap_err().to_string().contains("apikey"));
    }

    #[test_case("apikey")]
    #[test_case("{apikey")]
    #[test_case("api\"key\"")]
    #[test_case("\"")]
    fn valid_values(value: &str) {
        assert!(check_value("apikey", value).is_ok(), "{value}");
    }

    #[test]
    fn required() {
        let got = require("apikey", "");
        assert!(matches!(&got, Err(e) if e.is_missing_field()), "{got:?}");
        assert!(require("apikey", "abc").is_ok());
        assert!(check_optional("scope", None).is_ok());
        assert!(check_optional("scope", Some("{x}")).is_err());
    }
}
