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
use crate::errors;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use http::HeaderMap;
use http::header::{AUTHORIZATION, HeaderValue};

/// Creates the value for an `Authorization: Bearer` header.
pub(crate) fn bearer_value(token: &str) -> Result<HeaderValue> {
    sensitive(format!("Bearer {token}"))
}

/// Creates the value for an `Authorization: Basic` header.
pub(crate) fn basic_value(username: &str, password: &str) -> Result<HeaderValue> {
    let encoded = STANDARD.encode(format!("{username}:{password}"));
    sensitive(format!("Basic {encoded}"))
}

/// Sets the `Authorization` header, replacing any previous value.
pub(crate) fn set_authorization(headers: &mut HeaderMap, value: HeaderValue) {
    headers.insert(AUTHORIZATION, value);
}

fn sensitive(value: String) -> Result<HeaderValue> {
    let mut value = HeaderValue::from_str(&value).map_err(errors::non_transient)?;
    value.set_sensitive(true);
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearer() -> anyhow::Result<()> {
        let value = bearer_value("test-token")?;
        assert_eq!(value, HeaderValue::from_static("Bearer test-token"));
        assert!(value.is_sensitive());
        Ok(())
    }

    #[test]
    fn basic() -> anyhow::Result<()> {
        let value = basic_value("Aladdin", "open sesame")?;
        assert_eq!(
            value,
            HeaderValue::from_static("Basic QWxhZGRpbjpvcGVuIHNlc2FtZQ==")
        );
        assert!(value.is_sensitive());
        Ok(())
    }

    #[test]
    fn invalid_characters() {
        let got = bearer_value("bad\ntoken");
        assert!(matches!(&got, Err(e) if !e.is_transient()), "{got:?}");
    }

    #[test]
    fn replaces_authorization() -> anyhow::Result<()> {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer old"));
        set_authorization(&mut headers, bearer_value("new")?);
        assert_eq!(headers.get_all(AUTHORIZATION).iter().count(), 1);
        assert_eq!(headers.get(AUTHORIZATION), Some(&HeaderValue::from_static("Bearer new")));
        Ok(())
    }
}
