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

//! Reads JWT claims **without** verifying the token signature.
//!
//! Token endpoints sometimes return a JWT without an explicit expiration. The
//! authenticators read the `exp` and `iat` claims only to schedule the next
//! refresh. Nothing in this module authenticates the token, and the claims
//! must never be used to make trust decisions.

use crate::Result;
use crate::errors;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;

/// The claims used to schedule token refreshes.
#[derive(Clone, Debug, Default, PartialEq, serde::Deserialize)]
pub(crate) struct UnverifiedClaims {
    pub exp: Option<i64>,
    pub iat: Option<i64>,
}

/// Decodes the payload of `token`, ignoring the header and the signature.
///
/// This function does not validate the signature.
pub(crate) fn read_unverified_claims(token: &str) -> Result<UnverifiedClaims> {
    let mut parts = token.split('.');
    let payload = match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(_), Some(payload), Some(_), None) => payload,
        _ => {
            return Err(errors::non_transient_from_str(
                "the access token is not a JWT: expected three dot-separated segments",
            ));
        }
    };
    let payload = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(errors::non_transient)?;
    serde_json::from_slice::<UnverifiedClaims>(&payload).map_err(errors::non_transient)
}
