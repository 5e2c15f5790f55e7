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

//! Types and functions to work with access tokens.

use crate::Result;
use crate::constants::REFRESH_WINDOW_FRACTION;
use crate::errors;
use crate::jwt;

/// An access token and its expiration times.
///
/// Tokens are replaced, never modified, when they are refreshed.
#[derive(Clone, PartialEq)]
pub struct TokenData {
    /// The token value.
    ///
    /// This is the value used in the `Authorization:` header.
    pub access_token: String,

    /// The time (in seconds since the Unix epoch) when the token expires.
    ///
    /// The token must not be used after this time.
    pub expiration: i64,

    /// The time (in seconds since the Unix epoch) when the token should be
    /// refreshed.
    ///
    /// After this time the token is still usable, but a background refresh is
    /// started. This is never later than `expiration`.
    pub refresh_time: i64,
}

/// The state of a cached token at some point in time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenState {
    /// The token can be used as-is.
    Valid,
    /// The token can be used, but it should be refreshed.
    StaleButUsable,
    /// The token must not be used.
    Expired,
}

impl TokenData {
    /// Creates a new token, issued at `issued_at` and expiring at `expiration`.
    ///
    /// The refresh time is scheduled once 80% of the token lifetime elapses.
    ///
    /// # Example
    /// ```
    /// # use platform_sdk_auth::token::TokenData;
    /// let token = TokenData::new("test-token", 1_000, 4_600);
    /// assert_eq!(token.refresh_time, 4_600 - 720);
    /// ```
    pub fn new<T: Into<String>>(access_token: T, issued_at: i64, expiration: i64) -> Self {
        let lifetime = expiration.saturating_sub(issued_at).max(0);
        let window = (REFRESH_WINDOW_FRACTION * lifetime as f64) as i64;
        Self {
            access_token: access_token.into(),
            expiration,
            refresh_time: expiration.saturating_sub(window),
        }
    }

    /// Creates a token without a soft deadline.
    ///
    /// Such tokens are refreshed synchronously once they expire.
    pub fn without_refresh<T: Into<String>>(access_token: T, expiration: i64) -> Self {
        Self {
            access_token: access_token.into(),
            expiration,
            refresh_time: expiration,
        }
    }

    /// Creates a token from a JWT, using its `exp` and `iat` claims.
    ///
    /// The claims are read **without** validating the token signature. The
    /// result is only used to schedule refreshes.
    pub fn from_jwt<T: Into<String>>(access_token: T) -> Result<Self> {
        let access_token = access_token.into();
        let claims = jwt::read_unverified_claims(&access_token)?;
        let exp = claims.exp.ok_or_else(|| {
            errors::non_transient_from_str("the access token does not have an `exp` claim")
        })?;
        Ok(match claims.iat {
            Some(iat) => Self::new(access_token, iat, exp),
            None => Self::without_refresh(access_token, exp),
        })
    }

    /// Returns the state of the token at `now` (in seconds since the epoch).
    pub fn state(&self, now: i64) -> TokenState {
        if now >= self.expiration {
            TokenState::Expired
        } else if now >= self.refresh_time {
            TokenState::StaleButUsable
        } else {
            TokenState::Valid
        }
    }
}

impl std::fmt::Debug for TokenData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenData")
            .field("access_token", &"[censored]")
            .field("expiration", &self.expiration)
            .field("refresh_time", &self.refresh_time)
            .finish()
    }
}

/// The current time, in seconds since the Unix epoch.
pub(crate) fn now() -> i64 {
    time::OffsetDateTime::now_utc().unix_timestamp()
}

/// Fetches new tokens from a token endpoint.
#[async_trait::async_trait]
pub(crate) trait TokenSource: std::fmt::Debug + Send + Sync {
    async fn fetch(&self) -> Result<TokenData>;
}

/// The response from the IAM token endpoint.
#[derive(Clone, serde::Deserialize)]
pub(crate) struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub expiration: Option<i64>,
}

impl TokenResponse {
    /// Converts the response into a token.
    ///
    /// The lifetime comes from `expiration` and `expires_in` when the
    /// response includes them, and from the token claims otherwise.
    pub(crate) fn into_token_data(self, now: i64) -> Result<TokenData> {
        if self.access_token.is_empty() {
            return Err(errors::non_transient_from_str(
                "the token endpoint returned an empty access token",
            ));
        }
        match (self.expiration, self.expires_in) {
            (_, Some(expires_in)) if expires_in < 0 => Err(invalid_lifetime(expires_in)),
            (Some(expiration), Some(expires_in)) => {
                let issued_at = expiration
                    .checked_sub(expires_in)
                    .ok_or_else(|| invalid_lifetime(expires_in))?;
                Ok(TokenData::new(self.access_token, issued_at, expiration))
            }
            (None, Some(expires_in)) => {
                let expiration = now
                    .checked_add(expires_in)
                    .ok_or_else(|| invalid_lifetime(expires_in))?;
                Ok(TokenData::new(self.access_token, now, expiration))
            }
            _ => TokenData::from_jwt(self.access_token),
        }
    }
}

fn invalid_lifetime(expires_in: i64) -> errors::CredentialsError {
    errors::non_transient_from_str(format!(
        "the token endpoint returned an invalid token lifetime, expires_in={expires_in}"
    ))
}

impl std::fmt::Debug for TokenResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenResponse")
            .field("access_token", &"[censored]")
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "[censored]"))
            .field("token_type", &self.token_type)
            .field("expires_in", &self.expires_in)
            .field("expiration", &self.expiration)
            .finish()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::jwt::tests::fake_jwt;
    use serde_json::json;
    use test_case::test_case;

    // Used by tests in other modules.
    mockall::mock! {
        #[derive(Debug)]
        pub TokenSource { }

        #[async_trait::async_trait]
        impl TokenSource for TokenSource {
            async fn fetch(&self) -> Result<TokenData>;
        }
    }

    const E: i64 = 1_700_003_600;

    #[test]
    fn refresh_time() {
        let token = TokenData::new("test-token", E - 3600, E);
        assert_eq!(token.expiration, E);
        assert_eq!(token.refresh_time, E - 720);
    }

    #[test]
    fn refresh_time_bad_lifetime() {
        let token = TokenData::new("test-token", E + 10, E);
        assert_eq!(token.refresh_time, E);
    }

    #[test_case(E - 3000, TokenState::Valid)]
    #[test_case(E - 720, TokenState::StaleButUsable)]
    #[test_case(E - 1, TokenState::StaleButUsable)]
    #[test_case(E, TokenState::Expired)]
    #[test_case(E + 1, TokenState::Expired)]
    fn state(now: i64, want: TokenState) {
        let token = TokenData::new("test-token", E - 3600, E);
        assert_eq!(token.state(now), want);
    }

    #[test]
    fn without_refresh_state() {
        let token = TokenData::without_refresh("test-token", E);
        assert_eq!(token.refresh_time, E);
        assert_eq!(token.state(E - 1), TokenState::Valid);
        assert_eq!(token.state(E), TokenState::Expired);
    }

    #[test]
    fn from_jwt() -> anyhow::Result<()> {
        let jwt = fake_jwt(json!({"exp": E, "iat": E - 3600}));
        let token = TokenData::from_jwt(jwt.clone())?;
        assert_eq!(token, TokenData::new(jwt, E - 3600, E));

        let jwt = fake_jwt(json!({"exp": E}));
        let token = TokenData::from_jwt(jwt)?;
        assert_eq!(token.refresh_time, E);

        let jwt = fake_jwt(json!({"iat": E}));
        let got = TokenData::from_jwt(jwt);
        assert!(matches!(&got, Err(e) if !e.is_transient()), "{got:?}");
        Ok(())
    }

    #[test]
    fn response_with_expiration() -> anyhow::Result<()> {
        let response = serde_json::from_value::<TokenResponse>(json!({
            "access_token": "test-token",
            "refresh_token": "not-supported",
            "token_type": "Bearer",
            "expires_in": 3600,
            "expiration": E,
        }))?;
        let token = response.into_token_data(0)?;
        assert_eq!(token.access_token, "test-token");
        assert_eq!(token.expiration, E);
        assert_eq!(token.refresh_time, E - 720);
        Ok(())
    }

    #[test]
    fn response_with_expires_in() -> anyhow::Result<()> {
        let response = serde_json::from_value::<TokenResponse>(json!({
            "access_token": "test-token",
            "expires_in": 3600,
        }))?;
        let token = response.into_token_data(E - 3600)?;
        assert_eq!(token.expiration, E);
        assert_eq!(token.refresh_time, E - 720);
        Ok(())
    }

    #[test]
    fn response_uses_claims() -> anyhow::Result<()> {
        let jwt = fake_jwt(json!({"exp": E, "iat": E - 3600}));
        let response = serde_json::from_value::<TokenResponse>(json!({
            "access_token": jwt,
            "expiration": E,
        }))?;
        let token = response.into_token_data(0)?;
        assert_eq!(token.refresh_time, E - 720);
        Ok(())
    }

    #[test]
    fn response_lifetime_overflow() -> anyhow::Result<()> {
        let response = serde_json::from_value::<TokenResponse>(json!({
            "access_token": "test-token",
            "expires_in": i64::MAX,
        }))?;
        let got = response.into_token_data(now());
        assert!(matches!(&got, Err(e) if !e.is_transient()), "{got:?}");

        let response = serde_json::from_value::<TokenResponse>(json!({
            "access_token": "test-token",
            "expires_in": i64::MIN,
            "expiration": 1_700_000_000_i64,
        }))?;
        let got = response.into_token_data(now());
        assert!(matches!(&got, Err(e) if !e.is_transient()), "{got:?}");

        let response = serde_json::from_value::<TokenResponse>(json!({
            "access_token": "test-token",
            "expires_in": i64::MAX,
            "expiration": i64::MIN,
        }))?;
        let got = response.into_token_data(now());
        assert!(matches!(&got, Err(e) if !e.is_transient()), "{got:?}");
        Ok(())
    }

    #[test]
    fn response_negative_lifetime() -> anyhow::Result<()> {
        let response = serde_json::from_value::<TokenResponse>(json!({
            "access_token": "test-token",
            "expires_in": -10,
        }))?;
        let got = response.into_token_data(E);
        assert!(matches!(&got, Err(e) if e.to_string().contains("expires_in=-10")), "{got:?}");
        Ok(())
    }

    #[test]
    fn refresh_time_extreme_values() {
        let token = TokenData::new("test-token", i64::MIN, i64::MAX);
        assert!(token.refresh_time <= token.expiration, "{token:?}");
        let token = TokenData::new("test-token", i64::MAX, i64::MIN);
        assert_eq!(token.refresh_time, i64::MIN);
    }

    #[test]
    fn response_errors() -> anyhow::Result<()> {
        let response = serde_json::from_value::<TokenResponse>(json!({
            "access_token": "",
            "expires_in": 3600,
        }))?;
        let got = response.into_token_data(0);
        assert!(matches!(&got, Err(e) if !e.is_transient()), "{got:?}");

        let response = serde_json::from_value::<TokenResponse>(json!({
            "access_token": "not-a-jwt",
        }))?;
        let got = response.into_token_data(0);
        assert!(got.is_err(), "{got:?}");
        Ok(())
    }

    #[test]
    fn debug() {
        let token = TokenData::new("token-test-only", E - 3600, E);
        let got = format!("{token:?}");
        assert!(!got.contains("token-test-only"), "{got}");
        assert!(got.contains("access_token: \"[censored]\""), "{got}");
        assert!(got.contains(&format!("expiration: {E}")), "{got}");

        let response = TokenResponse {
            access_token: "token-test-only".into(),
            refresh_token: Some("refresh-test-only".into()),
            token_type: Some("Bearer".into()),
            expires_in: Some(3600),
            expiration: Some(E),
        };
        let got = format!("{response:?}");
        assert!(!got.contains("token-test-only"), "{got}");
        assert!(!got.contains("refresh-test-only"), "{got}");
    }
}
