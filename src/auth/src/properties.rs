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

//! Collects authenticator configuration from environment variables.
//!
//! Each service has its own set of variables, named
//! `<SERVICE_NAME>_<PROPERTY>`. The service name is upper-cased, and any `-`
//! is replaced with `_`. For example, the API key for the `my-service`
//! service is read from `MY_SERVICE_APIKEY`.
//!
//! The properties are returned as a map with lower-case keys, which the
//! `from_properties()` function of each builder consumes:
//!
//! ```
//! # use platform_sdk_auth::credentials::api_key;
//! # use platform_sdk_auth::properties;
//! let props = properties::from_environment("my-service");
//! if props.contains_key(properties::APIKEY) {
//!     let authenticator = api_key::Builder::from_properties(&props)?.build()?;
//! }
//! # Ok::<(), anyhow::Error>(())
//! ```

use std::collections::HashMap;

/// The API key.
pub const APIKEY: &str = "apikey";
/// The OAuth client id used with some token servers.
pub const CLIENT_ID: &str = "client_id";
/// The OAuth client secret used with some token servers.
pub const CLIENT_SECRET: &str = "client_secret";
/// The scope requested for the access token.
pub const SCOPE: &str = "scope";
/// Overrides the token server URL.
pub const AUTH_URL: &str = "auth_url";
/// If `true`, disables TLS certificate verification for the token server.
pub const AUTH_DISABLE_SSL: &str = "auth_disable_ssl";
/// Selects a trusted profile by id.
pub const PROFILE_ID: &str = "profile_id";
/// Selects a trusted profile by CRN.
pub const PROFILE_CRN: &str = "profile_crn";
/// Selects a trusted profile by name, requires [ACCOUNT].
pub const PROFILE_NAME: &str = "profile_name";
/// The account that owns the trusted profile named by [PROFILE_NAME].
pub const ACCOUNT: &str = "account";
/// The user name for basic and session authentication.
pub const USERNAME: &str = "username";
/// The password for basic and session authentication.
pub const PASSWORD: &str = "password";
/// A static bearer token.
pub const BEARER_TOKEN: &str = "bearer_token";
/// The file containing the compute resource token.
pub const CR_TOKEN_FILENAME: &str = "cr_token_filename";

/// Returns the properties for `service_name` found in the environment.
///
/// Variables with empty values, and variables whose name or value is not
/// valid Unicode, are ignored.
pub fn from_environment(service_name: &str) -> HashMap<String, String> {
    let vars = std::env::vars_os()
        .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)));
    from_vars(service_name, vars)
}

fn from_vars<I>(service_name: &str, vars: I) -> HashMap<String, String>
where
    I: IntoIterator<Item = (String, String)>,
{
    let prefix = format!("{}_", service_name.to_uppercase().replace('-', "_"));
    vars.into_iter()
        .filter(|(_, v)| !v.is_empty())
        .filter_map(|(k, v)| {
            k.strip_prefix(&prefix)
                .filter(|p| !p.is_empty())
                .map(|p| (p.to_lowercase(), v))
        })
        .collect()
}

/// Returns the value of `key`, if present and not empty.
pub(crate) fn get<'a>(props: &'a HashMap<String, String>, key: &str) -> Option<&'a str> {
    props
        .get(key)
        .map(String::as_str)
        .filter(|v| !v.is_empty())
}

/// Returns the value of a boolean property.
///
/// Any value other than `true` (ignoring case) is `false`.
pub(crate) fn get_bool(props: &HashMap<String, String>, key: &str) -> bool {
    get(props, key).is_some_and(|v| v.eq_ignore_ascii_case("true"))
}
