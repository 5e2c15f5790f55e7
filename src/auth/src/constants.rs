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

use std::time::Duration;

/// The default IAM token server.
pub(crate) const DEFAULT_IAM_URL: &str = "https://iam.cloud.ibm.com";
/// The path of the IAM token endpoint.
pub(crate) const IAM_TOKEN_PATH: &str = "/identity/token";

/// API key exchange grant type.
pub(crate) const APIKEY_GRANT_TYPE: &str = "urn:ibm:params:oauth:grant-type:apikey";
/// Delegated identity grant type.
pub(crate) const ASSUME_GRANT_TYPE: &str = "urn:ibm:params:oauth:grant-type:assume";
/// Compute resource token grant type.
pub(crate) const CR_TOKEN_GRANT_TYPE: &str = "urn:ibm:params:oauth:grant-type:cr-token";
/// The `response_type` form value for IAM token requests.
pub(crate) const IAM_RESPONSE_TYPE: &str = "cloud_iam";

/// The default instance metadata service.
pub(crate) const DEFAULT_METADATA_URL: &str = "http://169.254.169.254";
pub(crate) const METADATA_INSTANCE_TOKEN_PATH: &str = "/instance_identity/v1/token";
pub(crate) const METADATA_IAM_TOKEN_PATH: &str = "/instance_identity/v1/iam_token";
pub(crate) const METADATA_VERSION: &str = "2022-03-01";
pub(crate) const METADATA_FLAVOR_HEADER: &str = "metadata-flavor";
pub(crate) const METADATA_FLAVOR_VALUE: &str = "ibm";
/// The lifetime requested for instance identity tokens, in seconds.
pub(crate) const INSTANCE_TOKEN_LIFETIME: i64 = 300;

/// The default compute resource token files.
pub(crate) const DEFAULT_CR_TOKEN_FILENAME: &str = "/var/run/secrets/tokens/vault-token";
pub(crate) const FALLBACK_CR_TOKEN_FILENAME: &str = "/var/run/secrets/tokens/sa-token";

/// The path of the session authorization endpoint.
pub(crate) const SESSION_AUTHORIZE_PATH: &str = "/v1/authorize";

/// The fraction of the token lifetime remaining when a refresh is scheduled.
pub(crate) const REFRESH_WINDOW_FRACTION: f64 = 0.2;

/// The maximum time a background refresh may take.
pub(crate) const BACKGROUND_REFRESH_TIMEOUT: Duration = Duration::from_secs(60);

/// The default timeout for token requests.
pub(crate) const TOKEN_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
