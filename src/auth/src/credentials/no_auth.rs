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

//! Authenticators that do not add credentials.
//!
//! These are useful for services that do not require authentication, and in
//! tests.

use crate::build_errors::BuildResult;
use crate::credentials::Authenticator;
use std::collections::HashMap;

/// A builder for authenticators without credentials.
#[derive(Debug, Default)]
pub struct Builder {}

impl Builder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a builder, no properties are used.
    pub fn from_properties(_props: &HashMap<String, String>) -> BuildResult<Self> {
        Ok(Self::new())
    }

    /// Returns an [Authenticator] that leaves requests unchanged.
    pub fn build(self) -> BuildResult<Authenticator> {
        Ok(Authenticator::NoAuth)
    }
}
