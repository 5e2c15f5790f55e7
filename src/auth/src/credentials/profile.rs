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

use crate::build_errors::{BuildResult, Error as BuilderError, check_optional};

/// Selects the trusted profile used by some authenticators.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Profile {
    Id(String),
    Crn(String),
    Name {
        name: String,
        account: Option<String>,
    },
}

/// The profile selector fields, as configured in a builder.
#[derive(Clone, Debug, Default)]
pub(crate) struct ProfileFields {
    pub id: Option<String>,
    pub crn: Option<String>,
    pub name: Option<String>,
    pub account: Option<String>,
}

impl ProfileFields {
    pub(crate) fn from_properties(props: &std::collections::HashMap<String, String>) -> Self {
        use crate::properties::{ACCOUNT, PROFILE_CRN, PROFILE_ID, PROFILE_NAME, get};
        let value = |key: &str| get(props, key).map(str::to_string);
        Self {
            id: value(PROFILE_ID),
            crn: value(PROFILE_CRN),
            name: value(PROFILE_NAME),
            account: value(ACCOUNT),
        }
    }

    /// Returns the selected profile, or `None` if no selector is set.
    ///
    /// Fails if more than one selector is set, or if an account is set
    /// without a profile name.
    pub(crate) fn select(self) -> BuildResult<Option<Profile>> {
        let non_empty = |v: Option<String>| v.filter(|s| !s.is_empty());
        let (id, crn, name, account) = (
            non_empty(self.id),
            non_empty(self.crn),
            non_empty(self.name),
            non_empty(self.account),
        );
        check_optional("profile_id", id.as_deref())?;
        check_optional("profile_crn", crn.as_deref())?;
        check_optional("profile_name", name.as_deref())?;
        check_optional("account", account.as_deref())?;

        let count = [id.is_some(), crn.is_some(), name.is_some()]
            .into_iter()
            .filter(|s| *s)
            .count();
        if count > 1 {
            return Err(BuilderError::invalid_configuration(
                "at most one of profile_id, profile_crn, or profile_name may be set",
            ));
        }
        if account.is_some() && name.is_none() {
            return Err(BuilderError::invalid_configuration(
                "account is only used with profile_name",
            ));
        }
        Ok(id
            .map(Profile::Id)
            .or(crn.map(Profile::Crn))
            .or(name.map(|name| Profile::Name { name, account })))
    }

    /// Like [select][Self::select], but a selector is required.
    pub(crate) fn require(self) -> BuildResult<Profile> {
        self.select()?.ok_or_else(|| {
            BuilderError::invalid_configuration(
                "one of profile_id, profile_crn, or profile_name must be set",
            )
        })
    }
}

impl Profile {
    /// The form fields used to select this profile in token requests.
    pub(crate) fn form_fields(&self) -> Vec<(&'static str, &str)> {
        match self {
            Self::Id(id) => vec![("profile_id", id.as_str())],
            Self::Crn(crn) => vec![("profile_crn", crn.as_str())],
            Self::Name { name, account } => std::iter::once(("profile_name", name.as_str()))
                .chain(account.iter().map(|a| ("account", a.as_str())))
                .collect(),
        }
    }
}
