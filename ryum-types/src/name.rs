// SPDX-FileCopyrightText: 2026 ryum contributors
// SPDX-License-Identifier: Apache-2.0 OR MIT
use std::fmt::Display;
use std::fmt::Formatter;
use std::str::FromStr;

use serde::Serialize;

use crate::Error;
use crate::regex_once;

/// A package name
///
/// Package names are non-empty strings over `[a-zA-Z0-9+._-]` that start
/// with an alphanumeric character. Capability names (which may contain
/// parentheses or be absolute file paths) are not [`Name`]s; they live in
/// [`Dependency`](crate::Dependency) as plain strings.
///
/// ## Examples
/// ```
/// use std::str::FromStr;
/// use ryum_types::Name;
///
/// assert!(Name::from_str("glibc").is_ok());
/// assert!(Name::from_str("gpg-pubkey").is_ok());
/// assert!(Name::from_str("NetworkManager-glib").is_ok());
/// assert!(Name::from_str("").is_err());
/// assert!(Name::from_str("-foo").is_err());
/// ```
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct Name(String);

impl Name {
    /// Create a new Name in a Result
    pub fn new(name: &str) -> Result<Self, Error> {
        if regex_once!(r"^[a-zA-Z0-9][a-zA-Z0-9+._-]*$").is_match(name) {
            Ok(Name(name.to_string()))
        } else {
            Err(Error::InvalidName(name.to_string()))
        }
    }

    /// Return a reference to the inner type
    pub fn inner(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Name {
    fn as_ref(&self) -> &str {
        self.inner()
    }
}

impl FromStr for Name {
    type Err = Error;
    /// Create a Name from a string and return it in a Result
    fn from_str(input: &str) -> Result<Self, Self::Err> {
        Name::new(input)
    }
}

impl Display for Name {
    fn fmt(&self, fmt: &mut Formatter) -> std::fmt::Result {
        write!(fmt, "{}", self.inner())
    }
}
