// SPDX-FileCopyrightText: 2026 ryum contributors
// SPDX-License-Identifier: Apache-2.0 OR MIT
use std::fmt::Display;
use std::fmt::Formatter;

use serde::Deserialize;
use serde::Serialize;

/// The kind of digest protecting a downloadable artifact
///
/// Repository metadata names the checksum type of every package; the
/// download layer uses it to pick the hash function for verification.
/// Unrecognized type strings collapse to [`DigestKind::None`], which
/// disables digest verification for the artifact.
///
/// ## Examples
/// ```
/// use ryum_types::DigestKind;
///
/// assert_eq!(DigestKind::Sha256, DigestKind::from_metadata("sha256"));
/// assert_eq!(DigestKind::Sha1, DigestKind::from_metadata("sha"));
/// assert_eq!(DigestKind::None, DigestKind::from_metadata("whirlpool"));
/// ```
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DigestKind {
    /// MD5
    Md5,
    /// SHA-1
    Sha1,
    /// SHA-256
    Sha256,
    /// No digest
    None,
}

impl DigestKind {
    /// Create a DigestKind from a metadata checksum-type string
    ///
    /// The metadata databases historically write SHA-1 as `"sha"`.
    pub fn from_metadata(checksum_type: &str) -> Self {
        match checksum_type {
            "md5" => DigestKind::Md5,
            "sha" | "sha1" => DigestKind::Sha1,
            "sha256" => DigestKind::Sha256,
            _ => DigestKind::None,
        }
    }

    /// Return the length of the hex-encoded digest, or `None` for
    /// [`DigestKind::None`]
    pub fn hex_len(&self) -> Option<usize> {
        match self {
            DigestKind::Md5 => Some(32),
            DigestKind::Sha1 => Some(40),
            DigestKind::Sha256 => Some(64),
            DigestKind::None => None,
        }
    }
}

impl Display for DigestKind {
    fn fmt(&self, fmt: &mut Formatter) -> std::fmt::Result {
        write!(
            fmt,
            "{}",
            match self {
                DigestKind::Md5 => "md5",
                DigestKind::Sha1 => "sha1",
                DigestKind::Sha256 => "sha256",
                DigestKind::None => "none",
            }
        )
    }
}
