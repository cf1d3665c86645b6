//! Brazilian federative unit (UF) codes.
//!
//! The 27 units that can be favored by a GNRE, plus `EX`, which NF-e uses for
//! foreign destinations.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::error::GnreError;

/// Check whether `code` is one of the 27 federative units.
pub fn is_known_uf(code: &str) -> bool {
    UFS.binary_search(&code).is_ok()
}

/// States whose GNRE is not integrated with the web service; guides for them
/// must be issued manually.
pub const UFS_SEM_INTEGRACAO: &[&str] = &["ES", "SP"];

/// NF-e code for a foreign destination.
pub const UF_EXTERIOR: &str = "EX";

/// All 27 federative units, sorted for binary search.
static UFS: &[&str] = &[
    "AC", "AL", "AM", "AP", "BA", "CE", "DF", "ES", "GO", "MA", "MG", "MS", "MT", "PA", "PB", "PE",
    "PI", "PR", "RJ", "RN", "RO", "RR", "RS", "SC", "SE", "SP", "TO",
];

/// A validated UF code (upper-case, two letters).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Uf(String);

impl Uf {
    /// Parse a UF, accepting `EX` as well as the 27 states.
    pub fn parse(code: &str) -> Result<Self, GnreError> {
        let code = code.trim().to_uppercase();
        if is_known_uf(&code) || code == UF_EXTERIOR {
            Ok(Self(code))
        } else {
            Err(GnreError::Parse(format!("unknown UF '{code}'")))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `true` for the 27 states (i.e. not `EX`).
    pub fn is_state(&self) -> bool {
        is_known_uf(&self.0)
    }

    /// `true` when the service has no integration for this state.
    pub fn requires_manual_issuance(&self) -> bool {
        UFS_SEM_INTEGRACAO.contains(&self.0.as_str())
    }
}

impl fmt::Display for Uf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Uf {
    type Error = GnreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Uf> for String {
    fn from(uf: Uf) -> Self {
        uf.0
    }
}

impl PartialEq<&str> for Uf {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}
