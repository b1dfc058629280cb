//! Router identity - the unit of cycle detection and nesting lookups
//!
//! Format: `<file_key>:<variable>`
//!
//! Examples:
//! - `app/main.py:app`
//! - `app/api/users.py:router`

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Fully-qualified router identity, derived on demand from (file, variable).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RouterId {
    /// File key relative to the scan root
    pub file: String,
    /// Variable the router is bound to
    pub variable: String,
}

impl RouterId {
    pub fn new(file: impl Into<String>, variable: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            variable: variable.into(),
        }
    }

    /// Parse a `file:variable` string.
    ///
    /// Splits on the last colon; variables never contain one.
    pub fn parse(id: &str) -> Result<Self> {
        let (file, variable) = id
            .rsplit_once(':')
            .ok_or_else(|| Error::InvalidRouterId(format!("missing ':' in {}", id)))?;

        if file.is_empty() || variable.is_empty() {
            return Err(Error::InvalidRouterId(format!("empty component in {}", id)));
        }

        Ok(Self::new(file, variable))
    }
}

impl fmt::Display for RouterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.variable)
    }
}

impl Serialize for RouterId {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for RouterId {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        RouterId::parse(&s).map_err(serde::de::Error::custom)
    }
}
