use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Delimiter wrapped around each member in the persisted registry string.
/// A session id may never contain it.
pub const DELIMITER: char = '|';

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvalidSessionId {
    #[error("Session id is empty")]
    Empty,

    #[error("Session id contains reserved character '{0}'")]
    ReservedChar(char),
}

/// Opaque token naming one challenge session.
///
/// The server hands out GUIDs, but any non-empty token without whitespace or
/// the registry delimiter is accepted.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SessionId(String);

impl SessionId {
    pub fn new(value: impl Into<String>) -> Result<Self, InvalidSessionId> {
        let value = value.into();
        if value.is_empty() {
            return Err(InvalidSessionId::Empty);
        }
        if let Some(c) = value
            .chars()
            .find(|&c| c == DELIMITER || c.is_whitespace() || c.is_control())
        {
            return Err(InvalidSessionId::ReservedChar(c));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the token has canonical GUID shape:
    /// xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx
    pub fn is_guid(&self) -> bool {
        let s = self.as_str();
        if s.len() != 36 {
            return false;
        }
        s.chars().enumerate().all(|(i, c)| {
            if i == 8 || i == 13 || i == 18 || i == 23 {
                c == '-'
            } else {
                c.is_ascii_hexdigit()
            }
        })
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SessionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for SessionId {
    type Err = InvalidSessionId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for SessionId {
    type Error = InvalidSessionId;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<SessionId> for String {
    fn from(id: SessionId) -> Self {
        id.0
    }
}
