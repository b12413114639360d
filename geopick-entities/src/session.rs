use std::fmt;

use uuid::Uuid;

/// Opaque token that groups autocomplete requests of one search session.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct SessionToken(String);

impl SessionToken {
    pub fn new() -> Self {
        Uuid::new_v4().into()
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Default for SessionToken {
    fn default() -> Self {
        Self::new()
    }
}

impl AsRef<str> for SessionToken {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl From<Uuid> for SessionToken {
    fn from(from: Uuid) -> Self {
        Self(from.as_hyphenated().to_string())
    }
}

impl From<&str> for SessionToken {
    fn from(from: &str) -> Self {
        Self(from.to_owned())
    }
}

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        f.write_str(self.as_ref())
    }
}
