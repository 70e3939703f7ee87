//! VPN user names

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Why a candidate name cannot be used for a new account
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UsernameError {
    #[error("username must not be empty")]
    Empty,

    #[error("'{name}' contains '{found}', only a-z and A-Z are allowed")]
    InvalidCharacter { name: String, found: char },
}

/// A name accepted for account creation: one or more ASCII letters
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Username(String);

impl Username {
    /// Validate a candidate against `[a-zA-Z]+`
    pub fn parse(candidate: &str) -> Result<Self, UsernameError> {
        if candidate.is_empty() {
            return Err(UsernameError::Empty);
        }
        if let Some(found) = candidate.chars().find(|c| !c.is_ascii_alphabetic()) {
            return Err(UsernameError::InvalidCharacter {
                name: candidate.to_string(),
                found,
            });
        }
        Ok(Self(candidate.to_string()))
    }

    /// Whether the create control should be enabled for this candidate
    pub fn is_valid(candidate: &str) -> bool {
        !candidate.is_empty() && candidate.bytes().all(|b| b.is_ascii_alphabetic())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Username {
    type Err = UsernameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for Username {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// An entry of the server's user list
///
/// Entries come from the gateway and are not re-validated: the server may
/// hold names the create form would refuse.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserEntry(String);

impl UserEntry {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<Username> for UserEntry {
    fn from(name: Username) -> Self {
        Self(name.0)
    }
}

impl PartialEq<str> for UserEntry {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for UserEntry {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_letters_only_are_accepted() {
        for name in ["bob", "Alice", "Z", "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ"] {
            assert!(Username::is_valid(name), "{} should be valid", name);
            assert_eq!(Username::parse(name).unwrap().as_str(), name);
        }
    }

    #[test]
    fn test_empty_is_rejected() {
        assert!(!Username::is_valid(""));
        assert_eq!(Username::parse(""), Err(UsernameError::Empty));
    }

    #[test]
    fn test_non_letters_are_rejected() {
        for (name, found) in [
            ("bob1", '1'),
            ("bob smith", ' '),
            ("bob-smith", '-'),
            ("bob.", '.'),
            ("jos\u{e9}", '\u{e9}'),
            ("\tbob", '\t'),
            ("../etc", '.'),
        ] {
            assert!(!Username::is_valid(name), "{:?} should be invalid", name);
            assert_eq!(
                Username::parse(name),
                Err(UsernameError::InvalidCharacter {
                    name: name.to_string(),
                    found
                })
            );
        }
    }

    #[test]
    fn test_user_entries_deserialize_from_plain_strings() {
        let users: Vec<UserEntry> = serde_json::from_str(r#"["alice", "bob-2"]"#).unwrap();
        assert_eq!(users, vec![UserEntry::new("alice"), UserEntry::new("bob-2")]);
        assert_eq!(users[0], "alice");
    }
}
