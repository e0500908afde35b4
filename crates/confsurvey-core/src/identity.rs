//! Caller identities.
//!
//! An [`Identity`] is the authenticated principal behind a call (for example
//! a wallet address). Authentication itself happens outside this crate; the
//! survey only uses identities as keys for voter uniqueness and grant
//! bookkeeping.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::SurveyError;

/// Maximum length of an identity in bytes.
pub const MAX_IDENTITY_LENGTH: usize = 256;

/// A validated caller identity.
///
/// # Rules
///
/// - Must not be empty
/// - Must not exceed [`MAX_IDENTITY_LENGTH`] bytes
/// - Must not contain null bytes
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Identity(String);

impl Identity {
    /// Creates a new identity.
    ///
    /// # Errors
    ///
    /// Returns `SurveyError::InvalidInput` if the identity is empty, too long
    /// or contains a null byte.
    pub fn new(id: impl Into<String>) -> Result<Self, SurveyError> {
        let id = id.into();
        if id.is_empty() {
            return Err(SurveyError::invalid_input("identity cannot be empty"));
        }
        if id.len() > MAX_IDENTITY_LENGTH {
            return Err(SurveyError::invalid_input(format!(
                "identity exceeds maximum length of {MAX_IDENTITY_LENGTH} bytes"
            )));
        }
        if id.contains('\0') {
            return Err(SurveyError::invalid_input("identity contains null byte"));
        }
        Ok(Self(id))
    }

    /// Returns the identity as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Identity {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Identity {
    type Error = SurveyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for Identity {
    type Error = SurveyError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Identity> for String {
    fn from(identity: Identity) -> Self {
        identity.0
    }
}
