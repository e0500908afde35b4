//! Survey lifecycle state machine.
//!
//! The lifecycle is strictly linear:
//!
//! ```text
//! Unconfigured --configure--> Configured --finalize--> Finalized
//! ```
//!
//! There are no cycles and no regressions. Configuration happens exactly
//! once; finalization closes the survey to new votes but leaves queries and
//! grants available.
//!
//! # Example
//!
//! ```rust
//! use confsurvey_core::lifecycle::SurveyPhase;
//!
//! let phase = SurveyPhase::default();
//! assert_eq!(phase, SurveyPhase::Unconfigured);
//! assert!(phase.can_transition_to(SurveyPhase::Configured));
//! assert!(!phase.can_transition_to(SurveyPhase::Finalized));
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::SurveyError;

/// The lifecycle phases of a survey.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SurveyPhase {
    /// Deployed but not yet configured.
    #[default]
    Unconfigured,

    /// Configured and accepting votes.
    Configured,

    /// Closed to new votes (terminal).
    Finalized,
}

impl SurveyPhase {
    /// Returns `true` if the survey has been configured (it may also be
    /// finalized).
    #[must_use]
    pub const fn is_configured(&self) -> bool {
        matches!(self, Self::Configured | Self::Finalized)
    }

    /// Returns `true` if votes are currently accepted.
    #[must_use]
    pub const fn accepts_votes(&self) -> bool {
        matches!(self, Self::Configured)
    }

    /// Returns `true` if this is the terminal phase.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Finalized)
    }

    /// Returns the phase as a string identifier.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Unconfigured => "unconfigured",
            Self::Configured => "configured",
            Self::Finalized => "finalized",
        }
    }

    /// Returns the valid transitions from this phase.
    #[must_use]
    pub const fn valid_transitions(&self) -> &'static [Self] {
        match self {
            Self::Unconfigured => &[Self::Configured],
            Self::Configured => &[Self::Finalized],
            Self::Finalized => &[],
        }
    }

    /// Returns `true` if transitioning to `target` is valid from this phase.
    #[must_use]
    pub fn can_transition_to(&self, target: Self) -> bool {
        self.valid_transitions().contains(&target)
    }

    /// Fails unless the survey has been configured.
    ///
    /// # Errors
    ///
    /// Returns `SurveyError::NotConfigured` in `Unconfigured`.
    pub const fn require_configured(&self) -> Result<(), SurveyError> {
        if self.is_configured() {
            Ok(())
        } else {
            Err(SurveyError::NotConfigured)
        }
    }

    /// Fails unless the survey is open for votes.
    ///
    /// # Errors
    ///
    /// Returns `SurveyError::NotConfigured` in `Unconfigured` and
    /// `SurveyError::Finalized` in `Finalized`.
    pub const fn require_open(&self) -> Result<(), SurveyError> {
        match self {
            Self::Unconfigured => Err(SurveyError::NotConfigured),
            Self::Configured => Ok(()),
            Self::Finalized => Err(SurveyError::Finalized),
        }
    }

    /// Computes the phase after `configure`.
    ///
    /// # Errors
    ///
    /// Returns `SurveyError::AlreadyConfigured` unless in `Unconfigured`.
    pub const fn configure(self) -> Result<Self, SurveyError> {
        match self {
            Self::Unconfigured => Ok(Self::Configured),
            Self::Configured | Self::Finalized => Err(SurveyError::AlreadyConfigured),
        }
    }

    /// Computes the phase after `finalize`.
    ///
    /// # Errors
    ///
    /// Returns `SurveyError::NotConfigured` in `Unconfigured` and
    /// `SurveyError::Finalized` if already finalized.
    pub const fn finalize(self) -> Result<Self, SurveyError> {
        match self {
            Self::Unconfigured => Err(SurveyError::NotConfigured),
            Self::Configured => Ok(Self::Finalized),
            Self::Finalized => Err(SurveyError::Finalized),
        }
    }
}

impl fmt::Display for SurveyPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
