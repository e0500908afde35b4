//! Error types for survey operations.
//!
//! Every public survey operation validates all of its preconditions before
//! mutating anything, so each of these errors means "nothing happened". None
//! of them is transient at the survey layer: a caller that receives
//! [`SurveyError::AlreadyVoted`] or [`SurveyError::InvalidOption`] must not
//! resubmit the same request.
//!
//! The fine-grained variants map onto a coarse [`ErrorKind`] taxonomy via
//! [`SurveyError::kind`], which is what external collaborators (UIs, relays)
//! are expected to branch on.

use std::fmt;

use thiserror::Error;

use crate::audit::AuditError;
use crate::engine::EngineError;
use crate::identity::Identity;

/// Errors that can occur during survey operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum SurveyError {
    /// The survey has not been configured yet.
    #[error("survey is not configured")]
    NotConfigured,

    /// `configure` was called on a survey that is already configured.
    #[error("survey is already configured")]
    AlreadyConfigured,

    /// The survey has been finalized and no longer accepts votes.
    #[error("survey is finalized")]
    Finalized,

    /// The identity has already submitted a vote.
    #[error("{voter} has already voted")]
    AlreadyVoted {
        /// The identity that tried to vote twice.
        voter: Identity,
    },

    /// An option index is out of range.
    #[error("invalid option index {index} (survey has {count} options)")]
    InvalidOption {
        /// The requested index.
        index: usize,
        /// Number of configured options.
        count: usize,
    },

    /// `configure` was called with fewer than the minimum number of options.
    #[error("survey needs at least {min} options, got {count}")]
    TooFewOptions {
        /// Number of labels supplied.
        count: usize,
        /// Minimum number of options.
        min: usize,
    },

    /// A grant was requested for an option that has not received any vote.
    #[error("option {index} has no votes yet")]
    NoVotesForOption {
        /// The option index.
        index: usize,
    },

    /// `grant_all_to_self` found no option with votes.
    #[error("no option has received votes yet")]
    NoEligibleOptions,

    /// The encrypted vote input failed proof validation.
    #[error("invalid input proof: {reason}")]
    InvalidProof {
        /// Why the engine rejected the proof.
        reason: String,
    },

    /// An input value violates configured limits.
    #[error("invalid input: {reason}")]
    InvalidInput {
        /// Why the input is invalid.
        reason: String,
    },

    /// The homomorphic engine failed for a reason other than proof
    /// validation.
    #[error("engine error: {0}")]
    Engine(EngineError),

    /// An internal error occurred (for example, an audit record could not be
    /// encoded).
    #[error("internal error: {0}")]
    Internal(String),
}

impl SurveyError {
    /// Creates a new already voted error.
    #[must_use]
    pub const fn already_voted(voter: Identity) -> Self {
        Self::AlreadyVoted { voter }
    }

    /// Creates a new invalid option error.
    #[must_use]
    pub const fn invalid_option(index: usize, count: usize) -> Self {
        Self::InvalidOption { index, count }
    }

    /// Creates a new invalid input error.
    #[must_use]
    pub fn invalid_input(reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            reason: reason.into(),
        }
    }

    /// Creates a new invalid proof error.
    #[must_use]
    pub fn invalid_proof(reason: impl Into<String>) -> Self {
        Self::InvalidProof {
            reason: reason.into(),
        }
    }

    /// Returns the coarse error kind for this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::NotConfigured => ErrorKind::NotConfigured,
            Self::AlreadyConfigured | Self::Finalized => ErrorKind::AlreadyClosed,
            Self::AlreadyVoted { .. } => ErrorKind::AlreadyVoted,
            Self::InvalidOption { .. } | Self::TooFewOptions { .. } => ErrorKind::InvalidOption,
            Self::NoVotesForOption { .. } | Self::NoEligibleOptions => ErrorKind::NotEligible,
            Self::InvalidProof { .. } => ErrorKind::InvalidProof,
            Self::InvalidInput { .. } => ErrorKind::InvalidInput,
            Self::Engine(_) => ErrorKind::Engine,
            Self::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Returns `true` if resubmitting the same request could succeed.
    ///
    /// Only engine faults the engine itself reports as transient qualify.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Engine(e) => e.is_transient(),
            _ => false,
        }
    }
}

impl From<EngineError> for SurveyError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::InvalidProof { reason } => Self::InvalidProof { reason },
            other => Self::Engine(other),
        }
    }
}

impl From<AuditError> for SurveyError {
    fn from(err: AuditError) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Coarse classification of survey errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The survey has not been configured.
    NotConfigured,
    /// The survey is already configured or already finalized.
    AlreadyClosed,
    /// The voter already voted.
    AlreadyVoted,
    /// The option index or option set is invalid.
    InvalidOption,
    /// The grant precondition (option has votes) is not met.
    NotEligible,
    /// The vote proof did not validate.
    InvalidProof,
    /// Input violates configured limits.
    InvalidInput,
    /// Engine failure.
    Engine,
    /// Internal failure.
    Internal,
}

impl ErrorKind {
    /// Returns the kind as a stable string identifier.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::NotConfigured => "not_configured",
            Self::AlreadyClosed => "already_closed",
            Self::AlreadyVoted => "already_voted",
            Self::InvalidOption => "invalid_option",
            Self::NotEligible => "not_eligible",
            Self::InvalidProof => "invalid_proof",
            Self::InvalidInput => "invalid_input",
            Self::Engine => "engine",
            Self::Internal => "internal",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
