//! Audit events for accepted survey transitions.
//!
//! Events are immutable once created and are only ever appended to the
//! [`AuditLog`](super::AuditLog).
//!
//! # Event Types
//!
//! | Variant                          | `event_type()`       |
//! |----------------------------------|----------------------|
//! | [`AuditEvent::SurveyConfigured`] | `survey.configured`  |
//! | [`AuditEvent::VoteSubmitted`]    | `vote.submitted`     |
//! | [`AuditEvent::SurveyFinalized`]  | `survey.finalized`   |
//! | [`AuditEvent::GrantIssued`]      | `grant.issued`       |
//! | [`AuditEvent::SelfGrantIssued`]  | `grant.self_issued`  |
//!
//! # Disclosure
//!
//! `VoteSubmitted` carries the voter identity and the chosen option index in
//! the clear. Ballot secrecy here protects the *value* folded into the
//! accumulator, not the fact of participation or the choice metadata. A
//! deployment that needs full ballot secrecy must not publish this log.

use serde::{Deserialize, Serialize};

use crate::identity::Identity;

/// An accepted survey transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case", deny_unknown_fields)]
#[non_exhaustive]
pub enum AuditEvent {
    /// The survey was configured.
    SurveyConfigured {
        /// Identity that configured the survey.
        creator: Identity,
        /// The survey question.
        question: String,
        /// Number of options.
        option_count: usize,
    },

    /// A vote was accepted.
    VoteSubmitted {
        /// The voter.
        voter: Identity,
        /// The chosen option index.
        option: usize,
    },

    /// The survey was finalized.
    SurveyFinalized {
        /// Identity that finalized the survey.
        finalized_by: Identity,
    },

    /// A caller granted decryption rights to another identity.
    GrantIssued {
        /// Identity that issued the grant.
        grantor: Identity,
        /// Identity that received the grant.
        grantee: Identity,
        /// The option index.
        option: usize,
    },

    /// A caller granted decryption rights to itself.
    SelfGrantIssued {
        /// The caller and grantee.
        grantee: Identity,
        /// The option index.
        option: usize,
    },
}

impl AuditEvent {
    /// Returns the event type as a stable string.
    #[must_use]
    pub const fn event_type(&self) -> &'static str {
        match self {
            Self::SurveyConfigured { .. } => "survey.configured",
            Self::VoteSubmitted { .. } => "vote.submitted",
            Self::SurveyFinalized { .. } => "survey.finalized",
            Self::GrantIssued { .. } => "grant.issued",
            Self::SelfGrantIssued { .. } => "grant.self_issued",
        }
    }

    /// Returns the identity that caused this event.
    #[must_use]
    pub const fn actor(&self) -> &Identity {
        match self {
            Self::SurveyConfigured { creator, .. } => creator,
            Self::VoteSubmitted { voter, .. } => voter,
            Self::SurveyFinalized { finalized_by } => finalized_by,
            Self::GrantIssued { grantor, .. } => grantor,
            Self::SelfGrantIssued { grantee, .. } => grantee,
        }
    }

    /// Returns the option index this event concerns, if any.
    #[must_use]
    pub const fn option(&self) -> Option<usize> {
        match self {
            Self::VoteSubmitted { option, .. }
            | Self::GrantIssued { option, .. }
            | Self::SelfGrantIssued { option, .. } => Some(*option),
            Self::SurveyConfigured { .. } | Self::SurveyFinalized { .. } => None,
        }
    }

    /// Returns `true` if this is a grant event of either kind.
    #[must_use]
    pub const fn is_grant(&self) -> bool {
        matches!(self, Self::GrantIssued { .. } | Self::SelfGrantIssued { .. })
    }
}
