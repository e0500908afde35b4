//! Vote ledger: at most one accepted vote per identity.
//!
//! The ledger records *that* an identity voted, never *what* it voted for.
//! Records are created on first accepted vote and never reset.

use std::collections::HashSet;

use crate::error::SurveyError;
use crate::identity::Identity;

/// Set of identities whose vote has been accepted.
#[derive(Debug, Clone, Default)]
pub struct VoteLedger {
    voters: HashSet<Identity>,
}

impl VoteLedger {
    /// Creates an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if `identity` already has an accepted vote.
    #[must_use]
    pub fn has_voted(&self, identity: &Identity) -> bool {
        self.voters.contains(identity)
    }

    /// Fails if `identity` already voted.
    ///
    /// # Errors
    ///
    /// Returns `SurveyError::AlreadyVoted`.
    pub fn ensure_not_voted(&self, identity: &Identity) -> Result<(), SurveyError> {
        if self.has_voted(identity) {
            return Err(SurveyError::already_voted(identity.clone()));
        }
        Ok(())
    }

    /// Records an accepted vote for `identity`.
    ///
    /// Returns `false` if a vote was already recorded; callers check
    /// [`ensure_not_voted`](Self::ensure_not_voted) first.
    pub fn record(&mut self, identity: &Identity) -> bool {
        self.voters.insert(identity.clone())
    }

    /// Returns the number of identities that voted.
    #[must_use]
    pub fn voter_count(&self) -> usize {
        self.voters.len()
    }
}
