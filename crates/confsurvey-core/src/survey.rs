//! The survey aggregate.
//!
//! A [`Survey`] owns the lifecycle phase, the option accumulators, the vote
//! ledger, the grant relation and the audit log, together with the injected
//! [`HomomorphicEngine`]. It is the only entry point for mutations.
//!
//! # Execution model
//!
//! Every mutating operation takes `&mut self` and runs to completion; the
//! host is expected to serialize calls (one writer at a time). Within an
//! operation all preconditions are checked, and every audit record encoded,
//! before the first mutation. A failed operation therefore leaves the survey
//! exactly as it was.
//!
//! # Access control
//!
//! `finalize` and the grant operations are open to any caller. There is no
//! owner-only gate and no revocation.
//!
//! # Example
//!
//! ```rust
//! use confsurvey_core::engine::ClearEngine;
//! use confsurvey_core::{Identity, Survey, SurveyPhase};
//!
//! let owner = Identity::new("owner").unwrap();
//! let creator = Identity::new("creator").unwrap();
//! let alice = Identity::new("alice").unwrap();
//!
//! let mut survey = Survey::new(owner.clone(), ClearEngine::new());
//! survey
//!     .configure(&creator, "Favourite colour?", ["Red", "Blue"])
//!     .unwrap();
//!
//! let (input, proof) = ClearEngine::encrypt(1);
//! survey.submit_vote(&alice, 0, &input, &proof).unwrap();
//! assert!(survey.has_voter_submitted(&alice));
//!
//! survey.finalize(&owner).unwrap();
//! assert_eq!(survey.phase(), SurveyPhase::Finalized);
//!
//! let total = survey.accumulator(0).unwrap();
//! assert_eq!(survey.engine().decrypt(total, &owner).unwrap(), 1);
//! ```

use tracing::{debug, info, warn};

use crate::accumulator::AccumulatorStore;
use crate::audit::{AuditEvent, AuditLog};
use crate::config::{SurveyConfig, SurveyLimits, MIN_OPTIONS};
use crate::engine::HomomorphicEngine;
use crate::error::SurveyError;
use crate::grants::{AccessGrantManager, GrantOrigin};
use crate::identity::Identity;
use crate::ledger::VoteLedger;
use crate::lifecycle::SurveyPhase;

/// A confidential survey.
pub struct Survey<E: HomomorphicEngine> {
    owner: Identity,
    config: SurveyConfig,
    engine: E,
    phase: SurveyPhase,
    question: String,
    creator: Option<Identity>,
    options: AccumulatorStore<E::Accumulator>,
    voters: VoteLedger,
    grants: AccessGrantManager,
    audit: AuditLog,
}

impl<E: HomomorphicEngine> Survey<E> {
    /// Creates an unconfigured survey administered by `owner`.
    #[must_use]
    pub fn new(owner: Identity, engine: E) -> Self {
        Self::with_config(owner, engine, SurveyConfig::default())
    }

    /// Creates an unconfigured survey with explicit limits.
    #[must_use]
    pub fn with_config(owner: Identity, engine: E, config: SurveyConfig) -> Self {
        Self {
            owner,
            config,
            engine,
            phase: SurveyPhase::Unconfigured,
            question: String::new(),
            creator: None,
            options: AccumulatorStore::default(),
            voters: VoteLedger::new(),
            grants: AccessGrantManager::new(),
            audit: AuditLog::new(),
        }
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Configures the survey. Callable exactly once; `caller` becomes the
    /// creator.
    ///
    /// Each option starts with an encrypted zero accumulator and no votes.
    ///
    /// # Errors
    ///
    /// - `SurveyError::AlreadyConfigured` if the survey was configured before
    /// - `SurveyError::TooFewOptions` for fewer than two labels
    /// - `SurveyError::InvalidInput` if the question or a label violates the
    ///   configured limits
    /// - `SurveyError::Engine` if the engine cannot produce a zero
    pub fn configure<I, S>(
        &mut self,
        caller: &Identity,
        question: impl Into<String>,
        labels: I,
    ) -> Result<(), SurveyError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let next = self.phase.configure()?;
        let question = question.into();
        let labels: Vec<String> = labels.into_iter().map(Into::into).collect();
        validate_survey_text(&self.config.limits, &question, &labels)?;

        let pending = AuditLog::prepare(AuditEvent::SurveyConfigured {
            creator: caller.clone(),
            question: question.clone(),
            option_count: labels.len(),
        })?;

        let mut initial = Vec::with_capacity(labels.len());
        for label in labels {
            initial.push((label, self.engine.zero()?));
        }

        self.options = AccumulatorStore::from_initial(initial);
        self.question = question;
        self.creator = Some(caller.clone());
        self.phase = next;
        self.audit.commit(pending);

        info!(
            creator = %caller,
            option_count = self.options.len(),
            "survey configured"
        );
        Ok(())
    }

    /// Closes the survey to new votes. Queries and grants remain available.
    ///
    /// # Errors
    ///
    /// Returns `SurveyError::NotConfigured` before configuration and
    /// `SurveyError::Finalized` if already finalized.
    pub fn finalize(&mut self, caller: &Identity) -> Result<(), SurveyError> {
        let next = self.phase.finalize()?;
        let pending = AuditLog::prepare(AuditEvent::SurveyFinalized {
            finalized_by: caller.clone(),
        })?;

        self.phase = next;
        self.audit.commit(pending);

        info!(
            finalized_by = %caller,
            voters = self.voters.voter_count(),
            "survey finalized"
        );
        Ok(())
    }

    // =========================================================================
    // Voting
    // =========================================================================

    /// Accepts one encrypted vote from `voter` for `option`.
    ///
    /// On success the option's accumulator absorbs `input`, the option is
    /// marked as voted and the voter is recorded. The owner, the creator and
    /// every identity already granted on the option are allowed to decrypt
    /// the new accumulator, so grants cover later totals too.
    ///
    /// # Errors
    ///
    /// Checked in this order, all before any mutation:
    ///
    /// 1. `SurveyError::NotConfigured` / `SurveyError::Finalized`
    /// 2. `SurveyError::AlreadyVoted`
    /// 3. `SurveyError::InvalidOption`
    /// 4. `SurveyError::InvalidProof` (or `SurveyError::Engine`)
    pub fn submit_vote(
        &mut self,
        voter: &Identity,
        option: usize,
        input: &E::Input,
        proof: &E::Proof,
    ) -> Result<(), SurveyError> {
        self.phase.require_open()?;
        self.voters.ensure_not_voted(voter)?;
        let current = self.options.slot(option)?.total();

        let pending = AuditLog::prepare(AuditEvent::VoteSubmitted {
            voter: voter.clone(),
            option,
        })?;

        let next = self.engine.add(current, input, proof).map_err(|e| {
            warn!(option, error = %e, "engine rejected vote input");
            SurveyError::from(e)
        })?;

        let total = self.options.commit(option, next)?;
        let first_vote = self.voters.record(voter);
        debug_assert!(first_vote, "double vote passed ensure_not_voted");

        let mut auto_grantees = vec![&self.owner];
        if let Some(creator) = self.creator.as_ref().filter(|c| **c != self.owner) {
            auto_grantees.push(creator);
        }
        self.grants
            .carry_forward(&mut self.engine, option, total, &auto_grantees);
        self.audit.commit(pending);

        debug!(voter = %voter, option, "vote accepted");
        Ok(())
    }

    // =========================================================================
    // Grants
    // =========================================================================

    /// Grants `grantee` decryption rights on `option`. Callable by anyone.
    ///
    /// Granting an existing grant again succeeds and leaves the grant
    /// relation unchanged.
    ///
    /// # Errors
    ///
    /// - `SurveyError::NotConfigured` before configuration
    /// - `SurveyError::InvalidOption` for an unknown index
    /// - `SurveyError::NoVotesForOption` if the option has no votes
    pub fn grant_to(
        &mut self,
        caller: &Identity,
        grantee: &Identity,
        option: usize,
    ) -> Result<(), SurveyError> {
        self.phase.require_configured()?;
        AccessGrantManager::ensure_eligible(&self.options, option)?;
        let pending = AuditLog::prepare(AuditEvent::GrantIssued {
            grantor: caller.clone(),
            grantee: grantee.clone(),
            option,
        })?;

        self.grants.grant(
            &mut self.engine,
            &self.options,
            option,
            grantee,
            GrantOrigin::Explicit,
        )?;
        self.audit.commit(pending);
        Ok(())
    }

    /// Grants `caller` decryption rights on `option`.
    ///
    /// # Errors
    ///
    /// Same as [`grant_to`](Self::grant_to).
    pub fn grant_to_self(&mut self, caller: &Identity, option: usize) -> Result<(), SurveyError> {
        self.phase.require_configured()?;
        AccessGrantManager::ensure_eligible(&self.options, option)?;
        let pending = AuditLog::prepare(AuditEvent::SelfGrantIssued {
            grantee: caller.clone(),
            option,
        })?;

        self.grants.grant(
            &mut self.engine,
            &self.options,
            option,
            caller,
            GrantOrigin::SelfGrant,
        )?;
        self.audit.commit(pending);
        Ok(())
    }

    /// Grants `caller` decryption rights on every option that currently has
    /// votes, recording one audit event per option.
    ///
    /// Returns the granted option indices in ascending order.
    ///
    /// # Errors
    ///
    /// Returns `SurveyError::NotConfigured` before configuration and
    /// `SurveyError::NoEligibleOptions` if no option has votes.
    pub fn grant_all_to_self(&mut self, caller: &Identity) -> Result<Vec<usize>, SurveyError> {
        self.phase.require_configured()?;
        let eligible = self.options.voted_indices();
        if eligible.is_empty() {
            return Err(SurveyError::NoEligibleOptions);
        }

        let pending = eligible
            .iter()
            .map(|&option| {
                AuditLog::prepare(AuditEvent::SelfGrantIssued {
                    grantee: caller.clone(),
                    option,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        for (&option, record) in eligible.iter().zip(pending) {
            self.grants.grant(
                &mut self.engine,
                &self.options,
                option,
                caller,
                GrantOrigin::SelfGrant,
            )?;
            self.audit.commit(record);
        }
        Ok(eligible)
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Returns the option labels in index order.
    ///
    /// # Errors
    ///
    /// Returns `SurveyError::NotConfigured` before configuration.
    pub fn option_labels(&self) -> Result<Vec<&str>, SurveyError> {
        self.phase.require_configured()?;
        Ok(self.options.labels())
    }

    /// Returns the number of options.
    ///
    /// # Errors
    ///
    /// Returns `SurveyError::NotConfigured` before configuration.
    pub fn option_count(&self) -> Result<usize, SurveyError> {
        self.phase.require_configured()?;
        Ok(self.options.len())
    }

    /// Returns the engine read handle of `option`'s accumulator. Never
    /// decrypts.
    ///
    /// # Errors
    ///
    /// Returns `SurveyError::NotConfigured` before configuration and
    /// `SurveyError::InvalidOption` for an unknown index.
    pub fn encrypted_total(&self, option: usize) -> Result<E::Handle, SurveyError> {
        let total = self.accumulator(option)?;
        Ok(self.engine.peek(total))
    }

    /// Returns `option`'s accumulator, for relaying to the engine on behalf
    /// of a grant holder.
    ///
    /// # Errors
    ///
    /// Same as [`encrypted_total`](Self::encrypted_total).
    pub fn accumulator(&self, option: usize) -> Result<&E::Accumulator, SurveyError> {
        self.phase.require_configured()?;
        Ok(self.options.slot(option)?.total())
    }

    /// Returns `true` once `option` has received a vote.
    ///
    /// # Errors
    ///
    /// Same as [`encrypted_total`](Self::encrypted_total).
    pub fn option_has_votes(&self, option: usize) -> Result<bool, SurveyError> {
        self.phase.require_configured()?;
        Ok(self.options.slot(option)?.has_votes())
    }

    /// Returns `true` if `identity` has an accepted vote. Valid in every
    /// phase.
    #[must_use]
    pub fn has_voter_submitted(&self, identity: &Identity) -> bool {
        self.voters.has_voted(identity)
    }

    /// Returns the number of accepted votes.
    #[must_use]
    pub fn voter_count(&self) -> usize {
        self.voters.voter_count()
    }

    /// Returns `true` if `identity` holds a grant on `option`.
    #[must_use]
    pub fn is_granted(&self, option: usize, identity: &Identity) -> bool {
        self.grants.contains(option, identity)
    }

    /// Returns the grantees of `option` in sorted order.
    #[must_use]
    pub fn grantees(&self, option: usize) -> Vec<&Identity> {
        self.grants.grantees(option)
    }

    /// Returns the current lifecycle phase.
    #[must_use]
    pub const fn phase(&self) -> SurveyPhase {
        self.phase
    }

    /// Returns the question, once configured.
    #[must_use]
    pub fn question(&self) -> Option<&str> {
        self.phase.is_configured().then_some(self.question.as_str())
    }

    /// Returns the administering identity.
    #[must_use]
    pub const fn owner(&self) -> &Identity {
        &self.owner
    }

    /// Returns the identity that configured the survey.
    #[must_use]
    pub const fn creator(&self) -> Option<&Identity> {
        self.creator.as_ref()
    }

    /// Returns the audit log.
    #[must_use]
    pub const fn audit_log(&self) -> &AuditLog {
        &self.audit
    }

    /// Returns the engine.
    #[must_use]
    pub const fn engine(&self) -> &E {
        &self.engine
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &SurveyConfig {
        &self.config
    }
}

fn validate_survey_text(
    limits: &SurveyLimits,
    question: &str,
    labels: &[String],
) -> Result<(), SurveyError> {
    if labels.len() < MIN_OPTIONS {
        return Err(SurveyError::TooFewOptions {
            count: labels.len(),
            min: MIN_OPTIONS,
        });
    }
    if labels.len() > limits.max_options {
        return Err(SurveyError::invalid_input(format!(
            "too many options: {} > {}",
            labels.len(),
            limits.max_options
        )));
    }
    validate_text("question", question, limits.max_question_length)?;
    for (index, label) in labels.iter().enumerate() {
        validate_text(&format!("label {index}"), label, limits.max_label_length)?;
    }
    Ok(())
}

fn validate_text(field: &str, value: &str, max_len: usize) -> Result<(), SurveyError> {
    if value.is_empty() {
        return Err(SurveyError::invalid_input(format!("{field} cannot be empty")));
    }
    if value.len() > max_len {
        return Err(SurveyError::invalid_input(format!(
            "{field} exceeds max length: {} > {max_len}",
            value.len()
        )));
    }
    if value.contains('\0') {
        return Err(SurveyError::invalid_input(format!(
            "{field} contains null byte"
        )));
    }
    Ok(())
}
