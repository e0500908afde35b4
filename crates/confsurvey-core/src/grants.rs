//! Decryption grants on option accumulators.
//!
//! The [`AccessGrantManager`] decides who may ask the engine to decrypt an
//! option's accumulator and keeps the monotonic `(option, grantee)` relation.
//! There is no revocation, and a grant covers the option's current and
//! future accumulators: every accepted vote re-allows all grantees of the
//! option on the new accumulator (see
//! [`carry_forward`](AccessGrantManager::carry_forward)).
//!
//! # Eligibility
//!
//! An option is only grantable once it has received a vote. Granting access
//! to a never-touched accumulator would reveal its (publicly known) zero
//! total, so an all-zero aggregate is treated as just as sensitive as a real
//! tally.
//!
//! # Grant origins
//!
//! - [`GrantOrigin::Automatic`]: owner and creator, added on the first
//!   accepted vote for an option
//! - [`GrantOrigin::Explicit`]: any caller granting a third party
//! - [`GrantOrigin::SelfGrant`]: a caller granting itself

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use crate::accumulator::AccumulatorStore;
use crate::engine::HomomorphicEngine;
use crate::error::SurveyError;
use crate::identity::Identity;

/// How a grant came to exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrantOrigin {
    /// Automatic grant to owner/creator on an accepted vote.
    Automatic,
    /// A caller granted access to a third party.
    Explicit,
    /// The grantee granted access to itself.
    SelfGrant,
}

impl GrantOrigin {
    /// Returns the origin as a string identifier.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Automatic => "automatic",
            Self::Explicit => "explicit",
            Self::SelfGrant => "self",
        }
    }
}

/// Append-only `(option, grantee)` relation plus grant issuance.
#[derive(Debug, Clone, Default)]
pub struct AccessGrantManager {
    grants: BTreeMap<usize, BTreeSet<Identity>>,
}

impl AccessGrantManager {
    /// Creates an empty manager.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Checks that `option` exists and has received a vote.
    ///
    /// # Errors
    ///
    /// Returns `SurveyError::InvalidOption` for an unknown index and
    /// `SurveyError::NoVotesForOption` if the option has no votes.
    pub fn ensure_eligible<A>(
        store: &AccumulatorStore<A>,
        option: usize,
    ) -> Result<(), SurveyError> {
        if store.slot(option)?.has_votes() {
            Ok(())
        } else {
            Err(SurveyError::NoVotesForOption { index: option })
        }
    }

    /// Grants `grantee` decryption rights on `option`'s current accumulator.
    ///
    /// Returns `true` if the `(option, grantee)` pair is new. Re-granting is
    /// harmless: the engine treats a repeated allow as a no-op.
    ///
    /// # Errors
    ///
    /// See [`ensure_eligible`](Self::ensure_eligible). Nothing is recorded
    /// on error.
    pub fn grant<E: HomomorphicEngine>(
        &mut self,
        engine: &mut E,
        store: &AccumulatorStore<E::Accumulator>,
        option: usize,
        grantee: &Identity,
        origin: GrantOrigin,
    ) -> Result<bool, SurveyError> {
        Self::ensure_eligible(store, option)?;
        let total = store.slot(option)?.total();
        engine.allow(total, grantee);
        let is_new = self.insert(option, grantee);
        debug!(
            option,
            grantee = %grantee,
            origin = origin.as_str(),
            is_new,
            "decryption grant issued"
        );
        Ok(is_new)
    }

    /// Moves every grant on `option` onto `total`, the freshly committed
    /// accumulator, after first adding `automatic` (owner and creator) to
    /// the option's grantees. Used after an accepted vote.
    ///
    /// Each addition yields a new accumulator, so without this step a
    /// grant would only ever cover the value it was issued on.
    pub fn carry_forward<E: HomomorphicEngine>(
        &mut self,
        engine: &mut E,
        option: usize,
        total: &E::Accumulator,
        automatic: &[&Identity],
    ) {
        for grantee in automatic {
            let is_new = self.insert(option, grantee);
            debug!(
                option,
                grantee = %grantee,
                origin = GrantOrigin::Automatic.as_str(),
                is_new,
                "decryption grant issued"
            );
        }
        if let Some(grantees) = self.grants.get(&option) {
            for grantee in grantees {
                engine.allow(total, grantee);
            }
        }
    }

    fn insert(&mut self, option: usize, grantee: &Identity) -> bool {
        self.grants
            .entry(option)
            .or_default()
            .insert(grantee.clone())
    }

    /// Returns `true` if `grantee` holds a grant on `option`.
    #[must_use]
    pub fn contains(&self, option: usize, grantee: &Identity) -> bool {
        self.grants
            .get(&option)
            .is_some_and(|set| set.contains(grantee))
    }

    /// Returns the grantees of `option` in sorted order.
    #[must_use]
    pub fn grantees(&self, option: usize) -> Vec<&Identity> {
        self.grants
            .get(&option)
            .map(|set| set.iter().collect())
            .unwrap_or_default()
    }

    /// Returns the total number of `(option, grantee)` pairs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.grants.values().map(BTreeSet::len).sum()
    }

    /// Returns `true` if no grant exists.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.grants.values().all(BTreeSet::is_empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{ClearAccumulator, ClearEngine};

    fn id(name: &str) -> Identity {
        Identity::new(name).unwrap()
    }

    fn setup() -> (ClearEngine, AccumulatorStore<ClearAccumulator>) {
        let mut engine = ClearEngine::new();
        let store = AccumulatorStore::from_initial(vec![
            ("Red".to_string(), engine.zero().unwrap()),
            ("Blue".to_string(), engine.zero().unwrap()),
        ]);
        (engine, store)
    }

    fn vote(
        engine: &mut ClearEngine,
        store: &mut AccumulatorStore<ClearAccumulator>,
        option: usize,
    ) {
        let (input, proof) = ClearEngine::encrypt(1);
        let next = engine
            .add(store.slot(option).unwrap().total(), &input, &proof)
            .unwrap();
        store.commit(option, next).unwrap();
    }

    #[test]
    fn test_grant_requires_votes() {
        let (mut engine, store) = setup();
        let mut grants = AccessGrantManager::new();
        let carol = id("carol");

        let err = grants
            .grant(&mut engine, &store, 0, &carol, GrantOrigin::SelfGrant)
            .unwrap_err();
        assert_eq!(err, SurveyError::NoVotesForOption { index: 0 });
        assert!(grants.is_empty());
    }

    #[test]
    fn test_grant_unknown_option() {
        let (mut engine, store) = setup();
        let mut grants = AccessGrantManager::new();

        let err = grants
            .grant(&mut engine, &store, 9, &id("carol"), GrantOrigin::Explicit)
            .unwrap_err();
        assert_eq!(err, SurveyError::invalid_option(9, 2));
    }

    #[test]
    fn test_grant_allows_engine_decrypt() {
        let (mut engine, mut store) = setup();
        vote(&mut engine, &mut store, 1);
        let mut grants = AccessGrantManager::new();
        let carol = id("carol");

        assert!(grants
            .grant(&mut engine, &store, 1, &carol, GrantOrigin::SelfGrant)
            .unwrap());
        assert!(!grants
            .grant(&mut engine, &store, 1, &carol, GrantOrigin::SelfGrant)
            .unwrap());
        assert_eq!(grants.len(), 1);
        assert!(grants.contains(1, &carol));
        assert_eq!(
            engine.decrypt(store.slot(1).unwrap().total(), &carol).unwrap(),
            1
        );
    }

    #[test]
    fn test_carry_forward_dedupes_automatic() {
        let (mut engine, mut store) = setup();
        vote(&mut engine, &mut store, 0);
        let mut grants = AccessGrantManager::new();
        let owner = id("owner");
        let total = store.slot(0).unwrap().total().clone();

        grants.carry_forward(&mut engine, 0, &total, &[&owner, &owner]);
        assert_eq!(grants.grantees(0), vec![&owner]);
        assert!(engine.is_allowed(&total, &owner));
    }

    #[test]
    fn test_carry_forward_reallows_existing_grantees() {
        let (mut engine, mut store) = setup();
        vote(&mut engine, &mut store, 1);
        let mut grants = AccessGrantManager::new();
        let carol = id("carol");
        grants
            .grant(&mut engine, &store, 1, &carol, GrantOrigin::SelfGrant)
            .unwrap();

        vote(&mut engine, &mut store, 1);
        let total = store.slot(1).unwrap().total().clone();
        assert!(!engine.is_allowed(&total, &carol));

        grants.carry_forward(&mut engine, 1, &total, &[]);
        assert_eq!(engine.decrypt(&total, &carol).unwrap(), 2);
        assert!(!engine.is_allowed(&total, &id("dave")));
    }

    #[test]
    fn test_carry_forward_is_per_option() {
        let (mut engine, mut store) = setup();
        vote(&mut engine, &mut store, 0);
        vote(&mut engine, &mut store, 1);
        let mut grants = AccessGrantManager::new();
        let carol = id("carol");
        grants
            .grant(&mut engine, &store, 0, &carol, GrantOrigin::SelfGrant)
            .unwrap();

        vote(&mut engine, &mut store, 1);
        let total = store.slot(1).unwrap().total().clone();
        grants.carry_forward(&mut engine, 1, &total, &[]);
        assert!(!engine.is_allowed(&total, &carol));
    }

    #[test]
    fn test_grantees_sorted() {
        let (mut engine, mut store) = setup();
        vote(&mut engine, &mut store, 0);
        let mut grants = AccessGrantManager::new();
        for name in ["zed", "amy"] {
            grants
                .grant(&mut engine, &store, 0, &id(name), GrantOrigin::Explicit)
                .unwrap();
        }

        let names: Vec<&str> = grants.grantees(0).iter().map(|i| i.as_str()).collect();
        assert_eq!(names, vec!["amy", "zed"]);
        assert!(grants.grantees(1).is_empty());
    }
}
