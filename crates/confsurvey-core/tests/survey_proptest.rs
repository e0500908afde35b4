//! Property-based tests for survey invariants.
//!
//! Sessions are generated as sequences of `(voter, option)` pairs over a
//! small identity pool so that repeat voters occur often.

use std::collections::{BTreeMap, BTreeSet};

use confsurvey_core::{ClearEngine, ErrorKind, Identity, Survey};
use proptest::prelude::*;

const OPTION_COUNT: usize = 4;

fn id(name: &str) -> Identity {
    Identity::new(name).unwrap()
}

fn survey() -> Survey<ClearEngine> {
    let mut survey = Survey::new(id("owner"), ClearEngine::new());
    survey
        .configure(&id("creator"), "Q", ["a", "b", "c", "d"])
        .unwrap();
    survey
}

/// Strategy for a vote: voter index into a pool of 8, option possibly out of
/// range.
fn ballot() -> impl Strategy<Value = (u8, usize)> {
    (0u8..8, 0usize..OPTION_COUNT + 2)
}

fn voter(index: u8) -> Identity {
    id(&format!("voter-{index}"))
}

fn cast_all(survey: &mut Survey<ClearEngine>, ballots: Vec<(u8, usize)>) {
    for (who, option) in ballots {
        let (input, proof) = ClearEngine::encrypt(1);
        let _ = survey.submit_vote(&voter(who), option, &input, &proof);
    }
}

fn reveal(survey: &Survey<ClearEngine>, option: usize) -> u64 {
    let total = survey.accumulator(option).unwrap();
    survey.engine().decrypt(total, &id("owner")).unwrap_or(0)
}

proptest! {
    /// Property: each identity is accepted at most once, and every rejected
    /// repeat is reported as `AlreadyVoted`.
    #[test]
    fn prop_at_most_one_vote_per_identity(
        ballots in prop::collection::vec(ballot(), 0..40),
    ) {
        let mut survey = survey();
        let mut accepted = BTreeSet::new();

        for (who, option) in ballots {
            let (input, proof) = ClearEngine::encrypt(1);
            match survey.submit_vote(&voter(who), option, &input, &proof) {
                Ok(()) => prop_assert!(accepted.insert(who)),
                Err(e) if accepted.contains(&who) => {
                    prop_assert_eq!(e.kind(), ErrorKind::AlreadyVoted);
                }
                Err(e) => {
                    prop_assert!(option >= OPTION_COUNT);
                    prop_assert_eq!(e.kind(), ErrorKind::InvalidOption);
                }
            }
        }

        prop_assert_eq!(survey.voter_count(), accepted.len());
        let vote_events = survey.audit_log().by_type("vote.submitted").count();
        prop_assert_eq!(vote_events, accepted.len());
    }

    /// Property: totals equal the number of accepted votes per option, in
    /// whatever order the votes arrive.
    #[test]
    fn prop_totals_match_accepted_votes(
        ballots in prop::collection::vec(ballot(), 0..40),
    ) {
        let mut forward = survey();
        let mut reversed = survey();
        let mut expected: BTreeMap<usize, u64> = BTreeMap::new();

        for &(who, option) in &ballots {
            let (input, proof) = ClearEngine::encrypt(1);
            if forward.submit_vote(&voter(who), option, &input, &proof).is_ok() {
                *expected.entry(option).or_default() += 1;
            }
        }

        // Dedupe to first vote per voter so both orders accept the same set.
        let mut seen = BTreeSet::new();
        let first_votes: Vec<_> = ballots
            .iter()
            .filter(|(who, option)| *option < OPTION_COUNT && seen.insert(*who))
            .collect();
        for &&(who, option) in first_votes.iter().rev() {
            let (input, proof) = ClearEngine::encrypt(1);
            reversed.submit_vote(&voter(who), option, &input, &proof).unwrap();
        }

        for option in 0..OPTION_COUNT {
            let want = expected.get(&option).copied().unwrap_or(0);
            prop_assert_eq!(reveal(&forward, option), want);
            prop_assert_eq!(reveal(&reversed, option), want);
            prop_assert_eq!(forward.option_has_votes(option).unwrap(), want > 0);
        }
    }

    /// Property: `grant_all_to_self` grants exactly the options with votes.
    #[test]
    fn prop_grant_all_matches_voted_options(
        ballots in prop::collection::vec(ballot(), 0..20),
    ) {
        let mut survey = survey();
        for (who, option) in ballots {
            let (input, proof) = ClearEngine::encrypt(1);
            let _ = survey.submit_vote(&voter(who), option, &input, &proof);
        }

        let voted: Vec<usize> = (0..OPTION_COUNT)
            .filter(|&option| survey.option_has_votes(option).unwrap())
            .collect();
        let carol = id("carol");

        match survey.grant_all_to_self(&carol) {
            Ok(granted) => prop_assert_eq!(granted, voted),
            Err(e) => {
                prop_assert!(voted.is_empty());
                prop_assert_eq!(e.kind(), ErrorKind::NotEligible);
            }
        }
        for option in 0..OPTION_COUNT {
            prop_assert_eq!(
                survey.is_granted(option, &carol),
                survey.option_has_votes(option).unwrap()
            );
        }
    }

    /// Property: once granted, an identity can decrypt the current
    /// accumulator of that option no matter how many votes follow.
    #[test]
    fn prop_grants_cover_current_accumulator(
        early in prop::collection::vec(ballot(), 1..12),
        late in prop::collection::vec(ballot(), 0..12),
        grant_options in prop::collection::vec(0usize..OPTION_COUNT, 0..6),
    ) {
        let mut survey = survey();
        cast_all(&mut survey, early);
        for (n, option) in grant_options.into_iter().enumerate() {
            let _ = survey.grant_to_self(&id(&format!("reader-{n}")), option);
        }
        let _ = survey.grant_all_to_self(&id("auditor"));
        cast_all(&mut survey, late);

        for option in 0..OPTION_COUNT {
            let total = survey.accumulator(option).unwrap();
            for grantee in survey.grantees(option) {
                prop_assert!(survey.engine().decrypt(total, grantee).is_ok());
            }
            prop_assert_eq!(
                survey.grantees(option).is_empty(),
                !survey.option_has_votes(option).unwrap()
            );
        }
    }
}
