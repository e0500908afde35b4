//! Homomorphic engine capability boundary.
//!
//! The survey never performs cryptography. It consumes an external engine
//! through the [`HomomorphicEngine`] trait, which exposes exactly the
//! operations the survey needs:
//!
//! - [`zero`](HomomorphicEngine::zero): a fresh all-zero accumulator
//! - [`add`](HomomorphicEngine::add): validate a proof and fold an encrypted
//!   input into an accumulator
//! - [`allow`](HomomorphicEngine::allow): irrevocably let an identity request
//!   decryption of an accumulator
//! - [`peek`](HomomorphicEngine::peek): an opaque read handle for relaying
//!   to callers who already hold a grant
//!
//! Accumulators are opaque to the survey. They are stored, passed back to
//! the engine and handed out through `peek`, never inspected.
//!
//! # Atomicity
//!
//! `add` must not modify the accumulator it receives; it returns the new
//! accumulator and the survey swaps it in only after every other
//! precondition has passed. An engine that fails `add` must leave no
//! survey-visible trace.

pub mod clear;

use std::fmt;

use thiserror::Error;

use crate::identity::Identity;

pub use clear::{ClearAccumulator, ClearCiphertext, ClearEngine, ClearHandle, ClearProof};

/// Errors reported by a homomorphic engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum EngineError {
    /// The proof does not validate against the encrypted input.
    #[error("invalid input proof: {reason}")]
    InvalidProof {
        /// Why the proof was rejected.
        reason: String,
    },

    /// The accumulator cannot absorb the input without overflowing.
    #[error("accumulator overflow")]
    Overflow,

    /// The requester holds no decryption grant on the accumulator.
    #[error("{requester} is not allowed to decrypt accumulator {handle}")]
    NotAllowed {
        /// The identity that asked for decryption.
        requester: String,
        /// Display form of the accumulator handle.
        handle: String,
    },

    /// The engine backend could not be reached.
    #[error("engine unavailable: {reason}")]
    Unavailable {
        /// Why the backend is unavailable.
        reason: String,
    },
}

impl EngineError {
    /// Creates a new invalid proof error.
    #[must_use]
    pub fn invalid_proof(reason: impl Into<String>) -> Self {
        Self::InvalidProof {
            reason: reason.into(),
        }
    }

    /// Creates a new unavailable error.
    #[must_use]
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable {
            reason: reason.into(),
        }
    }

    /// Returns `true` if the same call may succeed later.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable { .. })
    }
}

/// The homomorphic capability consumed by a survey.
pub trait HomomorphicEngine {
    /// An encrypted running total.
    type Accumulator: Clone + fmt::Debug;

    /// An externally encrypted vote value.
    type Input;

    /// Evidence that [`Self::Input`] is well formed.
    type Proof;

    /// Read handle relayed to grant holders.
    type Handle;

    /// Returns a fresh accumulator holding an encrypted zero.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine cannot produce a ciphertext.
    fn zero(&mut self) -> Result<Self::Accumulator, EngineError>;

    /// Validates `proof` against `input` and returns `accumulator + input`.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::InvalidProof` if the proof does not validate,
    /// or another engine error if the addition cannot be performed.
    fn add(
        &mut self,
        accumulator: &Self::Accumulator,
        input: &Self::Input,
        proof: &Self::Proof,
    ) -> Result<Self::Accumulator, EngineError>;

    /// Records that `identity` may request decryption of `accumulator`.
    ///
    /// Irrevocable. Allowing the same identity twice is a no-op.
    fn allow(&mut self, accumulator: &Self::Accumulator, identity: &Identity);

    /// Returns the read handle for `accumulator` without decrypting it.
    fn peek(&self, accumulator: &Self::Accumulator) -> Self::Handle;
}
