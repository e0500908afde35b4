//! Transparent counting engine.
//!
//! [`ClearEngine`] implements [`HomomorphicEngine`] over plain `u64`
//! counters. It offers **no confidentiality whatsoever** and exists for
//! tests and dry-run replays of survey sessions. It does, however, enforce
//! the same contract a real engine would:
//!
//! - inputs must carry a proof bound to their value
//! - every addition mints a fresh accumulator handle
//! - decryption is refused unless the requester was allowed on that exact
//!   handle
//!
//! # Example
//!
//! ```rust
//! use confsurvey_core::engine::{ClearEngine, HomomorphicEngine};
//! use confsurvey_core::Identity;
//!
//! let mut engine = ClearEngine::new();
//! let zero = engine.zero().unwrap();
//! let (input, proof) = ClearEngine::encrypt(1);
//! let total = engine.add(&zero, &input, &proof).unwrap();
//!
//! let owner = Identity::new("owner").unwrap();
//! assert!(engine.decrypt(&total, &owner).is_err());
//! engine.allow(&total, &owner);
//! assert_eq!(engine.decrypt(&total, &owner).unwrap(), 1);
//! ```

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::{EngineError, HomomorphicEngine};
use crate::identity::Identity;

/// Domain separator for clear-engine proofs.
const PROOF_DOMAIN: &[u8] = b"confsurvey.clear.v1";

/// A vote value in the clear.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClearCiphertext(u64);

impl ClearCiphertext {
    /// Wraps a plain value.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Returns the wrapped value.
    #[must_use]
    pub const fn value(&self) -> u64 {
        self.0
    }
}

/// A SHA-256 commitment to a [`ClearCiphertext`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClearProof([u8; 32]);

impl ClearProof {
    /// Computes the proof for `input`.
    #[must_use]
    pub fn for_input(input: &ClearCiphertext) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(PROOF_DOMAIN);
        hasher.update(input.value().to_le_bytes());
        Self(hasher.finalize().into())
    }

    /// Wraps raw proof bytes.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Parses a hex-encoded proof.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::InvalidProof` if the string is not 64 hex
    /// characters.
    pub fn from_hex(hex_str: &str) -> Result<Self, EngineError> {
        let bytes = hex::decode(hex_str)
            .map_err(|e| EngineError::invalid_proof(format!("proof is not hex: {e}")))?;
        let bytes: [u8; 32] = bytes
            .try_into()
            .map_err(|_| EngineError::invalid_proof("proof must be 32 bytes"))?;
        Ok(Self(bytes))
    }

    /// Returns the proof as lowercase hex.
    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

/// Opaque read handle of a [`ClearAccumulator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClearHandle(u64);

impl ClearHandle {
    /// Returns the raw handle number.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ClearHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#018x}", self.0)
    }
}

/// A running total held in the clear.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClearAccumulator {
    handle: ClearHandle,
    total: u64,
}

impl ClearAccumulator {
    /// Returns the handle of this accumulator.
    #[must_use]
    pub const fn handle(&self) -> ClearHandle {
        self.handle
    }
}

/// Transparent engine over `u64` counters.
#[derive(Debug, Default)]
pub struct ClearEngine {
    next_handle: u64,
    allowed: HashSet<(ClearHandle, Identity)>,
}

impl ClearEngine {
    /// Creates a new engine.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Produces an input and a matching proof for `value`.
    #[must_use]
    pub fn encrypt(value: u64) -> (ClearCiphertext, ClearProof) {
        let input = ClearCiphertext::new(value);
        let proof = ClearProof::for_input(&input);
        (input, proof)
    }

    /// Returns `true` if `identity` was allowed on `accumulator`.
    #[must_use]
    pub fn is_allowed(&self, accumulator: &ClearAccumulator, identity: &Identity) -> bool {
        self.allowed
            .contains(&(accumulator.handle, identity.clone()))
    }

    /// Reveals the total of `accumulator` to `requester`.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::NotAllowed` unless `requester` was allowed on
    /// this exact accumulator.
    pub fn decrypt(
        &self,
        accumulator: &ClearAccumulator,
        requester: &Identity,
    ) -> Result<u64, EngineError> {
        if !self.is_allowed(accumulator, requester) {
            return Err(EngineError::NotAllowed {
                requester: requester.to_string(),
                handle: accumulator.handle.to_string(),
            });
        }
        Ok(accumulator.total)
    }

    fn mint(&mut self, total: u64) -> ClearAccumulator {
        self.next_handle = self.next_handle.saturating_add(1);
        ClearAccumulator {
            handle: ClearHandle(self.next_handle),
            total,
        }
    }
}

impl HomomorphicEngine for ClearEngine {
    type Accumulator = ClearAccumulator;
    type Input = ClearCiphertext;
    type Proof = ClearProof;
    type Handle = ClearHandle;

    fn zero(&mut self) -> Result<Self::Accumulator, EngineError> {
        Ok(self.mint(0))
    }

    fn add(
        &mut self,
        accumulator: &Self::Accumulator,
        input: &Self::Input,
        proof: &Self::Proof,
    ) -> Result<Self::Accumulator, EngineError> {
        if ClearProof::for_input(input) != *proof {
            return Err(EngineError::invalid_proof(
                "proof does not commit to the submitted input",
            ));
        }
        let total = accumulator
            .total
            .checked_add(input.value())
            .ok_or(EngineError::Overflow)?;
        Ok(self.mint(total))
    }

    fn allow(&mut self, accumulator: &Self::Accumulator, identity: &Identity) {
        self.allowed.insert((accumulator.handle, identity.clone()));
    }

    fn peek(&self, accumulator: &Self::Accumulator) -> Self::Handle {
        accumulator.handle
    }
}
