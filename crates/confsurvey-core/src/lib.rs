//! # confsurvey-core
//!
//! Confidential multiple-choice surveys over an external homomorphic engine.
//!
//! A survey collects encrypted votes, folds each one into a per-option
//! encrypted accumulator, and controls who may ask the engine to decrypt
//! those accumulators. The crate never performs cryptography itself: the
//! engine is injected through the [`HomomorphicEngine`] trait.
//!
//! - Configure once via [`Survey::configure`]
//! - Accept one vote per identity via [`Survey::submit_vote`]
//! - Close voting via [`Survey::finalize`]
//! - Issue decryption grants via [`Survey::grant_to`],
//!   [`Survey::grant_to_self`] and [`Survey::grant_all_to_self`]
//!
//! ## Core Concepts
//!
//! - **Accumulator**: An encrypted running total per option
//! - **Grant**: The right to request decryption of an option's accumulator
//! - **Audit log**: Hash-chained record of every accepted transition
//!
//! ## Example
//!
//! ```rust
//! use confsurvey_core::{ClearEngine, Identity, Survey};
//!
//! let owner = Identity::new("owner").unwrap();
//! let carol = Identity::new("carol").unwrap();
//!
//! let mut survey = Survey::new(owner.clone(), ClearEngine::new());
//! survey.configure(&owner, "Ship it?", ["Yes", "No"]).unwrap();
//!
//! let (input, proof) = ClearEngine::encrypt(1);
//! survey
//!     .submit_vote(&Identity::new("alice").unwrap(), 0, &input, &proof)
//!     .unwrap();
//!
//! // Option 1 has no votes, so only option 0 is grantable.
//! assert_eq!(survey.grant_all_to_self(&carol).unwrap(), vec![0]);
//! assert!(survey.is_granted(0, &carol));
//! ```
//!
//! ## Disclosure
//!
//! The [`audit`] log records the voter and the chosen option index of every
//! accepted vote. Only the vote *value* stays encrypted.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod accumulator;
pub mod audit;
pub mod config;
pub mod engine;
pub mod error;
pub mod grants;
pub mod identity;
pub mod ledger;
pub mod lifecycle;
pub mod survey;

// Re-export main types at crate root for convenience
pub use audit::{AuditEvent, AuditLog, AuditRecord};
pub use config::{SurveyConfig, SurveyLimits};
pub use engine::{ClearEngine, EngineError, HomomorphicEngine};
pub use error::{ErrorKind, SurveyError};
pub use identity::Identity;
pub use lifecycle::SurveyPhase;
pub use survey::Survey;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::audit::{AuditEvent, AuditLog, AuditRecord};
    pub use crate::config::SurveyConfig;
    pub use crate::engine::{EngineError, HomomorphicEngine};
    pub use crate::error::{ErrorKind, SurveyError};
    pub use crate::identity::Identity;
    pub use crate::lifecycle::SurveyPhase;
    pub use crate::survey::Survey;
}
