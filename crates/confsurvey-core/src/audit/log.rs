//! Append-only, hash-chained audit log.
//!
//! Every record commits to its predecessor:
//!
//! ```text
//! record_hash = SHA-256(prev_hash || seq_id_le || timestamp_ns_le || JCS(event))
//! ```
//!
//! with a genesis `prev_hash` of 32 zero bytes. Sequence IDs start at 1 and
//! are dense.
//!
//! Appending is split into [`AuditLog::prepare`] (fallible, encodes the
//! event) and [`AuditLog::commit`] (infallible). Callers prepare every record
//! of a transition before mutating any state, so a transition is either
//! fully recorded or not applied at all.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

use super::events::AuditEvent;

/// Genesis `prev_hash`.
pub const GENESIS_HASH: [u8; 32] = [0u8; 32];

/// Errors that can occur during audit log operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AuditError {
    /// Event could not be canonically encoded.
    #[error("failed to encode audit event: {0}")]
    Encoding(#[from] serde_json::Error),

    /// Invalid sequence number requested.
    #[error("invalid cursor position: {cursor}")]
    InvalidCursor {
        /// The invalid cursor value.
        cursor: u64,
    },

    /// Record not found.
    #[error("audit record not found: seq_id={seq_id}")]
    EventNotFound {
        /// The sequence ID that was not found.
        seq_id: u64,
    },

    /// Hash chain verification failed.
    #[error("hash chain broken at seq_id={seq_id}: {details}")]
    HashChainBroken {
        /// The sequence ID where the chain broke.
        seq_id: u64,
        /// Details about the failure.
        details: String,
    },
}

/// A committed audit record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuditRecord {
    /// Sequence ID, starting at 1.
    pub seq_id: u64,

    /// Timestamp in nanoseconds since Unix epoch.
    pub timestamp_ns: u64,

    /// The recorded event.
    pub event: AuditEvent,

    /// Hash of the previous record.
    #[serde(with = "hex::serde")]
    pub prev_hash: [u8; 32],

    /// Hash of this record.
    #[serde(with = "hex::serde")]
    pub record_hash: [u8; 32],
}

impl AuditRecord {
    /// Returns the event type of the recorded event.
    #[must_use]
    pub const fn event_type(&self) -> &'static str {
        self.event.event_type()
    }
}

/// An encoded event awaiting commit.
#[derive(Debug, Clone)]
pub struct PendingRecord {
    event: AuditEvent,
    payload: Vec<u8>,
}

impl PendingRecord {
    /// Returns the pending event.
    #[must_use]
    pub const fn event(&self) -> &AuditEvent {
        &self.event
    }
}

/// In-memory append-only audit log.
#[derive(Debug, Clone, Default)]
pub struct AuditLog {
    records: Vec<AuditRecord>,
}

impl AuditLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps previously persisted records.
    ///
    /// The records are not checked here; call
    /// [`verify_chain`](Self::verify_chain) before trusting them.
    #[must_use]
    pub fn from_records(records: Vec<AuditRecord>) -> Self {
        Self { records }
    }

    /// Encodes `event` for a later [`commit`](Self::commit).
    ///
    /// # Errors
    ///
    /// Returns `AuditError::Encoding` if the event cannot be encoded.
    pub fn prepare(event: AuditEvent) -> Result<PendingRecord, AuditError> {
        let payload = serde_jcs::to_vec(&event)?;
        Ok(PendingRecord { event, payload })
    }

    /// Appends a prepared record stamped with the current time.
    pub fn commit(&mut self, pending: PendingRecord) -> u64 {
        self.commit_at(pending, current_timestamp_ns())
    }

    /// Appends a prepared record with a specific timestamp.
    ///
    /// This is useful for testing and deterministic replay.
    pub fn commit_at(&mut self, pending: PendingRecord, timestamp_ns: u64) -> u64 {
        let seq_id = self.next_seq_id();
        let prev_hash = self.head_hash();
        let record_hash = record_hash(&prev_hash, seq_id, timestamp_ns, &pending.payload);
        self.records.push(AuditRecord {
            seq_id,
            timestamp_ns,
            event: pending.event,
            prev_hash,
            record_hash,
        });
        seq_id
    }

    /// Prepares and commits `event` in one step.
    ///
    /// # Errors
    ///
    /// Returns `AuditError::Encoding` if the event cannot be encoded.
    pub fn append(&mut self, event: AuditEvent) -> Result<u64, AuditError> {
        let pending = Self::prepare(event)?;
        Ok(self.commit(pending))
    }

    /// Returns the number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if the log has no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Returns all records in sequence order.
    #[must_use]
    pub fn records(&self) -> &[AuditRecord] {
        &self.records
    }

    /// Returns the hash of the last record, or the genesis hash.
    #[must_use]
    pub fn head_hash(&self) -> [u8; 32] {
        self.records
            .last()
            .map_or(GENESIS_HASH, |record| record.record_hash)
    }

    /// Reads up to `limit` records starting at `cursor` (a sequence ID).
    ///
    /// A cursor past the head yields an empty slice.
    ///
    /// # Errors
    ///
    /// Returns `AuditError::InvalidCursor` for cursor 0.
    pub fn read_from(&self, cursor: u64, limit: usize) -> Result<&[AuditRecord], AuditError> {
        if cursor == 0 {
            return Err(AuditError::InvalidCursor { cursor });
        }
        let start = usize::try_from(cursor - 1)
            .unwrap_or(usize::MAX)
            .min(self.records.len());
        let end = start.saturating_add(limit).min(self.records.len());
        Ok(&self.records[start..end])
    }

    /// Reads a single record by sequence ID.
    ///
    /// # Errors
    ///
    /// Returns `AuditError::EventNotFound` if no such record exists.
    pub fn read_one(&self, seq_id: u64) -> Result<&AuditRecord, AuditError> {
        seq_id
            .checked_sub(1)
            .and_then(|index| usize::try_from(index).ok())
            .and_then(|index| self.records.get(index))
            .ok_or(AuditError::EventNotFound { seq_id })
    }

    /// Iterates records whose event type equals `event_type`.
    pub fn by_type<'a>(&'a self, event_type: &'a str) -> impl Iterator<Item = &'a AuditRecord> {
        self.records
            .iter()
            .filter(move |record| record.event_type() == event_type)
    }

    /// Verifies sequence numbering and the hash chain from genesis.
    ///
    /// # Errors
    ///
    /// Returns `AuditError::HashChainBroken` at the first inconsistent
    /// record, or `AuditError::Encoding` if an event cannot be re-encoded.
    pub fn verify_chain(&self) -> Result<(), AuditError> {
        let mut expected_prev = GENESIS_HASH;
        for (expected_seq, record) in (1u64..).zip(&self.records) {
            if record.seq_id != expected_seq {
                return Err(AuditError::HashChainBroken {
                    seq_id: record.seq_id,
                    details: format!("expected seq_id {expected_seq}"),
                });
            }
            if record.prev_hash != expected_prev {
                return Err(AuditError::HashChainBroken {
                    seq_id: record.seq_id,
                    details: "prev_hash does not match previous record".to_string(),
                });
            }
            let payload = serde_jcs::to_vec(&record.event)?;
            let computed = record_hash(
                &record.prev_hash,
                record.seq_id,
                record.timestamp_ns,
                &payload,
            );
            if computed != record.record_hash {
                return Err(AuditError::HashChainBroken {
                    seq_id: record.seq_id,
                    details: format!(
                        "record_hash mismatch: stored {}, computed {}",
                        hex::encode(record.record_hash),
                        hex::encode(computed)
                    ),
                });
            }
            expected_prev = record.record_hash;
        }
        Ok(())
    }

    fn next_seq_id(&self) -> u64 {
        self.records
            .last()
            .map_or(1, |record| record.seq_id.saturating_add(1))
    }
}

fn record_hash(prev_hash: &[u8; 32], seq_id: u64, timestamp_ns: u64, payload: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(prev_hash);
    hasher.update(seq_id.to_le_bytes());
    hasher.update(timestamp_ns.to_le_bytes());
    hasher.update(payload);
    hasher.finalize().into()
}

fn current_timestamp_ns() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};

    #[allow(clippy::cast_possible_truncation)]
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}
