//! `confsurvey verify-log`: check an exported audit log.

use std::path::Path;

use anyhow::{Context, Result};
use confsurvey_core::{AuditLog, AuditRecord};

use super::script::read_bounded_file;

/// Loads JSON-lines audit records from `path`. Blank lines are skipped.
pub fn load(path: &Path) -> Result<AuditLog> {
    let content = read_bounded_file(path)?;
    let mut records = Vec::new();
    for (line_no, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let record: AuditRecord = serde_json::from_str(line)
            .with_context(|| format!("line {}: invalid audit record", line_no + 1))?;
        records.push(record);
    }
    Ok(AuditLog::from_records(records))
}

/// Verifies the hash chain of the log at `path` and prints a summary.
pub fn verify(path: &Path) -> Result<()> {
    let log = load(path)?;
    log.verify_chain()
        .with_context(|| format!("audit log '{}' failed verification", path.display()))?;
    println!(
        "audit chain verified: {} records, head {}",
        log.len(),
        hex::encode(log.head_hash())
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use confsurvey_core::{AuditEvent, Identity};

    use super::*;

    fn exported() -> AuditLog {
        let mut log = AuditLog::new();
        let owner = Identity::new("owner").unwrap();
        log.append(AuditEvent::SurveyConfigured {
            creator: owner.clone(),
            question: "Q".to_string(),
            option_count: 2,
        })
        .unwrap();
        log.append(AuditEvent::SurveyFinalized {
            finalized_by: owner,
        })
        .unwrap();
        log
    }

    fn write_jsonl(records: &[AuditRecord]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        for record in records {
            writeln!(file, "{}", serde_json::to_string(record).unwrap()).unwrap();
        }
        writeln!(file).unwrap();
        file
    }

    #[test]
    fn test_verify_exported_log() {
        let log = exported();
        let file = write_jsonl(log.records());

        let loaded = load(file.path()).unwrap();
        assert_eq!(loaded.len(), 2);
        verify(file.path()).unwrap();
    }

    #[test]
    fn test_tampered_log_fails() {
        let mut records = exported().records().to_vec();
        records[0].event = AuditEvent::SurveyConfigured {
            creator: Identity::new("mallory").unwrap(),
            question: "Q".to_string(),
            option_count: 2,
        };
        let file = write_jsonl(&records);

        let err = verify(file.path()).unwrap_err();
        assert!(format!("{err:#}").contains("failed verification"));
    }

    #[test]
    fn test_malformed_line_reports_position() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{{\"seq_id\": 1}}").unwrap();

        let err = load(file.path()).unwrap_err();
        assert!(err.to_string().contains("line 1"));
    }
}
