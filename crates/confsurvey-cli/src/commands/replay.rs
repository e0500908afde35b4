//! `confsurvey replay`: run a scripted survey session against the clear
//! engine.
//!
//! Every step is reported as `ok` or `error: <kind>: <message>`. A failing
//! step does not stop the replay unless `--strict` is given. After the run
//! the audit log is printed and its hash chain verified.
//!
//! # Exit Codes
//!
//! - 0: Replay completed
//! - 1: A step failed under `--strict`, or the audit chain did not verify

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use confsurvey_core::engine::ClearProof;
use confsurvey_core::{AuditRecord, ClearEngine, Survey, SurveyConfig, SurveyError};
use serde::Serialize;
use tracing::{debug, info};

use super::script::{Script, Step};

/// Exit codes for the replay command.
pub mod exit_codes {
    /// Replay completed.
    pub const SUCCESS: u8 = 0;
    /// A step failed under `--strict` or the audit chain is broken.
    pub const FAILED: u8 = 1;
}

/// Replay command arguments.
#[derive(Debug, Args)]
pub struct ReplayArgs {
    /// Path to the replay script (TOML).
    pub script: PathBuf,

    /// Path to a survey configuration file.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Stop at the first failing step.
    #[arg(long)]
    pub strict: bool,

    /// Print step results and audit records as JSON lines.
    #[arg(long)]
    pub json: bool,

    /// Write the audit log as JSON lines to this file.
    #[arg(long)]
    pub audit_out: Option<PathBuf>,
}

/// Result of one replayed step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepReport {
    /// 1-based step number.
    pub step: usize,
    /// The step's `op` tag.
    pub op: &'static str,
    /// `ok` or `error`.
    pub status: &'static str,
    /// Error kind, on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Error message, on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Step output on success (revealed total, granted options).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl StepReport {
    fn new(step: usize, op: &'static str, result: Result<Option<String>, SurveyError>) -> Self {
        match result {
            Ok(detail) => Self {
                step,
                op,
                status: "ok",
                kind: None,
                message: None,
                detail,
            },
            Err(e) => Self {
                step,
                op,
                status: "error",
                kind: Some(e.kind().to_string()),
                message: Some(e.to_string()),
                detail: None,
            },
        }
    }

    /// Returns `true` if the step succeeded.
    pub fn is_ok(&self) -> bool {
        self.status == "ok"
    }

    fn render(&self) -> String {
        let outcome = match (&self.kind, &self.message, &self.detail) {
            (Some(kind), Some(message), _) => format!("error: {kind}: {message}"),
            (_, _, Some(detail)) => format!("ok ({detail})"),
            _ => "ok".to_string(),
        };
        format!("step {} {}: {outcome}", self.step, self.op)
    }
}

/// Outcome of a replay run.
pub struct Replay {
    /// The survey after the last executed step.
    pub survey: Survey<ClearEngine>,
    /// One report per executed step.
    pub reports: Vec<StepReport>,
}

impl Replay {
    /// Returns `true` if any executed step failed.
    pub fn has_failures(&self) -> bool {
        self.reports.iter().any(|report| !report.is_ok())
    }
}

/// Runs the replay command and returns the exit code.
pub fn run(args: &ReplayArgs) -> Result<u8> {
    let script = Script::from_file(&args.script)?;
    let config = match &args.config {
        Some(path) => SurveyConfig::from_file(path)
            .with_context(|| format!("failed to load config '{}'", path.display()))?,
        None => SurveyConfig::default(),
    };

    let replay = replay(&script, config, args.strict);

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    write_reports(&mut out, &replay.reports, args.json)?;
    write_audit(&mut out, replay.survey.audit_log().records(), args.json)?;

    if let Some(path) = &args.audit_out {
        write_audit_file(path, replay.survey.audit_log().records())?;
    }

    let chain_ok = match replay.survey.audit_log().verify_chain() {
        Ok(()) => {
            writeln!(
                out,
                "audit chain verified: {} records, head {}",
                replay.survey.audit_log().len(),
                hex::encode(replay.survey.audit_log().head_hash())
            )?;
            true
        },
        Err(e) => {
            writeln!(out, "audit chain broken: {e}")?;
            false
        },
    };

    if !chain_ok || (args.strict && replay.has_failures()) {
        Ok(exit_codes::FAILED)
    } else {
        Ok(exit_codes::SUCCESS)
    }
}

/// Executes `script` against a fresh survey.
pub fn replay(script: &Script, config: SurveyConfig, strict: bool) -> Replay {
    let mut survey = Survey::with_config(script.owner.clone(), ClearEngine::new(), config);
    let mut reports = Vec::with_capacity(script.steps.len());

    info!(owner = %script.owner, steps = script.steps.len(), "replaying survey script");

    for (index, step) in script.steps.iter().enumerate() {
        let report = StepReport::new(index + 1, step.op(), apply(&mut survey, step));
        debug!(step = report.step, op = report.op, status = report.status, "step replayed");
        let failed = !report.is_ok();
        reports.push(report);
        if strict && failed {
            break;
        }
    }

    Replay { survey, reports }
}

fn apply(survey: &mut Survey<ClearEngine>, step: &Step) -> Result<Option<String>, SurveyError> {
    match step {
        Step::Configure {
            caller,
            question,
            options,
        } => survey
            .configure(caller, question.as_str(), options.iter().map(String::as_str))
            .map(|()| None),
        Step::Vote {
            voter,
            option,
            value,
            proof,
        } => {
            let (input, matching) = ClearEngine::encrypt(*value);
            let proof = match proof {
                Some(raw) => ClearProof::from_hex(raw)?,
                None => matching,
            };
            survey
                .submit_vote(voter, *option, &input, &proof)
                .map(|()| None)
        },
        Step::Finalize { caller } => survey.finalize(caller).map(|()| None),
        Step::Grant {
            caller,
            grantee,
            option,
        } => survey.grant_to(caller, grantee, *option).map(|()| None),
        Step::GrantSelf { caller, option } => {
            survey.grant_to_self(caller, *option).map(|()| None)
        },
        Step::GrantAllSelf { caller } => {
            let granted = survey.grant_all_to_self(caller)?;
            let list: Vec<String> = granted.iter().map(ToString::to_string).collect();
            Ok(Some(format!("options {}", list.join(","))))
        },
        Step::Reveal { caller, option } => {
            let total = survey.accumulator(*option)?;
            let value = survey.engine().decrypt(total, caller)?;
            Ok(Some(format!("total {value}")))
        },
    }
}

fn write_reports(out: &mut impl Write, reports: &[StepReport], json: bool) -> Result<()> {
    for report in reports {
        if json {
            writeln!(out, "{}", serde_json::to_string(report)?)?;
        } else {
            writeln!(out, "{}", report.render())?;
        }
    }
    Ok(())
}

fn write_audit(out: &mut impl Write, records: &[AuditRecord], json: bool) -> Result<()> {
    for record in records {
        if json {
            writeln!(out, "{}", serde_json::to_string(record)?)?;
        } else {
            writeln!(
                out,
                "#{} {} by {}",
                record.seq_id,
                record.event_type(),
                record.event.actor()
            )?;
        }
    }
    Ok(())
}

fn write_audit_file(path: &Path, records: &[AuditRecord]) -> Result<()> {
    let mut file = std::fs::File::create(path)
        .with_context(|| format!("failed to create '{}'", path.display()))?;
    for record in records {
        writeln!(file, "{}", serde_json::to_string(record)?)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use confsurvey_core::Identity;

    use super::*;

    const SESSION: &str = r#"
        owner = "owner"

        [[step]]
        op = "grant_self"
        caller = "carol"
        option = 0

        [[step]]
        op = "configure"
        caller = "creator"
        question = "Favourite colour?"
        options = ["Red", "Blue"]

        [[step]]
        op = "vote"
        voter = "alice"
        option = 0

        [[step]]
        op = "vote"
        voter = "alice"
        option = 1

        [[step]]
        op = "grant_self"
        caller = "carol"
        option = 0

        [[step]]
        op = "reveal"
        caller = "carol"
        option = 0

        [[step]]
        op = "finalize"
        caller = "owner"
    "#;

    fn run_session(strict: bool) -> Replay {
        let script = Script::from_toml(SESSION).unwrap();
        replay(&script, SurveyConfig::default(), strict)
    }

    #[test]
    fn test_replay_reports_each_step() {
        let replay = run_session(false);
        let lines: Vec<String> = replay.reports.iter().map(StepReport::render).collect();

        assert_eq!(lines.len(), 7);
        assert!(lines[0].starts_with("step 1 grant_self: error: not_configured"));
        assert_eq!(lines[1], "step 2 configure: ok");
        assert!(lines[3].contains("error: already_voted"));
        assert_eq!(lines[5], "step 6 reveal: ok (total 1)");
        assert!(replay.has_failures());
        replay.survey.audit_log().verify_chain().unwrap();
    }

    #[test]
    fn test_strict_stops_at_first_failure() {
        let replay = run_session(true);
        assert_eq!(replay.reports.len(), 1);
        assert!(replay.survey.audit_log().is_empty());
    }

    #[test]
    fn test_reveal_without_grant_fails() {
        let script = Script::from_toml(
            r#"
            owner = "owner"
            [[step]]
            op = "configure"
            caller = "owner"
            question = "Q"
            options = ["a", "b"]
            [[step]]
            op = "vote"
            voter = "alice"
            option = 1
            [[step]]
            op = "reveal"
            caller = "mallory"
            option = 1
            [[step]]
            op = "grant_all_self"
            caller = "mallory"
            "#,
        )
        .unwrap();
        let replay = replay(&script, SurveyConfig::default(), false);

        assert_eq!(replay.reports[2].kind.as_deref(), Some("engine"));
        assert_eq!(replay.reports[3].detail.as_deref(), Some("options 1"));
    }

    #[test]
    fn test_bad_proof_override() {
        let script = Script::from_toml(
            r#"
            owner = "owner"
            [[step]]
            op = "configure"
            caller = "owner"
            question = "Q"
            options = ["a", "b"]
            [[step]]
            op = "vote"
            voter = "alice"
            option = 0
            proof = "not-hex"
            "#,
        )
        .unwrap();
        let replay = replay(&script, SurveyConfig::default(), false);

        assert_eq!(replay.reports[1].kind.as_deref(), Some("invalid_proof"));
        let alice = Identity::new("alice").unwrap();
        assert!(!replay.survey.has_voter_submitted(&alice));
    }

    #[test]
    fn test_json_report_shape() {
        let replay = run_session(false);
        let mut buf = Vec::new();
        write_reports(&mut buf, &replay.reports[..2], true).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let first: serde_json::Value = serde_json::from_str(text.lines().next().unwrap()).unwrap();

        assert_eq!(first["status"], "error");
        assert_eq!(first["kind"], "not_configured");
        assert!(first.get("detail").is_none());
    }

    #[test]
    fn test_run_writes_audit_file() {
        let mut script = tempfile::NamedTempFile::new().unwrap();
        script.write_all(SESSION.as_bytes()).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let audit_out = dir.path().join("audit.jsonl");

        let args = ReplayArgs {
            script: script.path().to_path_buf(),
            config: None,
            strict: false,
            json: true,
            audit_out: Some(audit_out.clone()),
        };
        assert_eq!(run(&args).unwrap(), exit_codes::SUCCESS);

        let written = std::fs::read_to_string(&audit_out).unwrap();
        assert_eq!(written.lines().count(), 4);
    }

    #[test]
    fn test_run_strict_exit_code() {
        let mut script = tempfile::NamedTempFile::new().unwrap();
        script.write_all(SESSION.as_bytes()).unwrap();
        let args = ReplayArgs {
            script: script.path().to_path_buf(),
            config: None,
            strict: true,
            json: false,
            audit_out: None,
        };
        assert_eq!(run(&args).unwrap(), exit_codes::FAILED);
    }
}
