//! Replay script format.
//!
//! A script names the survey owner and lists steps in order. Each step is
//! tagged by `op`:
//!
//! ```toml
//! owner = "owner"
//!
//! [[step]]
//! op = "configure"
//! caller = "creator"
//! question = "Favourite colour?"
//! options = ["Red", "Blue"]
//!
//! [[step]]
//! op = "vote"
//! voter = "alice"
//! option = 0
//!
//! [[step]]
//! op = "grant_self"
//! caller = "carol"
//! option = 0
//!
//! [[step]]
//! op = "reveal"
//! caller = "carol"
//! option = 0
//! ```

use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::{bail, Context, Result};
use confsurvey_core::Identity;
use serde::Deserialize;

/// Maximum script file size (1 MiB).
pub const MAX_SCRIPT_FILE_SIZE: u64 = 1024 * 1024;

/// A parsed replay script.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Script {
    /// Survey owner.
    pub owner: Identity,

    /// Steps in execution order.
    #[serde(default, rename = "step")]
    pub steps: Vec<Step>,
}

/// One survey operation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case", deny_unknown_fields)]
pub enum Step {
    /// Configure the survey.
    Configure {
        caller: Identity,
        question: String,
        options: Vec<String>,
    },

    /// Submit a vote. `proof` overrides the matching proof with a hex
    /// string.
    Vote {
        voter: Identity,
        option: usize,
        #[serde(default = "default_vote_value")]
        value: u64,
        #[serde(default)]
        proof: Option<String>,
    },

    /// Finalize the survey.
    Finalize { caller: Identity },

    /// Grant a third party access to an option.
    Grant {
        caller: Identity,
        grantee: Identity,
        option: usize,
    },

    /// Grant the caller access to an option.
    GrantSelf { caller: Identity, option: usize },

    /// Grant the caller access to every voted option.
    GrantAllSelf { caller: Identity },

    /// Decrypt an option total as the caller.
    Reveal { caller: Identity, option: usize },
}

impl Step {
    /// Returns the `op` tag of this step.
    pub const fn op(&self) -> &'static str {
        match self {
            Self::Configure { .. } => "configure",
            Self::Vote { .. } => "vote",
            Self::Finalize { .. } => "finalize",
            Self::Grant { .. } => "grant",
            Self::GrantSelf { .. } => "grant_self",
            Self::GrantAllSelf { .. } => "grant_all_self",
            Self::Reveal { .. } => "reveal",
        }
    }
}

const fn default_vote_value() -> u64 {
    1
}

impl Script {
    /// Parses a script from TOML.
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).context("failed to parse replay script")
    }

    /// Reads and parses a script file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = read_bounded_file(path)?;
        Self::from_toml(&content)
            .with_context(|| format!("invalid script '{}'", path.display()))
    }
}

/// Reads a file with a size limit.
pub fn read_bounded_file(path: &Path) -> Result<String> {
    let file = File::open(path)
        .with_context(|| format!("failed to open file '{}'", path.display()))?;

    let mut content = String::new();
    file.take(MAX_SCRIPT_FILE_SIZE + 1)
        .read_to_string(&mut content)
        .with_context(|| format!("failed to read file '{}'", path.display()))?;

    if content.len() as u64 > MAX_SCRIPT_FILE_SIZE {
        bail!(
            "file '{}' exceeds maximum size limit of {MAX_SCRIPT_FILE_SIZE} bytes",
            path.display()
        );
    }
    Ok(content)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn id(name: &str) -> Identity {
        Identity::new(name).unwrap()
    }

    #[test]
    fn test_parse_all_steps() {
        let script = Script::from_toml(
            r#"
            owner = "owner"

            [[step]]
            op = "configure"
            caller = "creator"
            question = "Q"
            options = ["Red", "Blue"]

            [[step]]
            op = "vote"
            voter = "alice"
            option = 1

            [[step]]
            op = "vote"
            voter = "bob"
            option = 0
            value = 3
            proof = "00"

            [[step]]
            op = "finalize"
            caller = "owner"

            [[step]]
            op = "grant"
            caller = "alice"
            grantee = "carol"
            option = 1

            [[step]]
            op = "grant_self"
            caller = "dave"
            option = 1

            [[step]]
            op = "grant_all_self"
            caller = "erin"

            [[step]]
            op = "reveal"
            caller = "carol"
            option = 1
            "#,
        )
        .unwrap();

        assert_eq!(script.owner, id("owner"));
        let ops: Vec<&str> = script.steps.iter().map(Step::op).collect();
        assert_eq!(
            ops,
            vec![
                "configure",
                "vote",
                "vote",
                "finalize",
                "grant",
                "grant_self",
                "grant_all_self",
                "reveal"
            ]
        );
        assert_eq!(
            script.steps[1],
            Step::Vote {
                voter: id("alice"),
                option: 1,
                value: 1,
                proof: None
            }
        );
    }

    #[test]
    fn test_empty_identity_rejected() {
        let err = Script::from_toml("owner = \"\"\n").unwrap_err();
        assert!(format!("{err:#}").contains("identity"));
    }

    #[test]
    fn test_unknown_op_rejected() {
        let raw = "owner = \"o\"\n[[step]]\nop = \"revoke\"\ncaller = \"o\"\n";
        assert!(Script::from_toml(raw).is_err());
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "owner = \"owner\"").unwrap();
        let script = Script::from_file(file.path()).unwrap();
        assert!(script.steps.is_empty());

        assert!(Script::from_file(Path::new("/nonexistent/script.toml")).is_err());
    }

    #[test]
    fn test_oversized_file_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let filler = "#".repeat(usize::try_from(MAX_SCRIPT_FILE_SIZE).unwrap() + 1);
        file.write_all(filler.as_bytes()).unwrap();

        let err = read_bounded_file(file.path()).unwrap_err();
        assert!(err.to_string().contains("exceeds maximum size"));
    }
}
