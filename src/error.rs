//! Error types with fix suggestions
//!
//! Every failure an invocation can hit is reported through [`WbError`].
//! Codes group by layer: definitions (WB-00x), validation (WB-01x),
//! filesystem (WB-02x), process (WB-03x) and post-conditions (WB-04x).

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Trait for errors that provide fix suggestions
pub trait FixSuggestion {
    fn fix_suggestion(&self) -> Option<&str>;
}

/// Coarse classification used by callers that only care about the layer
/// that rejected an invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Definition,
    Validation,
    NotFound,
    Execution,
    Postcondition,
    Other,
}

#[derive(Error, Debug)]
pub enum WbError {
    // ─────────────────────────────────────────────────────────────
    // Definition errors (WB-001 to WB-002)
    // ─────────────────────────────────────────────────────────────
    #[error("WB-001: Unknown command '{name}'")]
    UnknownCommand { name: String },

    #[error("WB-002: Invalid definition for '{command}': {details}")]
    Definition { command: String, details: String },

    // ─────────────────────────────────────────────────────────────
    // Validation errors (WB-010 to WB-015)
    // ─────────────────────────────────────────────────────────────
    #[error("WB-010: Unknown field '{field}' for command '{command}'")]
    UnknownField { command: String, field: String },

    #[error("WB-011: Field '{field}' expects {expected}, got {found}")]
    TypeMismatch {
        field: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("WB-012: '{value}' is not a valid value for '{field}' (allowed: {allowed})")]
    InvalidChoice {
        field: String,
        value: String,
        allowed: String,
    },

    #[error("WB-013: Entry {index} of '{field}' has {found} elements, expected {expected}")]
    TupleArity {
        field: String,
        index: usize,
        found: usize,
        expected: &'static str,
    },

    #[error("WB-014: Missing mandatory field '{field}' for command '{command}'")]
    MissingField { command: String, field: String },

    #[error("WB-015: Field '{field}' requires '{requires}' to be set")]
    MissingCompanion { field: String, requires: String },

    // ─────────────────────────────────────────────────────────────
    // Filesystem errors (WB-020)
    // ─────────────────────────────────────────────────────────────
    #[error("WB-020: Input '{field}' does not exist: {}", path.display())]
    NotFound { field: String, path: PathBuf },

    // ─────────────────────────────────────────────────────────────
    // Process errors (WB-030 to WB-032)
    // ─────────────────────────────────────────────────────────────
    #[error("WB-030: '{program}' exited with {status}: {diagnostics}")]
    Execution {
        program: String,
        status: String,
        diagnostics: String,
    },

    #[error("WB-031: Failed to launch '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("WB-032: '{program}' timed out after {limit:?}")]
    Timeout { program: String, limit: Duration },

    // ─────────────────────────────────────────────────────────────
    // Post-condition errors (WB-040)
    // ─────────────────────────────────────────────────────────────
    #[error("WB-040: Output '{output}' was not produced: {}", path.display())]
    Postcondition { output: String, path: PathBuf },

    #[error("YAML parse error: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl WbError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            WbError::UnknownCommand { .. } | WbError::Definition { .. } => ErrorKind::Definition,
            WbError::UnknownField { .. }
            | WbError::TypeMismatch { .. }
            | WbError::InvalidChoice { .. }
            | WbError::TupleArity { .. }
            | WbError::MissingField { .. }
            | WbError::MissingCompanion { .. } => ErrorKind::Validation,
            WbError::NotFound { .. } => ErrorKind::NotFound,
            WbError::Execution { .. } | WbError::Spawn { .. } | WbError::Timeout { .. } => {
                ErrorKind::Execution
            }
            WbError::Postcondition { .. } => ErrorKind::Postcondition,
            WbError::YamlParse(_) | WbError::Io(_) => ErrorKind::Other,
        }
    }

    pub fn is_validation(&self) -> bool {
        self.kind() == ErrorKind::Validation
    }

    pub(crate) fn definition(command: &str, details: impl Into<String>) -> Self {
        WbError::Definition {
            command: command.to_string(),
            details: details.into(),
        }
    }
}

impl FixSuggestion for WbError {
    fn fix_suggestion(&self) -> Option<&str> {
        match self {
            WbError::UnknownCommand { .. } => Some("Run `wbwrap list` to see the available commands"),
            WbError::Definition { .. } => {
                Some("Fix the command table: positions must be unique and references must name declared fields")
            }
            WbError::UnknownField { .. } => Some("Run `wbwrap describe <command>` to see its fields"),
            WbError::TypeMismatch { .. } => Some("Check the value type in the job file (quote paths, no quotes on numbers)"),
            WbError::InvalidChoice { .. } => Some("Use one of the listed values, spelled in upper case"),
            WbError::TupleArity { .. } => {
                Some("Write each entry as [STRUCTURE, path] or, where allowed, [STRUCTURE, path, true]")
            }
            WbError::MissingField { .. } => Some("Add the field to the inputs: block"),
            WbError::MissingCompanion { .. } => Some("Set the required field as well, or drop this one"),
            WbError::NotFound { .. } => Some("Check the path; relative paths resolve against the working directory"),
            WbError::Execution { .. } => Some("Read the tool diagnostics above; the inputs were accepted by the wrapper"),
            WbError::Spawn { .. } => Some("Install the tool or point WB_COMMAND / MIRTK at the executable"),
            WbError::Timeout { .. } => Some("Raise --timeout or leave it unset to wait indefinitely"),
            WbError::Postcondition { .. } => Some("Check the tool's output directory and free disk space"),
            WbError::YamlParse(_) => Some("Check YAML syntax: indentation and quoting"),
            WbError::Io(_) => Some("Check file path and permissions"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_variants_classify_as_validation() {
        let err = WbError::MissingCompanion {
            field: "roi_left".into(),
            requires: "left_metric".into(),
        };
        assert!(err.is_validation());
        assert!(err.to_string().starts_with("WB-015"));
    }

    #[test]
    fn spawn_and_timeout_are_execution_failures() {
        let spawn = WbError::Spawn {
            program: "wb_command".into(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        };
        let timeout = WbError::Timeout {
            program: "wb_command".into(),
            limit: Duration::from_millis(300),
        };
        assert_eq!(spawn.kind(), ErrorKind::Execution);
        assert_eq!(timeout.kind(), ErrorKind::Execution);
        assert!(timeout.to_string().ends_with("timed out after 300ms"));
    }

    #[test]
    fn every_variant_has_a_suggestion() {
        let err = WbError::Postcondition {
            output: "out_file".into(),
            path: PathBuf::from("/tmp/missing.nii"),
        };
        assert!(err.fix_suggestion().is_some());
        assert!(err.to_string().contains("/tmp/missing.nii"));
    }
}
