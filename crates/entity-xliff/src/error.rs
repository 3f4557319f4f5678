//! Error types for extraction and merging.

use serde::Serialize;
use thiserror::Error;

/// Errors raised by the translation core.
#[derive(Debug, Error)]
pub enum XliffError {
    /// The translated tree names a field or item that the live entity no
    /// longer has (stale XLIFF against a changed schema).
    #[error("entity structure diverged at {path}")]
    StructureDiverged { path: String },

    /// An entity the operation depends on can no longer be loaded.
    #[error("entity data has gone away: {key}")]
    DataGoneAway { key: String },

    #[error("entity type {entity_type} is not translatable")]
    NotTranslatable { entity_type: String },

    #[error("invalid value at {path}: {reason}")]
    InvalidValue { path: String, reason: String },

    #[error("entity {key} references itself through {path}")]
    ReferenceCycle { key: String, path: String },

    #[error("reference nesting deeper than {max} at {path}")]
    DepthExceeded { path: String, max: usize },

    #[error("configuration error: {0}")]
    Config(String),

    /// Failure reported by a host collaborator (storage, translation
    /// handler, ...).
    #[error("host error: {0:#}")]
    Host(#[from] anyhow::Error),
}

impl XliffError {
    /// Whether the walker may skip the affected branch and continue.
    pub fn is_branch_local(&self) -> bool {
        matches!(
            self,
            XliffError::StructureDiverged { .. }
                | XliffError::InvalidValue { .. }
                | XliffError::ReferenceCycle { .. }
                | XliffError::DepthExceeded { .. }
        )
    }

    /// Tree path the error points at, for branch-local errors.
    pub fn path(&self) -> Option<&str> {
        match self {
            XliffError::StructureDiverged { path }
            | XliffError::InvalidValue { path, .. }
            | XliffError::ReferenceCycle { path, .. }
            | XliffError::DepthExceeded { path, .. } => Some(path),
            _ => None,
        }
    }
}

/// Result type alias using XliffError.
pub type XliffResult<T> = Result<T, XliffError>;

/// Why a branch of the translated tree was not applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SkipReason {
    StructureDiverged,
    InvalidValue { reason: String },
    ReferenceCycle,
    DepthExceeded,
    UnknownFieldType { field_type: String },
    UnknownEntityType { entity_type: String },
}

impl SkipReason {
    /// Reason for a branch-local error; `None` for errors that must abort.
    pub fn from_error(err: &XliffError) -> Option<Self> {
        match err {
            XliffError::StructureDiverged { .. } => Some(SkipReason::StructureDiverged),
            XliffError::InvalidValue { reason, .. } => Some(SkipReason::InvalidValue {
                reason: reason.clone(),
            }),
            XliffError::ReferenceCycle { .. } => Some(SkipReason::ReferenceCycle),
            XliffError::DepthExceeded { .. } => Some(SkipReason::DepthExceeded),
            _ => None,
        }
    }
}

/// One skipped branch of a merge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedBranch {
    pub path: String,
    pub reason: SkipReason,
}

/// Outcome of a merge that did not fail outright.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MergeReport {
    /// Branches that were logged and skipped.
    pub skipped: Vec<SkippedBranch>,
    /// Number of entities persisted by the drain (0 when not committed).
    pub saved: usize,
}

impl MergeReport {
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty()
    }

    pub fn diverged_paths(&self) -> Vec<&str> {
        self.skipped
            .iter()
            .filter(|s| s.reason == SkipReason::StructureDiverged)
            .map(|s| s.path.as_str())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn branch_local_classification() {
        assert!(XliffError::StructureDiverged { path: "a".into() }.is_branch_local());
        assert!(
            XliffError::DepthExceeded {
                path: "a".into(),
                max: 3
            }
            .is_branch_local()
        );
        assert!(!XliffError::DataGoneAway { key: "node:1".into() }.is_branch_local());
        assert!(!XliffError::Host(anyhow::anyhow!("db down")).is_branch_local());
    }

    #[test]
    fn skip_reason_only_for_branch_local_errors() {
        let diverged = XliffError::StructureDiverged {
            path: "field_gone".into(),
        };
        assert_eq!(
            SkipReason::from_error(&diverged),
            Some(SkipReason::StructureDiverged)
        );
        let gone = XliffError::DataGoneAway {
            key: "node:1".into(),
        };
        assert_eq!(SkipReason::from_error(&gone), None);
    }

    #[test]
    fn host_errors_keep_their_context() {
        let err: XliffError = anyhow::anyhow!("connection refused")
            .context("failed to save entity")
            .into();
        assert_eq!(
            err.to_string(),
            "host error: failed to save entity: connection refused"
        );
    }
}
