//! Error and diagnostic types
//!
//! Run-level problems reject the whole request ([`AnalysisError`]). Per-file
//! problems ([`ExtractionError`]) only skip that file and are reported as
//! [`Diagnostic`] warnings on the result.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Errors that reject an analysis request before any file is processed.
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("ts_only and js_only cannot both be set")]
    ConflictingDialectFilters,
}

/// Errors that skip a single file.
#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    #[error("Cannot read {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot parse {path}: {reason}")]
    Unparsable { path: String, reason: String },

    #[error("Unsupported file extension: {path}")]
    UnsupportedExtension { path: String },
}

impl ExtractionError {
    pub fn kind(&self) -> DiagnosticKind {
        match self {
            ExtractionError::Unreadable { .. } => DiagnosticKind::UnreadableFile,
            ExtractionError::Unparsable { .. } => DiagnosticKind::UnparsableSource,
            ExtractionError::UnsupportedExtension { .. } => DiagnosticKind::UnsupportedFile,
        }
    }

    /// Convert into the warning recorded on the analysis result
    pub fn to_diagnostic(&self, file_path: &str) -> Diagnostic {
        Diagnostic {
            kind: self.kind(),
            file_path: Some(file_path.to_string()),
            message: self.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DiagnosticKind {
    UnreadableFile,
    UnparsableSource,
    UnsupportedFile,
    ConfigReadFailure,
    DuplicateSymbol,
    DuplicateFile,
    Timeout,
}

/// A non-fatal problem found during analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    pub message: String,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, file_path: Option<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            file_path,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extraction_error_diagnostics() {
        let error = ExtractionError::Unparsable {
            path: "src/bad.ts".to_string(),
            reason: "syntax errors".to_string(),
        };
        let diagnostic = error.to_diagnostic("src/bad.ts");

        assert_eq!(diagnostic.kind, DiagnosticKind::UnparsableSource);
        assert_eq!(diagnostic.file_path.as_deref(), Some("src/bad.ts"));
        assert!(diagnostic.message.contains("syntax errors"));
    }

    #[test]
    fn test_diagnostic_serializes_camel_case() {
        let diagnostic = Diagnostic::new(DiagnosticKind::DuplicateSymbol, None, "dup");
        let json = serde_json::to_string(&diagnostic).unwrap();
        assert_eq!(json, r#"{"kind":"duplicateSymbol","message":"dup"}"#);
    }
}
