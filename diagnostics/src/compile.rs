//! Clang compile results and the compiler collaborator.
//!
//! The clang bridge reports results as camelCase JSON; these serde types are
//! the boundary. Severities and ranges are interpreted in [`crate::messages`].

use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;

use serde::Deserialize;

use crate::host::TextDocument;

/// Compile future type alias. Single-threaded, so no `Send` bound.
pub type CompileFut<'a> = Pin<Box<dyn Future<Output = anyhow::Result<Option<ClangCompileResult>>> + 'a>>;

/// Runs clang's diagnostic pass for a document.
///
/// `Ok(None)` means the compiler produced no result (aborted, superseded,
/// unsupported file); the provider discards it without touching published
/// state. `Err` is a compile failure and is logged.
pub trait Compiler {
    fn compile<'a>(&'a self, document: &'a dyn TextDocument) -> CompileFut<'a>;
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClangCompileResult {
    /// False when clang ran with guessed default flags instead of the
    /// project's real build configuration.
    pub accurate_flags: bool,
    #[serde(default)]
    pub diagnostics: Vec<ClangDiagnostic>,
}

impl ClangCompileResult {
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClangDiagnostic {
    /// 0=ignored, 1=note, 2=warning, 3=error, 4=fatal.
    pub severity: u8,
    pub location: ClangLocation,
    #[serde(default)]
    pub ranges: Option<Vec<ClangSourceRange>>,
    pub spelling: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClangLocation {
    pub file: PathBuf,
    /// Zero-based. Clang reports file-wide diagnostics on line -1.
    pub line: i64,
    #[serde(default)]
    pub column: i64,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ClangSourceRange {
    pub start: ClangPosition,
    pub end: ClangPosition,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ClangPosition {
    pub line: u32,
    pub column: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compile_result_deserialization() {
        let json = serde_json::json!({
            "accurateFlags": true,
            "diagnostics": [{
                "severity": 3,
                "spelling": "use of undeclared identifier 'foo'",
                "location": { "file": "/src/a.m", "line": 5, "column": 2 },
                "ranges": [
                    { "start": { "line": 5, "column": 2 }, "end": { "line": 5, "column": 5 } }
                ]
            }]
        });

        let result: ClangCompileResult = serde_json::from_value(json).unwrap();
        assert!(result.accurate_flags);
        assert_eq!(result.diagnostics.len(), 1);
        let diagnostic = &result.diagnostics[0];
        assert_eq!(diagnostic.severity, 3);
        assert_eq!(diagnostic.location.file, PathBuf::from("/src/a.m"));
        assert_eq!(diagnostic.location.line, 5);
        let ranges = diagnostic.ranges.as_ref().unwrap();
        assert_eq!(ranges[0].end.column, 5);
    }

    #[test]
    fn test_file_wide_diagnostic_on_negative_line() {
        let json = serde_json::json!({
            "accurateFlags": true,
            "diagnostics": [{
                "severity": 4,
                "spelling": "too many errors emitted, stopping now",
                "location": { "file": "/src/a.m", "line": -1 }
            }]
        });

        let result: ClangCompileResult = serde_json::from_value(json).unwrap();
        let diagnostic = &result.diagnostics[0];
        assert_eq!(diagnostic.location.line, -1);
        assert_eq!(diagnostic.location.column, 0);
        assert!(diagnostic.ranges.is_none());
    }

    #[test]
    fn test_missing_diagnostics_defaults_to_empty() {
        let result = ClangCompileResult::from_json(r#"{ "accurateFlags": false }"#).unwrap();
        assert!(!result.accurate_flags);
        assert!(result.diagnostics.is_empty());
    }

    #[test]
    fn test_missing_location_file_is_rejected() {
        let err = ClangCompileResult::from_json(
            r#"{ "accurateFlags": true, "diagnostics": [
                { "severity": 2, "spelling": "x", "location": { "line": 1 } }
            ] }"#,
        );
        assert!(err.is_err());
    }
}
