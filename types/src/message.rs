//! Published diagnostic messages and the events that carry them.
//!
//! These types define the interface between `clarion-diagnostics` and
//! whatever renders diagnostics. Consumers receive [`MessageUpdate`]s and
//! [`MessageInvalidation`]s and never construct them outside tests.

use std::path::{Path, PathBuf};

use serde::{Serialize, Serializer};

use crate::range::Range;

/// Clang severity for warnings. Anything below is a note or ignored.
const CLANG_SEVERITY_WARNING: u8 = 2;

/// What a message or invalidation applies to.
///
/// Only file-scoped messages exist today; project-wide diagnostics would be
/// a second variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageScope {
    File,
}

/// Severity of a published message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum MessageType {
    Warning,
    Error,
}

impl MessageType {
    /// Convert from clang's numeric severity
    /// (0=ignored, 1=note, 2=warning, 3=error, 4=fatal).
    ///
    /// Returns `None` for notes and ignored diagnostics; those are never
    /// published.
    #[must_use]
    pub fn from_clang_severity(value: u8) -> Option<Self> {
        match value {
            v if v < CLANG_SEVERITY_WARNING => None,
            CLANG_SEVERITY_WARNING => Some(Self::Warning),
            _ => Some(Self::Error),
        }
    }

    #[must_use]
    pub fn is_error(self) -> bool {
        self == Self::Error
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

/// A single diagnostic message attached to a file.
///
/// Fields are private; the file scope is fixed at construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileDiagnosticMessage {
    scope: MessageScope,
    provider_name: String,
    #[serde(rename = "type")]
    message_type: MessageType,
    file_path: PathBuf,
    text: String,
    range: Range,
}

impl FileDiagnosticMessage {
    #[must_use]
    pub fn new(
        provider_name: impl Into<String>,
        message_type: MessageType,
        file_path: PathBuf,
        text: impl Into<String>,
        range: Range,
    ) -> Self {
        Self {
            scope: MessageScope::File,
            provider_name: provider_name.into(),
            message_type,
            file_path,
            text: text.into(),
            range,
        }
    }

    #[must_use]
    pub fn scope(&self) -> MessageScope {
        self.scope
    }

    #[must_use]
    pub fn provider_name(&self) -> &str {
        &self.provider_name
    }

    #[must_use]
    pub fn message_type(&self) -> MessageType {
        self.message_type
    }

    #[must_use]
    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn range(&self) -> Range {
        self.range
    }

    /// Format as `path:row:col: type: [provider] text` (1-indexed for display).
    #[must_use]
    pub fn display_line(&self) -> String {
        format!(
            "{}:{}:{}: {}: [{}] {}",
            self.file_path.display(),
            self.range.start.row + 1,
            self.range.start.column + 1,
            self.message_type.label(),
            self.provider_name,
            self.text,
        )
    }
}

/// Messages grouped by file, in the order each file was first reported.
///
/// An empty update is meaningful: it tells listeners that the compile found
/// nothing for the files it previously reported.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageUpdate {
    files: Vec<(PathBuf, Vec<FileDiagnosticMessage>)>,
}

impl MessageUpdate {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message to its file's list, creating the entry if needed.
    pub fn push(&mut self, message: FileDiagnosticMessage) {
        match self
            .files
            .iter_mut()
            .find(|(path, _)| path.as_path() == message.file_path())
        {
            Some((_, messages)) => messages.push(message),
            None => self
                .files
                .push((message.file_path.clone(), vec![message])),
        }
    }

    #[must_use]
    pub fn files(&self) -> &[(PathBuf, Vec<FileDiagnosticMessage>)] {
        &self.files
    }

    /// Paths carrying at least one message, in first-reported order.
    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.files.iter().map(|(path, _)| path.as_path())
    }

    #[must_use]
    pub fn messages_for(&self, path: &Path) -> Option<&[FileDiagnosticMessage]> {
        self.files
            .iter()
            .find(|(p, _)| p == path)
            .map(|(_, messages)| messages.as_slice())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    fn count_by_type(&self, message_type: MessageType) -> usize {
        self.files
            .iter()
            .flat_map(|(_, messages)| messages)
            .filter(|m| m.message_type() == message_type)
            .count()
    }

    #[must_use]
    pub fn error_count(&self) -> usize {
        self.count_by_type(MessageType::Error)
    }

    #[must_use]
    pub fn warning_count(&self) -> usize {
        self.count_by_type(MessageType::Warning)
    }

    #[must_use]
    pub fn total_count(&self) -> usize {
        self.files.iter().map(|(_, messages)| messages.len()).sum()
    }
}

impl Serialize for MessageUpdate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.files.iter().map(|(path, messages)| (path, messages)))
    }
}

/// Instruction to clear every message previously published for `file_paths`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageInvalidation {
    scope: MessageScope,
    file_paths: Vec<PathBuf>,
}

impl MessageInvalidation {
    #[must_use]
    pub fn for_files(file_paths: Vec<PathBuf>) -> Self {
        Self {
            scope: MessageScope::File,
            file_paths,
        }
    }

    #[must_use]
    pub fn scope(&self) -> MessageScope {
        self.scope
    }

    #[must_use]
    pub fn file_paths(&self) -> &[PathBuf] {
        &self.file_paths
    }
}
