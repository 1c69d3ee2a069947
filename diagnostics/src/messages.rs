//! Clang compile results to publishable messages.

use clarion_types::{FileDiagnosticMessage, MessageType, MessageUpdate, Range};

use crate::compile::ClangCompileResult;
use crate::host::TextDocument;
use crate::range::resolve_range;

/// Provider name stamped on every message.
pub const PROVIDER_NAME: &str = "Clang";

/// Text of the single warning published when clang had no real build flags.
pub const MISSING_FLAGS_WARNING: &str = "Diagnostics are disabled due to lack of compilation flags. \
     Build this file with Buck, or create a compile_commands.json file manually.";

/// Range of the missing-flags warning: the first line of the file.
const MISSING_FLAGS_RANGE: Range = Range::from_coords(0, 0, 1, 0);

/// Compiler output that breaks the result contract.
#[derive(Debug, thiserror::Error)]
pub enum MessageBuildError {
    #[error("diagnostic has no file path: {spelling}")]
    MissingLocationFile { spelling: String },
    #[error("cannot attach diagnostics to a document without a path")]
    MissingDocumentPath,
}

/// Group a compile result's diagnostics into per-file messages.
///
/// Without accurate flags the reported diagnostics are noise, so they are
/// replaced by one warning on the document itself. Notes are dropped.
/// Order within a file follows the compiler; files appear in the order they
/// were first reported.
pub fn build_messages(
    result: &ClangCompileResult,
    document: &dyn TextDocument,
) -> Result<MessageUpdate, MessageBuildError> {
    let mut update = MessageUpdate::new();

    if !result.accurate_flags {
        let path = document.path().ok_or(MessageBuildError::MissingDocumentPath)?;
        update.push(FileDiagnosticMessage::new(
            PROVIDER_NAME,
            MessageType::Warning,
            path,
            MISSING_FLAGS_WARNING,
            MISSING_FLAGS_RANGE,
        ));
        return Ok(update);
    }

    for diagnostic in &result.diagnostics {
        let Some(message_type) = MessageType::from_clang_severity(diagnostic.severity) else {
            continue;
        };
        if diagnostic.location.file.as_os_str().is_empty() {
            return Err(MessageBuildError::MissingLocationFile {
                spelling: diagnostic.spelling.clone(),
            });
        }

        let range = resolve_range(
            &diagnostic.location,
            diagnostic.ranges.as_deref(),
            document,
        );
        update.push(FileDiagnosticMessage::new(
            PROVIDER_NAME,
            message_type,
            diagnostic.location.file.clone(),
            diagnostic.spelling.clone(),
            range,
        ));
    }

    Ok(update)
}
