//! Clang diagnostics for an editor: compile a document, normalize clang's
//! output into file-scoped messages, and keep published messages in step
//! with document lifecycles.

pub mod compile;
pub mod config;
pub mod host;
pub mod messages;
pub mod publisher;
pub mod range;
pub mod subscription;
pub mod timing;

pub(crate) mod tracker;

mod provider;

#[cfg(test)]
pub(crate) mod testing;

pub use compile::{ClangCompileResult, ClangDiagnostic, CompileFut, Compiler};
pub use config::DiagnosticsConfig;
pub use host::{BusyFut, BusySignal, DocumentEvent, FocusProvider, LineLengths, TextDocument};
pub use messages::{MISSING_FLAGS_WARNING, MessageBuildError, PROVIDER_NAME, build_messages};
pub use provider::{ClangDiagnosticsProvider, DiagnosticsError, FETCH_DIAGNOSTICS_EVENT, ProviderHost};
pub use range::{UNBOUNDED_LINE_WIDTH, resolve_range};
pub use subscription::Subscription;
