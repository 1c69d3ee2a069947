//! Replay recorded clang results through the diagnostics provider.
//!
//! The source file is loaded from disk once. Each recorded result answers one
//! compile: the first on open, the rest on successive saves.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use anyhow::{Context, Result, anyhow};
use clarion_diagnostics::{
    BusyFut, BusySignal, ClangCompileResult, ClangDiagnosticsProvider, CompileFut, Compiler,
    DiagnosticsConfig, DocumentEvent, FocusProvider, LineLengths, ProviderHost, Subscription,
    TextDocument,
};
use clarion_types::{DocumentId, MessageInvalidation, MessageUpdate};
use serde::Serialize;

/// One published event, as written to stdout.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum ReplayEvent {
    Invalidation(MessageInvalidation),
    Update { files: MessageUpdate },
}

/// A source file read from disk, never edited or destroyed.
pub struct DiskDocument {
    id: DocumentId,
    path: PathBuf,
    grammar: String,
    line_lengths: Vec<u32>,
}

impl DiskDocument {
    pub fn load(id: DocumentId, path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read source file {}", path.display()))?;
        let path = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        Ok(Self::from_contents(id, path, &content))
    }

    pub fn from_contents(id: DocumentId, path: PathBuf, content: &str) -> Self {
        let line_lengths = content
            .split('\n')
            .map(|line| {
                let line = line.strip_suffix('\r').unwrap_or(line);
                u32::try_from(line.chars().count()).unwrap_or(u32::MAX)
            })
            .collect();
        let grammar = grammar_for_path(&path).to_string();
        Self {
            id,
            path,
            grammar,
            line_lengths,
        }
    }
}

/// Grammar scope an editor would assign from the file extension.
#[must_use]
pub fn grammar_for_path(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("c" | "h") => "source.c",
        Some("cc" | "cpp" | "cxx" | "hh" | "hpp" | "hxx") => "source.cpp",
        Some("m") => "source.objc",
        Some("mm") => "source.objcpp",
        _ => "text.plain",
    }
}

impl LineLengths for DiskDocument {
    fn last_row(&self) -> u32 {
        u32::try_from(self.line_lengths.len().saturating_sub(1)).unwrap_or(u32::MAX)
    }

    fn line_length(&self, row: u32) -> u32 {
        usize::try_from(row)
            .ok()
            .and_then(|row| self.line_lengths.get(row))
            .copied()
            .unwrap_or(0)
    }
}

impl TextDocument for DiskDocument {
    fn id(&self) -> DocumentId {
        self.id
    }

    fn path(&self) -> Option<PathBuf> {
        Some(self.path.clone())
    }

    fn title(&self) -> String {
        self.path
            .file_name()
            .map_or_else(|| self.path.display().to_string(), |name| {
                name.to_string_lossy().into_owned()
            })
    }

    fn grammar_scope(&self) -> String {
        self.grammar.clone()
    }

    fn on_did_destroy(&self, _callback: Box<dyn FnOnce()>) -> Subscription {
        Subscription::inert()
    }
}

/// Answers each compile with the next recorded result.
struct RecordedCompiler {
    results: RefCell<VecDeque<ClangCompileResult>>,
}

impl Compiler for RecordedCompiler {
    fn compile<'a>(&'a self, document: &'a dyn TextDocument) -> CompileFut<'a> {
        let next = self.results.borrow_mut().pop_front();
        let title = document.title();
        Box::pin(async move {
            next.map(Some)
                .ok_or_else(|| anyhow!("no recorded compile result left for {title}"))
        })
    }
}

/// Queues operations so the replay loop can drive them in order.
#[derive(Default)]
struct QueuedBusySignal {
    queue: RefCell<VecDeque<BusyFut>>,
}

impl QueuedBusySignal {
    async fn drain(&self) {
        loop {
            let next = self.queue.borrow_mut().pop_front();
            let Some(op) = next else { break };
            op.await;
        }
    }
}

impl BusySignal for QueuedBusySignal {
    fn report_busy(&self, label: String, op: BusyFut) {
        tracing::info!("{label}");
        self.queue.borrow_mut().push_back(op);
    }
}

/// Replay never has a focused editor.
struct NoFocus;

impl FocusProvider for NoFocus {
    fn active_document(&self) -> Option<Rc<dyn TextDocument>> {
        None
    }
}

/// Run one compile cycle per result against `document`, collecting every
/// event the provider publishes.
pub async fn replay(
    config: DiagnosticsConfig,
    document: DiskDocument,
    results: Vec<ClangCompileResult>,
) -> Vec<ReplayEvent> {
    let cycles = results.len();
    if !config.handles_grammar(document.grammar_scope().as_str()) {
        tracing::warn!(
            grammar = %document.grammar_scope(),
            "Source grammar is not configured for diagnostics"
        );
    }
    let busy = Rc::new(QueuedBusySignal::default());
    let provider = ClangDiagnosticsProvider::new(
        config,
        ProviderHost {
            compiler: Rc::new(RecordedCompiler {
                results: RefCell::new(results.into()),
            }),
            busy_signal: busy.clone(),
            focus: Rc::new(NoFocus),
        },
    );

    let events = Rc::new(RefCell::new(Vec::new()));
    let invalidation_sink = Rc::clone(&events);
    let update_sink = Rc::clone(&events);
    let _invalidations = provider.on_message_invalidation(move |invalidation| {
        invalidation_sink
            .borrow_mut()
            .push(ReplayEvent::Invalidation(invalidation.clone()));
    });
    let _updates = provider.on_message_update(move |update| {
        update_sink.borrow_mut().push(ReplayEvent::Update {
            files: update.clone(),
        });
    });

    let document: Rc<dyn TextDocument> = Rc::new(document);
    for cycle in 0..cycles {
        let event = if cycle == 0 {
            DocumentEvent::Opened
        } else {
            DocumentEvent::Saved
        };
        provider.on_document_event(Rc::clone(&document), event);
        busy.drain().await;
    }
    provider.dispose();

    events.take()
}

/// Parse each recorded result file.
pub fn load_results(paths: &[PathBuf]) -> Result<Vec<ClangCompileResult>> {
    paths
        .iter()
        .map(|path| {
            let json = fs::read_to_string(path)
                .with_context(|| format!("failed to read compile result {}", path.display()))?;
            ClangCompileResult::from_json(&json)
                .with_context(|| format!("failed to parse compile result {}", path.display()))
        })
        .collect()
}
