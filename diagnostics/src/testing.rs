//! In-memory host for unit tests.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use anyhow::anyhow;
use clarion_types::{DocumentId, MessageUpdate};
use tokio::sync::oneshot;

use crate::compile::{ClangCompileResult, CompileFut, Compiler};
use crate::config::DiagnosticsConfig;
use crate::host::{BusyFut, BusySignal, FocusProvider, LineLengths, TextDocument};
use crate::provider::{ClangDiagnosticsProvider, ProviderHost};
use crate::subscription::Subscription;

type DestroyListeners = Rc<RefCell<Vec<(u64, Box<dyn FnOnce()>)>>>;

pub(crate) struct FakeDocument {
    id: DocumentId,
    path: Option<PathBuf>,
    grammar: RefCell<String>,
    lines: Vec<u32>,
    destroy_listeners: DestroyListeners,
    next_listener: Cell<u64>,
    destroyed: Cell<bool>,
}

impl FakeDocument {
    pub fn new(id: u64, path: &str, lines: Vec<u32>) -> Rc<Self> {
        Self::with_grammar(id, path, "source.objc", lines)
    }

    pub fn with_grammar(id: u64, path: &str, grammar: &str, lines: Vec<u32>) -> Rc<Self> {
        Rc::new(Self::build(id, Some(PathBuf::from(path)), grammar, lines))
    }

    pub fn untitled(id: u64, lines: Vec<u32>) -> Rc<Self> {
        Rc::new(Self::build(id, None, "source.objc", lines))
    }

    fn build(id: u64, path: Option<PathBuf>, grammar: &str, lines: Vec<u32>) -> Self {
        Self {
            id: DocumentId::new(id),
            path,
            grammar: RefCell::new(grammar.to_string()),
            lines,
            destroy_listeners: Rc::new(RefCell::new(Vec::new())),
            next_listener: Cell::new(0),
            destroyed: Cell::new(false),
        }
    }

    pub fn set_grammar(&self, grammar: &str) {
        *self.grammar.borrow_mut() = grammar.to_string();
    }

    pub fn destroy(&self) {
        if self.destroyed.replace(true) {
            return;
        }
        let listeners = std::mem::take(&mut *self.destroy_listeners.borrow_mut());
        for (_, callback) in listeners {
            callback();
        }
    }

    pub fn destroy_listener_count(&self) -> usize {
        self.destroy_listeners.borrow().len()
    }
}

impl LineLengths for FakeDocument {
    fn last_row(&self) -> u32 {
        self.lines.len().saturating_sub(1) as u32
    }

    fn line_length(&self, row: u32) -> u32 {
        self.lines.get(row as usize).copied().unwrap_or(0)
    }
}

impl TextDocument for FakeDocument {
    fn id(&self) -> DocumentId {
        self.id
    }

    fn path(&self) -> Option<PathBuf> {
        self.path.clone()
    }

    fn title(&self) -> String {
        self.path
            .as_deref()
            .and_then(Path::file_name)
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "untitled".to_string())
    }

    fn grammar_scope(&self) -> String {
        self.grammar.borrow().clone()
    }

    fn on_did_destroy(&self, callback: Box<dyn FnOnce()>) -> Subscription {
        if self.destroyed.get() {
            callback();
            return Subscription::inert();
        }
        let id = self.next_listener.get() + 1;
        self.next_listener.set(id);
        self.destroy_listeners.borrow_mut().push((id, callback));
        let weak = Rc::downgrade(&self.destroy_listeners);
        Subscription::new(move || {
            if let Some(listeners) = weak.upgrade() {
                listeners.borrow_mut().retain(|(other, _)| *other != id);
            }
        })
    }
}

enum Reply {
    Ready(anyhow::Result<Option<ClangCompileResult>>),
    Deferred(oneshot::Receiver<Option<ClangCompileResult>>),
}

/// Compiler that answers from a queue of scripted replies, one per call.
#[derive(Default)]
pub(crate) struct ScriptedCompiler {
    replies: RefCell<VecDeque<Reply>>,
    calls: RefCell<Vec<DocumentId>>,
}

impl ScriptedCompiler {
    pub fn push_result(&self, result: ClangCompileResult) {
        self.replies
            .borrow_mut()
            .push_back(Reply::Ready(Ok(Some(result))));
    }

    pub fn push_none(&self) {
        self.replies.borrow_mut().push_back(Reply::Ready(Ok(None)));
    }

    pub fn push_error(&self, message: &str) {
        self.replies
            .borrow_mut()
            .push_back(Reply::Ready(Err(anyhow!(message.to_string()))));
    }

    /// Queue a reply that stays pending until the returned sender fires.
    pub fn push_deferred(&self) -> oneshot::Sender<Option<ClangCompileResult>> {
        let (tx, rx) = oneshot::channel();
        self.replies.borrow_mut().push_back(Reply::Deferred(rx));
        tx
    }

    pub fn calls(&self) -> Vec<DocumentId> {
        self.calls.borrow().clone()
    }
}

impl Compiler for ScriptedCompiler {
    fn compile<'a>(&'a self, document: &'a dyn TextDocument) -> CompileFut<'a> {
        self.calls.borrow_mut().push(document.id());
        let reply = self.replies.borrow_mut().pop_front();
        Box::pin(async move {
            match reply {
                Some(Reply::Ready(result)) => result,
                Some(Reply::Deferred(rx)) => rx.await.map_err(|_| anyhow!("compile abandoned")),
                None => Err(anyhow!("no scripted compile reply")),
            }
        })
    }
}

/// Busy signal that queues operations for the test to drive.
#[derive(Default)]
pub(crate) struct QueuedBusySignal {
    queue: RefCell<VecDeque<BusyFut>>,
    labels: RefCell<Vec<String>>,
}

impl QueuedBusySignal {
    pub fn take_next(&self) -> Option<BusyFut> {
        self.queue.borrow_mut().pop_front()
    }

    pub fn pending(&self) -> usize {
        self.queue.borrow().len()
    }

    pub fn labels(&self) -> Vec<String> {
        self.labels.borrow().clone()
    }

    /// Drive queued operations to completion, in order.
    pub async fn run_all(&self) {
        while let Some(op) = self.take_next() {
            op.await;
        }
    }
}

impl BusySignal for QueuedBusySignal {
    fn report_busy(&self, label: String, op: BusyFut) {
        self.labels.borrow_mut().push(label);
        self.queue.borrow_mut().push_back(op);
    }
}

#[derive(Default)]
pub(crate) struct FixedFocus {
    active: RefCell<Option<Rc<dyn TextDocument>>>,
}

impl FixedFocus {
    pub fn set_active(&self, document: Option<Rc<FakeDocument>>) {
        *self.active.borrow_mut() = document.map(|d| d as Rc<dyn TextDocument>);
    }
}

impl FocusProvider for FixedFocus {
    fn active_document(&self) -> Option<Rc<dyn TextDocument>> {
        self.active.borrow().clone()
    }
}

#[derive(Debug, Clone)]
pub(crate) enum Event {
    Update(MessageUpdate),
    Invalidation(Vec<PathBuf>),
}

/// A provider wired to fakes, with every published event recorded in order.
pub(crate) struct Harness {
    pub provider: ClangDiagnosticsProvider,
    pub compiler: Rc<ScriptedCompiler>,
    pub busy: Rc<QueuedBusySignal>,
    pub focus: Rc<FixedFocus>,
    events: Rc<RefCell<Vec<Event>>>,
    _subscriptions: Vec<Subscription>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(DiagnosticsConfig::default())
    }

    pub fn with_config(config: DiagnosticsConfig) -> Self {
        let compiler = Rc::new(ScriptedCompiler::default());
        let busy = Rc::new(QueuedBusySignal::default());
        let focus = Rc::new(FixedFocus::default());
        let provider = ClangDiagnosticsProvider::new(
            config,
            ProviderHost {
                compiler: compiler.clone(),
                busy_signal: busy.clone(),
                focus: focus.clone(),
            },
        );

        let events = Rc::new(RefCell::new(Vec::new()));
        let invalidation_sink = events.clone();
        let update_sink = events.clone();
        let subscriptions = vec![
            provider.on_message_invalidation(move |invalidation| {
                invalidation_sink
                    .borrow_mut()
                    .push(Event::Invalidation(invalidation.file_paths().to_vec()));
            }),
            provider.on_message_update(move |update| {
                update_sink.borrow_mut().push(Event::Update(update.clone()));
            }),
        ];

        Self {
            provider,
            compiler,
            busy,
            focus,
            events,
            _subscriptions: subscriptions,
        }
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.borrow().clone()
    }

    pub fn updates(&self) -> Vec<MessageUpdate> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                Event::Update(update) => Some(update),
                Event::Invalidation(_) => None,
            })
            .collect()
    }

    pub fn invalidations(&self) -> Vec<Vec<PathBuf>> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                Event::Invalidation(paths) => Some(paths),
                Event::Update(_) => None,
            })
            .collect()
    }
}
