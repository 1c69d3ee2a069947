//! ClangDiagnosticsProvider facade: the public API consumed by the editor.
//!
//! The host forwards document events and listener registrations here. Each
//! trigger runs one compile-and-publish cycle:
//!
//! ```text
//! trigger -> destroy listener (once) -> report_busy -> compile().await
//!         -> build messages -> invalidate previous paths -> publish update
//!         -> record new paths
//! ```
//!
//! Everything runs on a single thread. `compile()` is the only suspension
//! point, so a document can be destroyed, or the provider disposed, while its
//! compile is pending. Such results are dropped on resume. Overlapping
//! compiles of one document are not coalesced; whichever resolves last wins.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use clarion_types::{DocumentId, MessageInvalidation, MessageUpdate};

use crate::compile::Compiler;
use crate::config::DiagnosticsConfig;
use crate::host::{BusySignal, DocumentEvent, FocusProvider, TextDocument};
use crate::messages::{MessageBuildError, build_messages};
use crate::publisher::MessagePublisher;
use crate::subscription::Subscription;
use crate::timing::track_timing;
use crate::tracker::DocumentTracker;

/// Timing event recorded around every compile cycle.
pub const FETCH_DIAGNOSTICS_EVENT: &str = "clarion-diagnostics.fetch-diagnostics";

/// Why a compile cycle published nothing.
#[derive(Debug, thiserror::Error)]
pub enum DiagnosticsError {
    #[error("compile failed: {0:#}")]
    Compile(anyhow::Error),
    #[error(transparent)]
    Build(#[from] MessageBuildError),
}

/// Collaborators supplied by the host.
pub struct ProviderHost {
    pub compiler: Rc<dyn Compiler>,
    pub busy_signal: Rc<dyn BusySignal>,
    pub focus: Rc<dyn FocusProvider>,
}

#[derive(Debug)]
enum CycleOutcome {
    Published { paths: Vec<PathBuf> },
    Discarded,
}

struct Shared {
    config: DiagnosticsConfig,
    host: ProviderHost,
    publisher: MessagePublisher,
    tracker: RefCell<DocumentTracker>,
    /// Destroy listeners, one per subscribed document.
    destroy_subscriptions: RefCell<HashMap<DocumentId, Subscription>>,
    disposed: Cell<bool>,
}

/// Public facade for clang diagnostics.
///
/// Clones share state; all clones observe `dispose()`.
#[derive(Clone)]
pub struct ClangDiagnosticsProvider {
    shared: Rc<Shared>,
}

impl ClangDiagnosticsProvider {
    pub fn new(config: DiagnosticsConfig, host: ProviderHost) -> Self {
        Self {
            shared: Rc::new(Shared {
                config,
                host,
                publisher: MessagePublisher::new(),
                tracker: RefCell::new(DocumentTracker::new()),
                destroy_subscriptions: RefCell::new(HashMap::new()),
                disposed: Cell::new(false),
            }),
        }
    }

    /// Handle a document lifecycle event from the host.
    ///
    /// Only documents in a configured grammar are compiled. Saves are
    /// ignored when `run_on_save` is off.
    pub fn on_document_event(&self, document: Rc<dyn TextDocument>, event: DocumentEvent) {
        if event == DocumentEvent::Saved && !self.shared.config.run_on_save {
            return;
        }
        if !self.shared.config.handles_grammar(&document.grammar_scope()) {
            return;
        }
        self.run_diagnostics(document);
    }

    /// Compile `document` and publish its diagnostics.
    ///
    /// Returns once the cycle has been handed to the busy signal; the host
    /// drives it to completion.
    pub fn run_diagnostics(&self, document: Rc<dyn TextDocument>) {
        Shared::run_diagnostics(&self.shared, document);
    }

    /// Register for message updates.
    ///
    /// A new subscriber immediately gets a fresh compile of the active
    /// document, so it does not wait for the next edit to see diagnostics.
    pub fn on_message_update(
        &self,
        listener: impl Fn(&MessageUpdate) + 'static,
    ) -> Subscription {
        let subscription = self.shared.publisher.on_message_update(listener);
        self.received_new_update_subscriber();
        subscription
    }

    pub fn on_message_invalidation(
        &self,
        listener: impl Fn(&MessageInvalidation) + 'static,
    ) -> Subscription {
        self.shared.publisher.on_message_invalidation(listener)
    }

    /// Paths currently carrying messages from `document`'s last compile.
    #[must_use]
    pub fn tracked_paths(&self, document: DocumentId) -> Vec<PathBuf> {
        self.shared
            .tracker
            .borrow()
            .recorded_paths(document)
            .map(<[PathBuf]>::to_vec)
            .unwrap_or_default()
    }

    /// Release every listener and forget all tracked documents.
    ///
    /// Compiles still pending are discarded when they resolve.
    pub fn dispose(&self) {
        if self.shared.disposed.replace(true) {
            return;
        }
        self.shared.publisher.close();
        let subscriptions = std::mem::take(&mut *self.shared.destroy_subscriptions.borrow_mut());
        drop(subscriptions);
        self.shared.tracker.borrow_mut().clear();
        tracing::debug!("Clang diagnostics provider disposed");
    }

    fn received_new_update_subscriber(&self) {
        let Some(document) = self.shared.host.focus.active_document() else {
            return;
        };
        if self.shared.config.handles_grammar(&document.grammar_scope()) {
            self.run_diagnostics(document);
        }
    }
}

impl Shared {
    fn run_diagnostics(this: &Rc<Self>, document: Rc<dyn TextDocument>) {
        if this.disposed.get() {
            return;
        }
        let id = document.id();
        if document.path().is_none() {
            tracing::debug!(document = %id, "Skipping diagnostics for unsaved document");
            return;
        }
        if !Self::ensure_destroy_subscription(this, &*document) {
            tracing::debug!(document = %id, "Skipping diagnostics for destroyed document");
            return;
        }

        let label = format!("Clang: compiling `{}`", document.title());
        let shared = Rc::clone(this);
        let op = async move {
            match track_timing(FETCH_DIAGNOSTICS_EVENT, shared.run_cycle(document)).await {
                Ok(CycleOutcome::Published { paths }) => {
                    tracing::debug!(document = %id, files = paths.len(), "Diagnostics published");
                }
                Ok(CycleOutcome::Discarded) => {
                    tracing::debug!(document = %id, "Diagnostics result discarded");
                }
                Err(e) => {
                    tracing::error!(document = %id, "Clang diagnostics failed: {e}");
                }
            }
        };
        this.host.busy_signal.report_busy(label, Box::pin(op));
    }

    /// Attach the destroy listener the first time a document is compiled.
    ///
    /// Returns `false` if the document turned out to be destroyed already.
    fn ensure_destroy_subscription(this: &Rc<Self>, document: &dyn TextDocument) -> bool {
        let id = document.id();
        if !this.tracker.borrow_mut().mark_subscribed(id) {
            return true;
        }
        let weak = Rc::downgrade(this);
        let subscription = document.on_did_destroy(Box::new(move || {
            if let Some(shared) = weak.upgrade() {
                shared.handle_document_destroyed(id);
            }
        }));
        // A destroyed buffer runs the callback during registration.
        if !this.tracker.borrow().is_subscribed(id) {
            return false;
        }
        this.destroy_subscriptions
            .borrow_mut()
            .insert(id, subscription);
        true
    }

    async fn run_cycle(
        self: Rc<Self>,
        document: Rc<dyn TextDocument>,
    ) -> Result<CycleOutcome, DiagnosticsError> {
        let id = document.id();
        let result = self
            .host
            .compiler
            .compile(&*document)
            .await
            .map_err(DiagnosticsError::Compile)?;

        // The document may have been destroyed while clang was running.
        let Some(result) = result else {
            return Ok(CycleOutcome::Discarded);
        };
        if self.disposed.get() || !self.tracker.borrow().is_subscribed(id) {
            return Ok(CycleOutcome::Discarded);
        }

        let update = build_messages(&result, &*document)?;
        let invalidation = self.tracker.borrow_mut().invalidate(id);
        if let Some(invalidation) = invalidation {
            self.publisher.publish_invalidation(&invalidation);
        }
        self.publisher.publish_update(&update);

        let paths: Vec<PathBuf> = update.paths().map(Path::to_path_buf).collect();
        let still_tracked = self.tracker.borrow().is_subscribed(id);
        if still_tracked {
            self.tracker.borrow_mut().record(id, paths.clone());
        } else if !paths.is_empty() {
            // A listener destroyed the document during delivery, after its
            // destroy handler found nothing recorded to clear.
            self.publisher
                .publish_invalidation(&MessageInvalidation::for_files(paths.clone()));
        }
        Ok(CycleOutcome::Published { paths })
    }

    fn handle_document_destroyed(&self, id: DocumentId) {
        let invalidation = self.tracker.borrow_mut().on_document_destroyed(id);
        if let Some(invalidation) = invalidation {
            self.publisher.publish_invalidation(&invalidation);
        }
        let subscription = self.destroy_subscriptions.borrow_mut().remove(&id);
        drop(subscription);
        tracing::debug!(document = %id, "Stopped tracking destroyed document");
    }
}
