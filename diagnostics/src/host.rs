//! Editor collaborators the provider depends on.
//!
//! The host (an editor, a test harness, the replay CLI) implements these.
//! Everything runs on one thread, so nothing here is `Send`.

use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::rc::Rc;

use clarion_types::DocumentId;

use crate::subscription::Subscription;

/// Busy-indicator future type alias.
pub type BusyFut = Pin<Box<dyn Future<Output = ()>>>;

/// Line geometry of a document's current contents.
pub trait LineLengths {
    /// Index of the last row. An empty document still has row 0.
    fn last_row(&self) -> u32;

    /// Length in columns of `row`. Only called with `row <= last_row()`.
    fn line_length(&self, row: u32) -> u32;
}

/// An open source buffer.
pub trait TextDocument: LineLengths {
    fn id(&self) -> DocumentId;

    /// On-disk path. `None` for buffers that have never been saved.
    fn path(&self) -> Option<PathBuf>;

    /// Short name shown in the busy indicator.
    fn title(&self) -> String;

    /// Grammar scope name, e.g. `source.objc`.
    fn grammar_scope(&self) -> String;

    /// Register `callback` to run once when the buffer is destroyed.
    ///
    /// If the buffer is already destroyed, `callback` must run before this
    /// returns; the returned subscription is then inert.
    fn on_did_destroy(&self, callback: Box<dyn FnOnce()>) -> Subscription;
}

/// Progress reporting. The host owns the future and drives it to completion.
pub trait BusySignal {
    fn report_busy(&self, label: String, op: BusyFut);
}

/// The host's notion of which document currently has focus.
pub trait FocusProvider {
    fn active_document(&self) -> Option<Rc<dyn TextDocument>>;
}

/// Document lifecycle events the host forwards to the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentEvent {
    Opened,
    GrammarChanged,
    Activated,
    Saved,
}
