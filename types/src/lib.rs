//! Diagnostic value types for Clarion.
//!
//! This crate contains pure domain types with no IO, no async, and minimal dependencies.
//! Everything here can be used from any layer of the application.

mod ids;
mod message;
mod range;

pub use ids::DocumentId;
pub use message::{
    FileDiagnosticMessage, MessageInvalidation, MessageScope, MessageType, MessageUpdate,
};
pub use range::{Point, Range};
