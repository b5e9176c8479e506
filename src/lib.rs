#![deny(
    missing_docs,
    clippy::undocumented_unsafe_blocks,
    rustdoc::invalid_rust_codeblocks,
    rustdoc::broken_intra_doc_links,
    missing_copy_implementations,
    unused_doc_comments
)]
#![forbid(unsafe_code)]
// Make docs.rs generate better docs
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Capture, transfer, and restore of the diagnostic state attached to
//! raised errors.
//!
//! ## Overview
//!
//! When an error is raised, deferred, and re-raised later — from another
//! thread, another call site, or the far side of a serialization boundary —
//! the diagnostic metadata riding on it has to make the trip too: the
//! captured call frames, the trace text accumulated over earlier
//! propagation legs, and the crash-report correlation payload. This crate
//! implements that protocol and nothing else. It does not dispatch or catch
//! anything, and it does not walk the stack; it consumes trace snapshots it
//! is handed and makes sure they survive deferral intact.
//!
//! ## Quick Example
//!
//! ```
//! use redispatch::{DispatchSnapshot, FrameRecord, LocalTrace, RaisedError};
//!
//! // An unwind engine attaches frame data when it first observes the error.
//! let error = RaisedError::new("index out of range");
//! error.attach_local_trace(LocalTrace::new(vec![FrameRecord::new("get_row")]));
//!
//! // Freeze the dispatch state, possibly at several frames concurrently...
//! let snapshot = DispatchSnapshot::capture(&error)?;
//!
//! // ...and rewind the error to it at the deferred re-raise site.
//! snapshot.restore_onto(&error)?;
//! assert_eq!(error.trace_text(), "   at get_row");
//! # Ok::<(), redispatch::CopyError>(())
//! ```
//!
//! ## Core Concepts
//!
//! - A [`RaisedError`] owns a context-local [`LocalTrace`] handle, an
//!   append-only imported-trace accumulator, and an optional
//!   [`DiagnosticPayload`]. Rendering to text is lazy and only memoized by
//!   explicit render-and-cache operations, never by ordinary reads.
//! - [`RaisedError::preserve_trace`] folds the current rendering into the
//!   accumulator before the same instance is re-raised, so consecutive
//!   propagation legs concatenate oldest-first with single line breaks
//!   between them.
//! - A [`DispatchSnapshot`] is an immutable deep copy of those fields.
//!   Capture is lock-free with respect to the restore path; restore
//!   serializes its four field assignments behind one process-wide lock so
//!   concurrent restores can never interleave.
//! - The [`transfer`] codec converts between a live error and a portable
//!   [`TransferEnvelope`], discarding context-local handles on decode and
//!   folding their string projection into the accumulator when a context
//!   boundary was crossed.
//!
//! ## Collaborators
//!
//! The stack-walking engine, the frame symbolizer, and the serialization
//! channel are all external. They meet this crate at narrow seams:
//! [`RaisedError::attach_local_trace`] going in, the [`TraceRenderer`]
//! trait and the [`hooks`] registry going out.

mod dispatch;
mod frames;
mod hook_lock;
mod raised;

pub mod hooks;
pub mod payload;
pub mod render;
pub mod transfer;

pub use self::{
    dispatch::DispatchSnapshot,
    frames::{FrameRecord, LocalTrace},
    payload::{DiagnosticPayload, PayloadProjection},
    raised::RaisedError,
    render::{LineRenderer, TraceRenderer, install_renderer},
    transfer::{ContextBoundary, TransferEnvelope},
};

/// Resource-exhaustion failure while deep-copying captured dispatch state.
///
/// Surfaced by [`DispatchSnapshot::capture`] and
/// [`DispatchSnapshot::restore_onto`] before any shared state is touched:
/// a failed copy never commits partial fields and never leaves the restore
/// lock held.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum CopyError {
    /// The allocation backing the copy could not be reserved.
    #[error("failed to reserve memory for a dispatch-state copy")]
    Exhausted(#[from] std::collections::TryReserveError),
}
