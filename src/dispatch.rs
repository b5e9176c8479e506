//! Capture and restore of dispatch state for deferred re-raising.
//!
//! A [`DispatchSnapshot`] freezes the diagnostic fields of a
//! [`RaisedError`] at one point of its propagation so the error can be
//! re-raised later from another thread or call site with those fields
//! intact. The same live instance can be snapshotted at several frames as it
//! propagates through nested handlers, which is why restore goes through a
//! single process-wide lock: two snapshots of the same error restored
//! concurrently must each land as a complete field set, never interleaved.
//!
//! The lock is global rather than per-object. Restores only happen at
//! explicit deferred re-raise sites, so contention between unrelated errors
//! is acceptable; what the lock buys is a critical section of exactly four
//! field assignments, with every fallible deep copy done before it is taken.
//!
//! # Examples
//!
//! ```
//! use redispatch::{DispatchSnapshot, FrameRecord, LocalTrace, RaisedError};
//!
//! let error = RaisedError::new("lookup failed");
//! error.attach_local_trace(LocalTrace::new(vec![FrameRecord::new("resolve")]));
//!
//! let snapshot = DispatchSnapshot::capture(&error)?;
//! error.preserve_trace(); // the live object moves on...
//!
//! snapshot.restore_onto(&error)?; // ...and is later rewound to the snapshot
//! assert_eq!(error.trace_text(), "   at resolve");
//! # Ok::<(), redispatch::CopyError>(())
//! ```

use std::sync::Mutex;

use crate::{CopyError, DiagnosticPayload, LocalTrace, RaisedError, hooks};

/// Serializes the field-assignment step of every restore, across all error
/// objects. Never held while deep-copying or rendering.
static RESTORE_LOCK: Mutex<()> = Mutex::new(());

/// An immutable, independently owned copy of an error's dispatch state.
///
/// Every field is a deep copy: once a snapshot is taken, nothing the live
/// object does can alter it, and its lifetime is fully decoupled from the
/// object it came from.
pub struct DispatchSnapshot {
    local_trace: Option<LocalTrace>,
    payload: Option<DiagnosticPayload>,
    imported_trace_text: String,
    raise_ip: usize,
}

impl DispatchSnapshot {
    /// Captures the error's current dispatch state.
    ///
    /// Reads the live fields and deep-copies the trace handle and payload.
    /// Never touches the global restore lock, so captures can run
    /// concurrently with restores and with each other; two snapshots of the
    /// same object never alias.
    ///
    /// # Errors
    ///
    /// Returns [`CopyError`] when a deep copy fails under memory pressure.
    /// The error object is left untouched.
    pub fn capture(error: &RaisedError) -> Result<Self, CopyError> {
        let state = error.state().read();
        let local_trace = state
            .local_trace
            .as_ref()
            .map(LocalTrace::try_clone)
            .transpose()?;
        let payload = state
            .payload
            .as_ref()
            .map(DiagnosticPayload::try_clone)
            .transpose()?;
        Ok(Self {
            local_trace,
            payload,
            imported_trace_text: state.imported_trace_text.clone(),
            raise_ip: state.raise_ip,
        })
    }

    /// Re-applies this snapshot to `error` ahead of a re-raise.
    ///
    /// The snapshot's trace and payload are deep-copied once more before any
    /// lock is taken: another thread may be capturing from this very
    /// snapshot's object concurrently, and the restored fields must not
    /// alias the snapshot either. The four field assignments then happen
    /// under the process-wide restore lock, the memoized trace text is
    /// cleared so the next read re-renders, and the registered
    /// foreign-restore hooks run.
    ///
    /// Restoring onto a [`shareable`](RaisedError::is_shareable) instance is
    /// a silent no-op by design: such instances carry no per-raise-site
    /// state.
    ///
    /// # Errors
    ///
    /// Returns [`CopyError`] when a deep copy fails. The failure surfaces
    /// before the lock is acquired, so no partial state is ever committed
    /// and the lock is never left held.
    pub fn restore_onto(&self, error: &RaisedError) -> Result<(), CopyError> {
        if error.is_shareable() {
            return Ok(());
        }

        let trace_copy = self
            .local_trace
            .as_ref()
            .map(LocalTrace::try_clone)
            .transpose()?;
        let payload_copy = self
            .payload
            .as_ref()
            .map(DiagnosticPayload::try_clone)
            .transpose()?;
        let imported_copy = self.imported_trace_text.clone();

        {
            let _restore_guard = RESTORE_LOCK
                .lock()
                .expect("Unable to acquire restore lock");
            let mut state = error.state().write();
            state.payload = payload_copy;
            state.raise_ip = self.raise_ip;
            state.imported_trace_text = imported_copy;
            state.local_trace = trace_copy;
        }

        // Forces a re-render on the next trace_text read.
        error.clear_cached_trace_text();

        tracing::debug!(raise_ip = self.raise_ip, "restored foreign dispatch state");
        hooks::notify_foreign_restore(error);
        Ok(())
    }

    /// The deep-copied trace handle held by this snapshot, if any.
    pub fn local_trace(&self) -> Option<&LocalTrace> {
        self.local_trace.as_ref()
    }

    /// The deep-copied payload held by this snapshot, if any.
    pub fn payload(&self) -> Option<&DiagnosticPayload> {
        self.payload.as_ref()
    }

    /// The imported trace text at the moment of capture.
    pub fn imported_trace_text(&self) -> &str {
        &self.imported_trace_text
    }

    /// The raise-site correlation value at the moment of capture.
    pub fn raise_ip(&self) -> usize {
        self.raise_ip
    }
}
