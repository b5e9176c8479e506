//! The codec run at serialization boundaries.
//!
//! A live [`RaisedError`] cannot cross into another execution context as it
//! stands: its trace handle and raise-site pointer only mean something in
//! the process that produced them. [`encode`] projects the error into a
//! [`TransferEnvelope`] whose every field is portable, memoizing the trace
//! rendering so the string form survives even though the handle does not.
//! [`decode`] materializes a fresh error on the other side with the
//! context-local fields reset.
//!
//! Whether decode *folds* the carried rendering into the imported
//! accumulator depends on [`ContextBoundary`]: the envelope channel knows
//! whether the bytes actually crossed into a distinguishable context, the
//! codec does not.
//!
//! # Examples
//!
//! ```
//! use redispatch::{ContextBoundary, FrameRecord, LocalTrace, RaisedError, transfer};
//!
//! let error = RaisedError::new("worker panicked");
//! error.attach_local_trace(LocalTrace::new(vec![FrameRecord::new("run_job")]));
//!
//! let envelope = transfer::encode(&error);
//! let decoded = transfer::decode(envelope, ContextBoundary::Crossed);
//!
//! assert_eq!(decoded.message(), Some("worker panicked"));
//! assert!(!decoded.has_local_trace());
//! assert_eq!(decoded.trace_text(), "   at run_job");
//! ```

use serde::{Deserialize, Serialize};

use crate::{
    DiagnosticPayload, PayloadProjection, RaisedError, raised::DispatchFields,
};

/// Whether a transfer crossed into a distinguishable execution context.
///
/// Supplied by the envelope channel at decode time; it is a property of the
/// transfer, not of the error, and is not stored in either.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ContextBoundary {
    /// The envelope crossed a context boundary; fold the carried rendering
    /// into the imported accumulator.
    Crossed,
    /// The envelope stayed within the originating context; leave fields as
    /// decoded.
    Local,
}

/// The portable projection of a raised error.
///
/// Serializable with `serde`, so it can ride whatever channel the host
/// application uses between contexts. A missing [`payload`](Self::payload)
/// is not an error; crash-report correlation is best effort.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferEnvelope {
    /// The error message, if one was set.
    pub message: Option<String>,
    /// The memoized rendering of the sender's local trace.
    pub trace_text: Option<String>,
    /// The sender's accumulated imported trace text.
    pub imported_trace_text: String,
    /// The portable projection of the sender's payload, if it had one.
    pub payload: Option<PayloadProjection>,
}

/// Projects an error into a portable envelope ahead of a transfer.
///
/// Memoizes the trace rendering first — this is one of the explicit
/// render-and-cache operations — so the text survives the loss of the
/// handle. The live object keeps all of its fields.
#[must_use]
pub fn encode(error: &RaisedError) -> TransferEnvelope {
    error.cache_trace_text();
    let state = error.state().read();
    tracing::trace!("encoded raised error for context transfer");
    TransferEnvelope {
        message: error.message().map(str::to_owned),
        trace_text: state.cached_trace_text.clone(),
        imported_trace_text: state.imported_trace_text.clone(),
        payload: state.payload.as_ref().map(DiagnosticPayload::projection),
    }
}

/// Materializes a fresh error from a decoded envelope.
///
/// The new object never holds the prior context's trace handle, and its
/// raise-site pointer is zero. When `boundary` is
/// [`ContextBoundary::Crossed`], the carried rendering is appended to the
/// imported accumulator and dropped from the cache slot — the re-raise on
/// this side is logically a re-throw, physically a brand-new error, and the
/// rendering becomes one more imported leg. With
/// [`ContextBoundary::Local`], the fields are left exactly as decoded.
#[must_use]
pub fn decode(envelope: TransferEnvelope, boundary: ContextBoundary) -> RaisedError {
    let TransferEnvelope {
        message,
        mut trace_text,
        mut imported_trace_text,
        payload,
    } = envelope;

    if boundary == ContextBoundary::Crossed
        && let Some(text) = trace_text.take()
    {
        imported_trace_text.push_str(&text);
    }

    let fields = DispatchFields {
        local_trace: None,
        cached_trace_text: trace_text,
        imported_trace_text,
        payload: payload.map(DiagnosticPayload::from_projection),
        raise_ip: 0,
    };
    tracing::trace!(?boundary, "decoded raised error from context transfer");
    RaisedError::from_decoded(message, fields)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::DEFAULT_RAISE_CODE;

    fn envelope() -> TransferEnvelope {
        TransferEnvelope {
            message: Some("boom".to_owned()),
            trace_text: Some("B".to_owned()),
            imported_trace_text: "A\n".to_owned(),
            payload: Some(PayloadProjection {
                code: DEFAULT_RAISE_CODE,
                buckets: vec![1, 2],
            }),
        }
    }

    #[test]
    fn crossing_decode_folds_and_clears() {
        let decoded = decode(envelope(), ContextBoundary::Crossed);
        assert_eq!(decoded.imported_trace_text(), "A\nB");
        assert_eq!(decoded.cached_trace_text(), None);
        assert!(!decoded.has_local_trace());
        assert_eq!(decoded.raise_ip(), 0);
        assert_eq!(decoded.payload_code(), Some(DEFAULT_RAISE_CODE));
    }

    #[test]
    fn local_decode_leaves_fields_as_decoded() {
        let decoded = decode(envelope(), ContextBoundary::Local);
        assert_eq!(decoded.imported_trace_text(), "A\n");
        assert_eq!(decoded.cached_trace_text(), Some("B".to_owned()));
        assert!(!decoded.has_local_trace());
    }

    #[test]
    fn missing_payload_is_tolerated() {
        let envelope = TransferEnvelope {
            payload: None,
            ..envelope()
        };
        let decoded = decode(envelope, ContextBoundary::Crossed);
        assert_eq!(decoded.payload_code(), None);
    }
}
