//! Crash-report correlation payloads.
//!
//! A [`DiagnosticPayload`] is the opaque blob a platform crash reporter
//! associates with a raised error, plus a numeric exception code. The blob
//! is only meaningful inside the originating process; what survives a
//! context transfer is the portable [`PayloadProjection`].

use serde::{Deserialize, Serialize};

use crate::CopyError;

/// Default numeric exception code for crash-report payloads, for hosts that
/// do not assign platform-specific ones.
pub const DEFAULT_RAISE_CODE: u32 = 0xE043_4352;

/// Opaque crash-report correlation data attached to a raised error.
///
/// Exclusively owned by its error object. Like
/// [`LocalTrace`](crate::LocalTrace) it has no `Clone` implementation;
/// duplication goes through the fallible [`try_clone`](Self::try_clone).
#[derive(Debug, PartialEq, Eq)]
pub struct DiagnosticPayload {
    data: Vec<u8>,
    code: u32,
}

impl DiagnosticPayload {
    /// Creates a payload from raw correlation data and an exception code.
    #[must_use]
    pub fn new(data: Vec<u8>, code: u32) -> Self {
        Self { data, code }
    }

    /// The raw correlation blob.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// The numeric exception code.
    pub fn code(&self) -> u32 {
        self.code
    }

    /// Deep-copies the payload into an independently owned value.
    ///
    /// # Errors
    ///
    /// Returns [`CopyError`] when the backing allocation cannot be reserved.
    pub fn try_clone(&self) -> Result<Self, CopyError> {
        let mut data = Vec::new();
        data.try_reserve_exact(self.data.len())?;
        data.extend_from_slice(&self.data);
        Ok(Self {
            data,
            code: self.code,
        })
    }

    pub(crate) fn projection(&self) -> PayloadProjection {
        PayloadProjection {
            code: self.code,
            buckets: self.data.clone(),
        }
    }

    pub(crate) fn from_projection(projection: PayloadProjection) -> Self {
        Self {
            data: projection.buckets,
            code: projection.code,
        }
    }
}

/// The portable form of a [`DiagnosticPayload`] written into a
/// [`TransferEnvelope`](crate::TransferEnvelope).
///
/// Carries the exception code and the bucket bytes, but none of the
/// process-local handles.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayloadProjection {
    /// The numeric exception code.
    pub code: u32,
    /// The crash-report bucket bytes.
    pub buckets: Vec<u8>,
}
