//! Structured error type for markup decoding and fragment operations.

extern crate alloc;

use alloc::boxed::Box;
use alloc::string::String;
use core::fmt;

/// Structured error for fragment construction and markup codec operations.
///
/// Truncation passes themselves never fail; this type only surfaces where
/// the host hands the core something it cannot represent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClampError {
    /// Stable machine-readable code.
    pub code: &'static str,
    /// Human-readable message.
    pub message: Box<str>,
    /// Optional byte offset into the markup source.
    pub offset: Option<usize>,
    /// Optional typed actual-vs-limit context.
    pub limit: Option<ClampLimitContext>,
}

/// Actual-vs-limit context attached to limit errors.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClampLimitContext {
    /// Which limit was hit.
    pub kind: &'static str,
    /// Observed value.
    pub actual: usize,
    /// Configured ceiling.
    pub limit: usize,
}

impl ClampError {
    pub(crate) fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into().into_boxed_str(),
            offset: None,
            limit: None,
        }
    }

    pub(crate) fn with_offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    pub(crate) fn with_limit(mut self, kind: &'static str, actual: usize, limit: usize) -> Self {
        self.limit = Some(ClampLimitContext {
            kind,
            actual,
            limit,
        });
        self
    }
}

impl fmt::Display for ClampError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)?;
        if let Some(offset) = self.offset {
            write!(f, " [offset={}]", offset)?;
        }
        if let Some(limit) = &self.limit {
            write!(
                f,
                " [limit_kind={} actual={} limit={}]",
                limit.kind, limit.actual, limit.limit
            )?;
        }
        Ok(())
    }
}

impl std::error::Error for ClampError {}
