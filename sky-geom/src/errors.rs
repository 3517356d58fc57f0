//! Error types for spherical geometry.
//!
//! Every fallible operation in this crate returns [`GeomResult<T>`]. The
//! variants separate bad caller input (a zero normal, an out-of-range cutoff,
//! an htmid that does not encode a trixel) from geometric degeneracy that the
//! input data cannot avoid (two points that do not define a great circle).
//!
//! | Variant | Raised by |
//! |---------|-----------|
//! | [`InvalidVector`](GeomError::InvalidVector) | zero-length or non-finite vectors |
//! | [`InvalidHalfSpace`](GeomError::InvalidHalfSpace) | cutoff outside `[-1, 1]` |
//! | [`DegenerateGeometry`](GeomError::DegenerateGeometry) | coincident or antipodal construction points |
//! | [`InvalidLevel`](GeomError::InvalidLevel) | HTM level outside `1..=MAX_HTM_LEVEL`, mixed-level joins |
//! | [`InvalidHtmid`](GeomError::InvalidHtmid) | malformed trixel ids |

use thiserror::Error;

/// Unified error type for spherical geometry operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeomError {
    /// A vector was zero-length or contained NaN/infinity.
    #[error("Invalid vector in {operation}: {message}")]
    InvalidVector { operation: String, message: String },

    /// Half-space parameters outside their valid domain.
    #[error("Invalid half-space: {message}")]
    InvalidHalfSpace { message: String },

    /// Construction points do not determine the requested shape.
    #[error("Degenerate geometry in {context}: {message}")]
    DegenerateGeometry { context: String, message: String },

    /// HTM recursion level outside the supported range.
    #[error("Invalid HTM level {level}: {message}")]
    InvalidLevel { level: u32, message: String },

    /// Integer that does not encode any trixel.
    #[error("Invalid htmid {htmid}: {message}")]
    InvalidHtmid { htmid: u64, message: String },
}

/// Convenience alias for `Result<T, GeomError>`.
pub type GeomResult<T> = Result<T, GeomError>;

impl GeomError {
    pub fn invalid_vector(operation: &str, reason: &str) -> Self {
        Self::InvalidVector {
            operation: operation.to_string(),
            message: reason.to_string(),
        }
    }

    pub fn invalid_half_space(reason: impl Into<String>) -> Self {
        Self::InvalidHalfSpace {
            message: reason.into(),
        }
    }

    pub fn degenerate(context: &str, reason: &str) -> Self {
        Self::DegenerateGeometry {
            context: context.to_string(),
            message: reason.to_string(),
        }
    }

    pub fn invalid_level(level: u32, reason: impl Into<String>) -> Self {
        Self::InvalidLevel {
            level,
            message: reason.into(),
        }
    }

    pub fn invalid_htmid(htmid: u64, reason: impl Into<String>) -> Self {
        Self::InvalidHtmid {
            htmid,
            message: reason.into(),
        }
    }
}
