//! Error Types
//!
//! This module defines the error types used throughout the RHI cache layer.
//!
//! # Overview
//!
//! The main error type [`RhiError`] covers the three failure classes of this
//! subsystem:
//! - Configuration errors — malformed descriptors, rejected before any
//!   backend call is made.
//! - Backend creation failures — native object creation rejected by the
//!   driver; the cache is left unmodified and the error propagates to the
//!   renderer.
//! - Lifecycle-discipline violations — unpaired render-pass begin/end,
//!   binding instances used before being written, single-frame instances
//!   crossing a frame boundary. These indicate a caller bug and are
//!   additionally debug-asserted close to the detection site.
//!
//! All public APIs return [`Result<T>`], an alias for
//! `std::result::Result<T, RhiError>`.

use thiserror::Error;

/// The main error type for the RHI cache layer.
#[derive(Error, Debug)]
pub enum RhiError {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// A descriptor failed validation before reaching the backend.
    ///
    /// Examples: an empty shader binding array, duplicate binding slots, a
    /// graphics pipeline without a render pass.
    #[error("Invalid descriptor: {0}")]
    InvalidDescriptor(String),

    // ========================================================================
    // Backend Failures
    // ========================================================================
    /// The active backend rejected a native object creation call.
    ///
    /// The pool that requested the creation is guaranteed to be unmodified;
    /// the caller may retry with a degraded configuration or abort the frame.
    #[error("Backend failed to create {what}: {reason}")]
    BackendCreation {
        /// What was being created (e.g. `"graphics pipeline"`).
        what: &'static str,
        /// Backend-reported reason.
        reason: String,
    },

    // ========================================================================
    // Lifecycle Violations
    // ========================================================================
    /// A caller broke the recording or lifetime discipline.
    #[error("Lifecycle violation: {0}")]
    LifecycleViolation(String),
}

/// Alias for `Result<T, RhiError>`.
pub type Result<T> = std::result::Result<T, RhiError>;
