//! Error types for hookwire.
//!
//! This module provides a structured error hierarchy using `thiserror`:
//!
//! - [`HookwireError`] - Top-level error type for all hookwire operations
//! - [`ListenerError`] - Listener references rejected at a channel boundary
//! - [`DispatchError`] - Dispatch passes aborted before any listener ran
//! - [`ContextError`] - Failures touching a call context
//! - [`ListenerFault`] - One listener failing inside an otherwise healthy pass

use thiserror::Error;

/// Top-level error type for all hookwire operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HookwireError {
    /// A listener reference was rejected.
    #[error("listener error: {0}")]
    Listener(#[from] ListenerError),

    /// A dispatch pass was aborted.
    #[error("dispatch error: {0}")]
    Dispatch(#[from] DispatchError),

    /// The call context could not be used.
    #[error("context error: {0}")]
    Context(#[from] ContextError),
}

/// Reasons a listener reference is refused.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerError {
    /// The reference does not point anywhere.
    #[error("null listener reference")]
    Null,

    /// The address is below the floor or carries poisoned high bits.
    #[error("implausible listener address {addr:#x}")]
    Implausible {
        /// The rejected raw address.
        addr: usize,
    },

    /// The channel was released and no longer accepts listeners.
    #[error("channel has been released")]
    ChannelReleased,
}

/// Errors that abort a dispatch pass before it starts.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// The call context failed its liveness probe.
    #[error("call context is unsafe: {0}")]
    UnsafeContext(#[source] ContextError),

    /// The channel was released; its handle is detached.
    #[error("channel `{0}` has been released")]
    Released(String),
}

/// Errors raised while touching a call context.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContextError {
    /// The native side tore the context down.
    #[error("call context has been invalidated")]
    Invalidated,

    /// A previous user of the context panicked while holding it.
    #[error("call context lock is poisoned")]
    Poisoned,

    /// A dispatch pass currently owns the context.
    #[error("call context is in use by a dispatch pass")]
    Busy,

    /// Argument index past the number of pushed arguments.
    #[error("argument index {index} out of range ({len} arguments)")]
    ArgumentOutOfRange {
        /// Requested index.
        index: usize,
        /// Number of arguments present.
        len: usize,
    },

    /// All argument slots are in use.
    #[error("too many arguments (max {max})")]
    TooManyArguments {
        /// Slot capacity.
        max: usize,
    },
}

/// A single listener failing during a dispatch pass.
///
/// Faults are recorded, never propagated; the pass continues with the
/// next listener.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("listener #{index} faulted: {message}")]
pub struct ListenerFault {
    /// Position of the listener in the pass snapshot.
    pub index: usize,
    /// Panic payload rendered as text.
    pub message: String,
}
