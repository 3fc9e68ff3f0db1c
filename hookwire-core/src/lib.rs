//! # hookwire-core
//!
//! Core types for the hookwire callback dispatch registry.
//!
//! This crate has minimal dependencies and is designed to be imported by
//! extensions that only need to write listeners, without pulling in the
//! registry implementation from `hookwire-std`.
//!
//! # Building Blocks
//!
//! ## Call context ([`CallContext`])
//!
//! The single mutable value object a channel owns. Arguments go in, a
//! result or an error comes out. It is reused across passes and reset
//! explicitly.
//!
//! ## Listener references ([`ListenerRef`])
//!
//! Non-owning, copyable handles to listener functions, either Rust
//! [`ListenerFn`]s or native [`NativeListenerFn`]s handed over by
//! dynamically loaded extensions.
//!
//! ## Address policy ([`AddressPolicy`])
//!
//! The plausibility heuristic every listener address passes before it is
//! stored or called.
//!
//! # Error Types
//!
//! - [`HookwireError`] - Top-level error type
//! - [`ListenerError`] - Rejected listener references
//! - [`DispatchError`] - Aborted dispatch passes
//! - [`ContextError`] - Call context failures
//! - [`ListenerFault`] - A listener failing mid-pass

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

mod context;
mod error;
mod listener;

// Re-exports
pub use context::{CallContext, ContextFlags, ContextValue, MAX_ARGS};
pub use error::{ContextError, DispatchError, HookwireError, ListenerError, ListenerFault};
pub use listener::{AddressPolicy, ListenerFn, ListenerRef, NativeListenerFn};
