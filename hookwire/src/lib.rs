//! # hookwire - Fault-Tolerant Callback Dispatch
//!
//! `hookwire` is an in-process registry of named channels. Independent
//! listener functions subscribe to a channel and run, in registration
//! order, every time the host executes it. Arguments and results travel
//! through the channel's single [`CallContext`].
//!
//! The registry sits between a stable host and dynamically loaded
//! extension code, so it keeps working when an extension hands it garbage:
//!
//! - listener lists may change while a channel is dispatching (changes
//!   apply from the next pass)
//! - null or corrupted listener addresses are rejected and skipped
//! - a listener that panics is isolated from the others
//! - an unusable call context aborts the pass before anything runs
//!
//! ## Quick Start
//!
//! ```rust
//! use hookwire::{CallContext, ListenerRef, Registry};
//!
//! fn on_round_start(ctx: &mut CallContext) {
//!     let round: u32 = ctx.arg(0).unwrap_or_default();
//!     ctx.set_result(round + 1).ok();
//! }
//!
//! let registry = Registry::new();
//! let channel = registry.find_or_create_channel("round_start");
//! channel.add_listener(ListenerRef::new(on_round_start)).unwrap();
//!
//! channel.with_context(|ctx| ctx.push_arg(7_u32)).unwrap().unwrap();
//! let report = channel.execute(false).unwrap();
//! assert_eq!(report.invoked, 1);
//!
//! let next: u32 = channel.with_context(|ctx| ctx.result()).unwrap().unwrap();
//! assert_eq!(next, 8);
//! channel.reset().unwrap();
//! ```

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

pub use hookwire_core::{
    // Configuration
    AddressPolicy,
    // Call context
    CallContext,
    ContextError,
    ContextFlags,
    ContextValue,
    DispatchError,
    // Errors
    HookwireError,
    ListenerError,
    ListenerFault,
    // Listeners
    ListenerFn,
    ListenerRef,
    MAX_ARGS,
    NativeListenerFn,
};

pub use hookwire_std::{
    Channel, ChannelId, ChannelPair, DispatchReport, Registry, RegistryConfig, global,
};

#[cfg(feature = "inventory")]
pub use hookwire_std::{CollectedListener, collected};

/// Testing utilities.
pub mod testing {
    pub use hookwire_std::testing::{ChannelSlot, Trail};
}

/// Prelude module - common imports for hookwire.
///
/// # Usage
///
/// ```rust
/// use hookwire::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        CallContext, Channel, ChannelPair, DispatchError, HookwireError, ListenerError,
        ListenerRef, Registry,
    };
}

#[cfg(feature = "macros")]
pub use hookwire_macros::listener;

#[cfg(feature = "inventory")]
pub use inventory;
