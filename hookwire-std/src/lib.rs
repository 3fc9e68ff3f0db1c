//! # hookwire-std
//!
//! Standard implementations for the hookwire callback dispatch registry.
//!
//! This crate provides:
//! - **Channels**: [`Channel`], a named dispatch point with snapshot-based,
//!   fault-isolated dispatch
//! - **Registry**: [`Registry`], the owner of all channels, and the
//!   process-wide [`global`] instance
//! - **Pairs**: [`ChannelPair`], before/after phases with coupled lifetime
//! - **Collected listeners**: link-time registration (feature `inventory`)
//! - **Testing**: helpers for function-pointer listeners

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

// Re-export core types
pub use hookwire_core;

mod channel;
#[cfg(feature = "inventory")]
mod collected;
mod pair;
mod registry;
pub mod testing;

pub use channel::{Channel, ChannelId, DispatchReport};
#[cfg(feature = "inventory")]
pub use collected::{CollectedListener, collected};
pub use pair::ChannelPair;
pub use registry::{Registry, RegistryConfig, global};

#[cfg(feature = "inventory")]
pub use inventory;
