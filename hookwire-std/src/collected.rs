//! Link-time listener registration via `inventory`.
//!
//! Extensions submit [`CollectedListener`]s (usually through the
//! `#[listener("channel")]` attribute) and the host installs them into a
//! registry once at startup with [`Registry::install_collected`].

use crate::registry::Registry;
use hookwire_core::{ListenerFn, ListenerRef};
use tracing::{trace, warn};

/// A listener submitted for a named channel.
pub struct CollectedListener {
    /// Channel the listener subscribes to.
    pub channel: &'static str,
    /// Name for diagnostics.
    pub name: &'static str,
    /// The listener function.
    pub listener: ListenerFn,
}

impl CollectedListener {
    /// Create a collected listener entry.
    pub const fn new(channel: &'static str, name: &'static str, listener: ListenerFn) -> Self {
        Self {
            channel,
            name,
            listener,
        }
    }
}

inventory::collect!(CollectedListener);

/// Iterate over every submitted listener.
///
/// Iteration order is unspecified.
pub fn collected() -> impl Iterator<Item = &'static CollectedListener> {
    inventory::iter::<CollectedListener>.into_iter()
}

impl Registry {
    /// Subscribe every collected listener to its channel.
    ///
    /// Each listener goes to the first channel with the matching name,
    /// which is created when missing. Returns the number installed.
    pub fn install_collected(&self) -> usize {
        let mut installed = 0;
        for entry in collected() {
            let channel = self.find_or_create_channel(entry.channel);
            match channel.add_listener(ListenerRef::new(entry.listener)) {
                Ok(()) => {
                    trace!(channel = entry.channel, listener = entry.name, "installed collected listener");
                    installed += 1;
                }
                Err(err) => {
                    warn!(channel = entry.channel, listener = entry.name, %err, "failed to install collected listener");
                }
            }
        }
        installed
    }
}
