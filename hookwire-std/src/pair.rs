//! Before/after channel pairs.

use crate::{channel::Channel, registry::Registry};
use std::sync::Arc;

/// Two channels for the "before" and "after" phases of one operation.
///
/// The pair only holds the channels; callers execute each phase
/// themselves and skip a phase whose channel is absent. Dropping the pair
/// releases both channels through the registry that created them.
///
/// # Example
///
/// ```rust
/// use hookwire_std::{ChannelPair, Registry};
/// use std::sync::Arc;
///
/// let registry = Arc::new(Registry::new());
/// let mut pair = ChannelPair::named(&registry, "player_spawn");
/// assert!(registry.find_channel("player_spawn:before").is_some());
///
/// if let Some(before) = pair.before() {
///     before.execute(true).unwrap();
/// }
///
/// pair.release();
/// pair.release();
/// assert!(registry.is_empty());
/// ```
#[derive(Debug)]
pub struct ChannelPair {
    registry: Arc<Registry>,
    before: Option<Arc<Channel>>,
    after: Option<Arc<Channel>>,
}

impl ChannelPair {
    /// Create both channels with empty names.
    pub fn new(registry: &Arc<Registry>) -> Self {
        Self {
            registry: Arc::clone(registry),
            before: Some(registry.create_channel("")),
            after: Some(registry.create_channel("")),
        }
    }

    /// Create `"{base}:before"` and `"{base}:after"`.
    pub fn named(registry: &Arc<Registry>, base: &str) -> Self {
        Self {
            registry: Arc::clone(registry),
            before: Some(registry.create_channel(format!("{base}:before"))),
            after: Some(registry.create_channel(format!("{base}:after"))),
        }
    }

    /// A pair without channels, for operations whose phases are optional.
    pub fn empty(registry: &Arc<Registry>) -> Self {
        Self {
            registry: Arc::clone(registry),
            before: None,
            after: None,
        }
    }

    /// The "before" channel, if present.
    pub fn before(&self) -> Option<&Arc<Channel>> {
        self.before.as_ref()
    }

    /// The "after" channel, if present.
    pub fn after(&self) -> Option<&Arc<Channel>> {
        self.after.as_ref()
    }

    /// Whether the pair holds no channel.
    pub fn is_empty(&self) -> bool {
        self.before.is_none() && self.after.is_none()
    }

    /// Release both channels. Idempotent.
    pub fn release(&mut self) {
        if let Some(before) = self.before.take() {
            self.registry.release_channel(before);
        }
        if let Some(after) = self.after.take() {
            self.registry.release_channel(after);
        }
    }
}

impl Drop for ChannelPair {
    fn drop(&mut self) {
        self.release();
    }
}
