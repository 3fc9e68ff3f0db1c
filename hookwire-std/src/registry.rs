//! Registry owning every channel.
//!
//! Channels are created by name, looked up first-match, and released
//! individually or all at once. Names are not unique: creating a second
//! channel with an existing name hides it from [`Registry::find_channel`]
//! until the first one is released.
//!
//! Handles returned to callers are `Arc<Channel>`. Releasing a channel
//! detaches it, so a stale handle stays memory-safe and every operation on
//! it becomes an inert, logged no-op.

use crate::channel::Channel;
use hookwire_core::{AddressPolicy, ListenerRef};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};
use tracing::{info, trace, warn};

/// Registry settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RegistryConfig {
    /// Address policy inherited by every channel.
    pub policy: AddressPolicy,
    /// Warn when a channel is created under a name already in use.
    pub warn_on_duplicate_names: bool,
}

impl RegistryConfig {
    /// Create the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the address policy.
    pub fn with_policy(mut self, policy: AddressPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Enable or disable the duplicate-name warning.
    pub fn with_duplicate_name_warning(mut self, enabled: bool) -> Self {
        self.warn_on_duplicate_names = enabled;
        self
    }
}

/// Owner of all channels.
///
/// # Example
///
/// ```rust
/// use hookwire_core::{CallContext, ListenerRef};
/// use hookwire_std::Registry;
///
/// fn double(ctx: &mut CallContext) {
///     let value: i64 = ctx.arg(0).unwrap();
///     ctx.set_result(value * 2).unwrap();
/// }
///
/// let registry = Registry::new();
/// let channel = registry.create_channel("double");
/// assert!(registry.try_add_function("double", ListenerRef::new(double)));
///
/// channel.with_context(|ctx| ctx.push_arg(21_i64)).unwrap().unwrap();
/// channel.execute(false).unwrap();
/// let result = channel.with_context(|ctx| ctx.result::<i64>()).unwrap();
/// assert_eq!(result, Ok(42));
/// ```
#[derive(Debug, Default)]
pub struct Registry {
    config: RegistryConfig,
    channels: Mutex<Vec<Arc<Channel>>>,
}

impl Registry {
    /// Create an empty registry with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty registry with `config`.
    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            config,
            channels: Mutex::new(Vec::new()),
        }
    }

    /// The registry configuration.
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    fn channels(&self) -> MutexGuard<'_, Vec<Arc<Channel>>> {
        self.channels.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn create_locked(&self, channels: &mut Vec<Arc<Channel>>, name: String) -> Arc<Channel> {
        if self.config.warn_on_duplicate_names && channels.iter().any(|c| c.name() == name) {
            warn!(channel = %name, "creating channel with a duplicate name; lookups return the older one");
        }
        trace!(channel = %name, "creating channel");
        let channel = Arc::new(Channel::with_policy(name, self.config.policy));
        channels.push(Arc::clone(&channel));
        channel
    }

    /// Allocate a new channel, even if the name is already in use.
    pub fn create_channel(&self, name: impl Into<String>) -> Arc<Channel> {
        let mut channels = self.channels();
        self.create_locked(&mut channels, name.into())
    }

    /// First channel named exactly `name`.
    pub fn find_channel(&self, name: &str) -> Option<Arc<Channel>> {
        self.channels().iter().find(|c| c.name() == name).cloned()
    }

    /// First channel named `name`, created when missing.
    pub fn find_or_create_channel(&self, name: &str) -> Arc<Channel> {
        let mut channels = self.channels();
        if let Some(channel) = channels.iter().find(|c| c.name() == name) {
            return Arc::clone(channel);
        }
        self.create_locked(&mut channels, name.to_string())
    }

    /// Whether `channel` is managed by this registry.
    pub fn contains(&self, channel: &Arc<Channel>) -> bool {
        self.channels().iter().any(|c| Arc::ptr_eq(c, channel))
    }

    /// Release a channel.
    ///
    /// `None` is a logged no-op. A channel this registry does not manage is
    /// logged and released anyway, so callers always treat the handle as
    /// consumed.
    pub fn release_channel(&self, channel: impl Into<Option<Arc<Channel>>>) {
        let Some(channel) = channel.into() else {
            warn!("attempted to release null channel");
            return;
        };

        trace!(channel = %channel.name(), "releasing channel");
        let managed = {
            let mut channels = self.channels();
            let before = channels.len();
            channels.retain(|c| !Arc::ptr_eq(c, &channel));
            channels.len() != before
        };

        if !managed {
            warn!(channel = %channel.name(), "channel not found in managed list during release");
        }
        channel.release();
    }

    /// Add `listener` to the first channel named `name`.
    ///
    /// Returns `false` when no such channel exists or the listener is
    /// rejected. Never creates a channel.
    pub fn try_add_function(&self, name: &str, listener: ListenerRef) -> bool {
        match self.find_channel(name) {
            Some(channel) => channel.add_listener(listener).is_ok(),
            None => false,
        }
    }

    /// Remove `listener` from the first channel named `name`.
    ///
    /// Returns `false` when no such channel exists or the listener was not
    /// registered there.
    pub fn try_remove_function(&self, name: &str, listener: ListenerRef) -> bool {
        self.find_channel(name)
            .is_some_and(|channel| channel.remove_listener(listener))
    }

    /// Release every channel and empty the managed set.
    pub fn clear_all_callbacks(&self) {
        let drained: Vec<Arc<Channel>> = std::mem::take(&mut *self.channels());
        trace!(count = drained.len(), "clearing all managed channels");
        for channel in drained {
            channel.release();
        }
    }

    /// Number of managed channels.
    pub fn len(&self) -> usize {
        self.channels().len()
    }

    /// Whether no channel is managed.
    pub fn is_empty(&self) -> bool {
        self.channels().is_empty()
    }

    /// Names of all managed channels in creation order.
    pub fn channel_names(&self) -> Vec<String> {
        self.channels().iter().map(|c| c.name().to_string()).collect()
    }

    /// Log every managed channel and return the same listing.
    pub fn print_debug(&self) -> String {
        let channels = self.channels().clone();
        let mut dump = String::from("----CALLBACKS----\n");
        info!("----CALLBACKS----");
        for channel in &channels {
            info!(channel = %channel.name(), id = %channel.id(), listeners = channel.len(), "callback");
            dump.push_str(&format!("{} ({} listeners)\n", channel.name(), channel.len()));
        }
        dump
    }
}

impl Drop for Registry {
    fn drop(&mut self) {
        self.clear_all_callbacks();
    }
}

/// The process-wide registry.
///
/// Never dropped; hosts call [`Registry::clear_all_callbacks`] at teardown.
pub fn global() -> &'static Arc<Registry> {
    static GLOBAL: OnceLock<Arc<Registry>> = OnceLock::new();
    GLOBAL.get_or_init(|| Arc::new(Registry::new()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use hookwire_core::CallContext;

    fn noop(ctx: &mut CallContext) {
        ctx.push_arg(3_u8).unwrap();
    }

    #[test]
    fn test_create_and_find() {
        let registry = Registry::new();
        let a = registry.create_channel("a");
        registry.create_channel("b");

        let found = registry.find_channel("a").unwrap();
        assert!(Arc::ptr_eq(&a, &found));
        assert!(registry.find_channel("c").is_none());
        assert_eq!(registry.channel_names(), vec!["a", "b"]);
    }

    #[test]
    fn test_find_or_create_reuses() {
        let registry = Registry::new();
        let first = registry.find_or_create_channel("x");
        let second = registry.find_or_create_channel("x");
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_release_none_is_noop() {
        let registry = Registry::new();
        registry.create_channel("kept");
        registry.release_channel(None::<Arc<Channel>>);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_release_foreign_channel_still_releases() {
        let registry = Registry::new();
        let foreign = Arc::new(Channel::new("foreign"));
        registry.release_channel(Arc::clone(&foreign));
        assert!(foreign.is_released());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_channels_inherit_policy() {
        let policy = AddressPolicy::new().with_address_floor(0x2000);
        let registry = Registry::with_config(RegistryConfig::new().with_policy(policy));
        assert_eq!(registry.create_channel("p").policy(), policy);
    }

    #[test]
    fn test_drop_releases_handles() {
        let registry = Registry::new();
        let channel = registry.create_channel("orphan");
        channel.add_listener(ListenerRef::new(noop)).unwrap();
        drop(registry);

        assert!(channel.is_released());
        assert!(channel.is_empty());
    }

    #[test]
    fn test_print_debug_lists_names() {
        let registry = Registry::new();
        registry.create_channel("first");
        registry.create_channel("second");

        let dump = registry.print_debug();
        assert!(dump.starts_with("----CALLBACKS----"));
        assert!(dump.contains("first (0 listeners)"));
        assert!(dump.contains("second (0 listeners)"));
    }

    #[test]
    fn test_global_is_shared() {
        assert!(Arc::ptr_eq(global(), global()));
    }
}
