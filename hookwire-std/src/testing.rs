//! Testing utilities for hookwire.
//!
//! Listeners are plain function pointers and cannot capture state, so
//! these helpers keep test state in thread-locals. The default test
//! harness runs each test on its own thread, which keeps tests isolated.
//!
//! - [`Trail`]: records which listeners ran, in order
//! - [`ChannelSlot`]: hands a channel to listeners that mutate it mid-pass

use crate::channel::Channel;
use std::{cell::RefCell, sync::Arc};

thread_local! {
    static TRAIL: RefCell<Vec<&'static str>> = const { RefCell::new(Vec::new()) };
    static SLOT: RefCell<Option<Arc<Channel>>> = const { RefCell::new(None) };
}

/// Per-thread record of listener invocations.
///
/// # Example
///
/// ```rust
/// use hookwire_core::{CallContext, ListenerRef};
/// use hookwire_std::{Channel, testing::Trail};
///
/// fn a(_ctx: &mut CallContext) {
///     Trail::record("a");
/// }
///
/// let channel = Channel::new("demo");
/// channel.add_listener(ListenerRef::new(a)).unwrap();
/// channel.execute(true).unwrap();
/// assert_eq!(Trail::take(), vec!["a"]);
/// ```
pub struct Trail;

impl Trail {
    /// Append a tag.
    pub fn record(tag: &'static str) {
        TRAIL.with(|trail| trail.borrow_mut().push(tag));
    }

    /// Return and clear the recorded tags.
    pub fn take() -> Vec<&'static str> {
        TRAIL.with(|trail| std::mem::take(&mut *trail.borrow_mut()))
    }

    /// Number of recorded tags.
    pub fn len() -> usize {
        TRAIL.with(|trail| trail.borrow().len())
    }

    /// Clear the recorded tags.
    pub fn clear() {
        TRAIL.with(|trail| trail.borrow_mut().clear());
    }
}

/// Per-thread slot holding the channel a reentrant listener should touch.
pub struct ChannelSlot;

impl ChannelSlot {
    /// Store a channel.
    pub fn set(channel: &Arc<Channel>) {
        SLOT.with(|slot| *slot.borrow_mut() = Some(Arc::clone(channel)));
    }

    /// The stored channel.
    pub fn get() -> Option<Arc<Channel>> {
        SLOT.with(|slot| slot.borrow().clone())
    }

    /// Empty the slot.
    pub fn clear() {
        SLOT.with(|slot| *slot.borrow_mut() = None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trail_take_clears() {
        Trail::record("x");
        Trail::record("y");
        assert_eq!(Trail::len(), 2);
        assert_eq!(Trail::take(), vec!["x", "y"]);
        assert_eq!(Trail::len(), 0);
    }

    #[test]
    fn test_slot_roundtrip() {
        let channel = Arc::new(Channel::new("slot"));
        ChannelSlot::set(&channel);
        assert!(Arc::ptr_eq(&ChannelSlot::get().unwrap(), &channel));
        ChannelSlot::clear();
        assert!(ChannelSlot::get().is_none());
    }
}
