//! Named dispatch points.
//!
//! A [`Channel`] owns an ordered listener sequence and one [`CallContext`].
//! [`execute`](Channel::execute) runs every listener against a snapshot of
//! the sequence taken when the pass starts, so listeners may add or remove
//! entries on their own channel; such changes apply from the next pass.
//!
//! The listener lock is never held while a listener runs. The context lock
//! is held for the whole pass, so passes started from different threads run
//! one after another. A reentrant `execute` from inside a listener on the
//! same thread observes a busy context and aborts instead of deadlocking.

use hookwire_core::{
    AddressPolicy, CallContext, ContextError, DispatchError, ListenerError, ListenerFault,
    ListenerRef,
};
use std::{
    any::Any,
    fmt,
    panic::{self, AssertUnwindSafe},
    sync::{
        LockResult, Mutex, MutexGuard, PoisonError,
        atomic::{AtomicBool, AtomicU64, Ordering},
    },
    thread::{self, ThreadId},
};
use tracing::{error, trace, warn};

/// Process-unique channel identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChannelId(u64);

impl ChannelId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    /// The raw id.
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Outcome of one dispatch pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Listeners that were called, including those that faulted.
    pub invoked: usize,
    /// Snapshot entries skipped because they failed validation.
    pub skipped: usize,
    /// Listeners that panicked.
    pub faults: Vec<ListenerFault>,
}

impl DispatchReport {
    /// Whether every snapshot entry ran without fault.
    pub fn is_clean(&self) -> bool {
        self.skipped == 0 && self.faults.is_empty()
    }
}

enum ContextProbe<'a> {
    Safe(MutexGuard<'a, CallContext>),
    Unsafe(Option<MutexGuard<'a, CallContext>>, ContextError),
}

/// Marks the current thread as the one running a pass; cleared on drop.
struct Dispatching<'a>(&'a Mutex<Option<ThreadId>>);

impl Drop for Dispatching<'_> {
    fn drop(&mut self) {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

/// A named dispatch point.
pub struct Channel {
    id: ChannelId,
    name: String,
    policy: AddressPolicy,
    listeners: Mutex<Vec<ListenerRef>>,
    context: Mutex<CallContext>,
    dispatcher: Mutex<Option<ThreadId>>,
    released: AtomicBool,
}

impl Channel {
    /// Create a channel with the default address policy.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_policy(name, AddressPolicy::default())
    }

    /// Create a channel with a custom address policy.
    pub fn with_policy(name: impl Into<String>, policy: AddressPolicy) -> Self {
        Self {
            id: ChannelId::next(),
            name: name.into(),
            policy,
            listeners: Mutex::new(Vec::new()),
            context: Mutex::new(CallContext::new()),
            dispatcher: Mutex::new(None),
            released: AtomicBool::new(false),
        }
    }

    /// The channel name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The channel identity.
    pub fn id(&self) -> ChannelId {
        self.id
    }

    /// The address policy applied to listeners.
    pub fn policy(&self) -> AddressPolicy {
        self.policy
    }

    fn listeners(&self) -> MutexGuard<'_, Vec<ListenerRef>> {
        // A plain Vec of Copy values cannot be left half-updated.
        self.listeners.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of registered listener entries, duplicates included.
    pub fn len(&self) -> usize {
        self.listeners().len()
    }

    /// Whether no listener is registered.
    pub fn is_empty(&self) -> bool {
        self.listeners().is_empty()
    }

    /// Whether `listener` is registered at least once.
    pub fn contains(&self, listener: ListenerRef) -> bool {
        self.listeners().contains(&listener)
    }

    /// Whether the registry released this channel.
    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::Acquire)
    }

    /// Append a listener.
    ///
    /// Null and implausible references are logged and refused without
    /// changing the sequence. Adding the same reference twice makes it run
    /// twice per pass.
    pub fn add_listener(&self, listener: ListenerRef) -> Result<(), ListenerError> {
        if self.is_released() {
            warn!(channel = %self.name, %listener, "attempted to add listener to released channel");
            return Err(ListenerError::ChannelReleased);
        }

        if let Err(err) = self.policy.check(listener) {
            error!(channel = %self.name, %listener, %err, "rejected listener");
            return Err(err);
        }

        self.listeners().push(listener);
        trace!(channel = %self.name, %listener, "added listener");
        Ok(())
    }

    /// Remove every occurrence of `listener`.
    ///
    /// Returns `false` for a null reference (with a warning) or when the
    /// listener is not registered.
    pub fn remove_listener(&self, listener: ListenerRef) -> bool {
        if listener.is_null() {
            warn!(channel = %self.name, "attempted to remove null listener");
            return false;
        }

        let removed = {
            let mut listeners = self.listeners();
            let before = listeners.len();
            listeners.retain(|l| *l != listener);
            listeners.len() != before
        };

        if removed {
            trace!(channel = %self.name, %listener, "removed listener");
        }
        removed
    }

    fn dispatching_here(&self) -> bool {
        let dispatcher = self.dispatcher.lock().unwrap_or_else(PoisonError::into_inner);
        *dispatcher == Some(thread::current().id())
    }

    /// Lock the context, waiting for a pass running on another thread.
    ///
    /// Fails with [`ContextError::Busy`] when the calling thread is itself
    /// inside a pass on this channel, where waiting would deadlock.
    fn lock_context(&self) -> Result<LockResult<MutexGuard<'_, CallContext>>, ContextError> {
        if self.dispatching_here() {
            return Err(ContextError::Busy);
        }
        Ok(self.context.lock())
    }

    fn probe_context(&self) -> ContextProbe<'_> {
        match self.lock_context() {
            Ok(Ok(ctx)) => match ctx.result::<u64>() {
                Ok(_) => ContextProbe::Safe(ctx),
                Err(err) => ContextProbe::Unsafe(Some(ctx), err),
            },
            Ok(Err(poisoned)) => {
                ContextProbe::Unsafe(Some(poisoned.into_inner()), ContextError::Poisoned)
            }
            Err(err) => ContextProbe::Unsafe(None, err),
        }
    }

    /// Probe whether the call context can be touched at all.
    ///
    /// Best effort: reads the result slot, and reports unsafe when the
    /// context was invalidated, its lock is poisoned, or the calling thread
    /// is inside a pass on this channel. Waits for passes on other threads.
    pub fn is_context_safe(&self) -> bool {
        match self.probe_context() {
            ContextProbe::Safe(_) => true,
            ContextProbe::Unsafe(_, err) => {
                warn!(channel = %self.name, %err, "call context is invalid");
                false
            }
        }
    }

    /// Run every listener once.
    ///
    /// Waits while another thread runs a pass on this channel. Aborts
    /// before calling anything if the context is unsafe. Otherwise
    /// each snapshot entry is validated and called in order; a listener
    /// that panics is logged, reported through the context's error path
    /// and recorded, and the pass moves on. With `reset_after` the context
    /// is zeroed once all listeners ran.
    pub fn execute(&self, reset_after: bool) -> Result<DispatchReport, DispatchError> {
        if self.is_released() {
            warn!(channel = %self.name, "attempted to execute released channel");
            return Err(DispatchError::Released(self.name.clone()));
        }

        let mut ctx = match self.probe_context() {
            ContextProbe::Safe(ctx) => ctx,
            ContextProbe::Unsafe(ctx, err) => {
                if let Some(mut ctx) = ctx {
                    ctx.throw_native_error("channel execution aborted due to invalid context");
                }
                warn!(channel = %self.name, %err, "execution aborted due to invalid context");
                return Err(DispatchError::UnsafeContext(err));
            }
        };

        *self.dispatcher.lock().unwrap_or_else(PoisonError::into_inner) =
            Some(thread::current().id());
        let _dispatching = Dispatching(&self.dispatcher);

        let snapshot = self.listeners().clone();
        let mut report = DispatchReport::default();

        for (index, listener) in snapshot.into_iter().enumerate() {
            // Entries were checked on add; this catches a stored value that
            // was corrupted since.
            if let Err(err) = self.policy.check(listener) {
                error!(channel = %self.name, index, %listener, %err, "skipping invalid listener");
                report.skipped += 1;
                continue;
            }

            // SAFETY: the address passed the policy; native references stay
            // valid until their extension removes them.
            let outcome =
                panic::catch_unwind(AssertUnwindSafe(|| unsafe { listener.invoke(&mut ctx) }));
            report.invoked += 1;

            if let Err(payload) = outcome {
                let message = panic_message(payload.as_ref());
                ctx.throw_native_error(format!("exception in callback execution: {message}"));
                error!(channel = %self.name, index, %listener, %message, "listener faulted");
                report.faults.push(ListenerFault { index, message });
            }
        }

        // A listener may have released the channel; release could not
        // reach the context while this pass held it.
        if reset_after || self.is_released() {
            ctx.reset();
        }

        trace!(
            channel = %self.name,
            invoked = report.invoked,
            skipped = report.skipped,
            faults = report.faults.len(),
            "executed channel"
        );
        Ok(report)
    }

    /// Zero the call context and clear any lock poisoning. Idempotent.
    ///
    /// Waits for a pass running on another thread. Fails with
    /// [`ContextError::Busy`] when called from inside a pass on this channel.
    pub fn reset(&self) -> Result<(), ContextError> {
        match self.lock_context()? {
            Ok(mut ctx) => ctx.reset(),
            Err(poisoned) => {
                poisoned.into_inner().reset();
                self.context.clear_poison();
            }
        }
        Ok(())
    }

    /// Scoped access to the call context for marshalling.
    ///
    /// The context cannot escape `f`. A poisoned context is still handed
    /// out so the host can inspect it; dispatch stays blocked until
    /// [`reset`](Self::reset). Waits for a pass running on another thread;
    /// fails with [`ContextError::Busy`] from inside a pass on this channel.
    pub fn with_context<R>(&self, f: impl FnOnce(&mut CallContext) -> R) -> Result<R, ContextError> {
        let mut ctx = self.lock_context()?.unwrap_or_else(PoisonError::into_inner);
        Ok(f(&mut ctx))
    }

    /// Detach the channel: drop all listeners, zero the context. Idempotent.
    pub(crate) fn release(&self) {
        if self.released.swap(true, Ordering::AcqRel) {
            return;
        }

        self.listeners().clear();
        // From inside one of its own listeners the running pass resets the
        // context when it finishes.
        if let Ok(lock) = self.lock_context() {
            lock.unwrap_or_else(PoisonError::into_inner).reset();
        }
        trace!(channel = %self.name, id = %self.id, "released channel");
    }
}

impl fmt::Debug for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Channel")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("listeners", &self.len())
            .field("released", &self.is_released())
            .finish()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
