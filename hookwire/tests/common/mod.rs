#![allow(dead_code)]

use hookwire::{
    CallContext, ContextError, DispatchError, ListenerRef,
    testing::{ChannelSlot, Trail},
};
use tracing_subscriber::EnvFilter;

/// Route hookwire logs to the test output (`RUST_LOG=hookwire_std=trace`).
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

// ============================================================================
// Recording Listeners
// ============================================================================

pub fn record_a(_ctx: &mut CallContext) {
    Trail::record("A");
}

pub fn record_b(_ctx: &mut CallContext) {
    Trail::record("B");
}

pub fn record_c(_ctx: &mut CallContext) {
    Trail::record("C");
}

pub fn late(_ctx: &mut CallContext) {
    Trail::record("late");
}

pub fn faulty(_ctx: &mut CallContext) {
    Trail::record("faulty");
    panic!("intentional listener failure");
}

/// Sums every argument into the result slot.
pub fn sum_args(ctx: &mut CallContext) {
    let total: u64 = ctx.arg_slots().iter().sum();
    ctx.set_result(total).unwrap();
}

// ============================================================================
// Reentrant Listeners (act on the channel in `ChannelSlot`)
// ============================================================================

/// Adds `late` to its own channel.
pub fn adds_late(_ctx: &mut CallContext) {
    Trail::record("adds_late");
    let channel = ChannelSlot::get().expect("channel slot is empty");
    channel.add_listener(ListenerRef::new(late)).unwrap();
}

/// Removes `record_a` from its own channel.
pub fn removes_a(_ctx: &mut CallContext) {
    Trail::record("removes_a");
    let channel = ChannelSlot::get().expect("channel slot is empty");
    channel.remove_listener(ListenerRef::new(record_a));
}

/// Removes `record_c` from its own channel.
pub fn removes_c(_ctx: &mut CallContext) {
    Trail::record("removes_c");
    let channel = ChannelSlot::get().expect("channel slot is empty");
    channel.remove_listener(ListenerRef::new(record_c));
}

/// Executes its own channel again from inside the pass.
pub fn nested_execute(_ctx: &mut CallContext) {
    let channel = ChannelSlot::get().expect("channel slot is empty");
    match channel.execute(false) {
        Err(DispatchError::UnsafeContext(ContextError::Busy)) => Trail::record("nested_busy"),
        _ => Trail::record("nested_ran"),
    }
}

// ============================================================================
// Native Listeners
// ============================================================================

pub unsafe extern "C" fn native_double(ctx: *mut CallContext) {
    // SAFETY: channels pass a pointer to their live context.
    let ctx = unsafe { &mut *ctx };
    let value: u64 = ctx.arg(0).unwrap_or_default();
    ctx.set_result(value * 2).unwrap();
}
