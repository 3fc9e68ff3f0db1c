//! Listeners mutating their own channel during a pass.

use hookwire::{
    ListenerRef, Registry,
    testing::{ChannelSlot, Trail},
};
use std::sync::Arc;

mod common;
use common::{
    adds_late, init_tracing, nested_execute, record_a, record_b, record_c, removes_a, removes_c,
};

#[test]
fn test_added_listener_waits_for_next_pass() {
    init_tracing();
    let registry = Registry::new();
    let channel = registry.create_channel("reentrant_add");
    ChannelSlot::set(&channel);
    channel.add_listener(ListenerRef::new(adds_late)).unwrap();

    channel.execute(true).unwrap();
    assert_eq!(Trail::take(), vec!["adds_late"]);
    assert_eq!(channel.len(), 2);

    channel.execute(true).unwrap();
    assert_eq!(Trail::take(), vec!["adds_late", "late"]);
}

#[test]
fn test_removed_listener_still_runs_this_pass() {
    init_tracing();
    let registry = Registry::new();
    let channel = registry.create_channel("reentrant_remove");
    ChannelSlot::set(&channel);
    channel.add_listener(ListenerRef::new(removes_c)).unwrap();
    channel.add_listener(ListenerRef::new(record_c)).unwrap();

    channel.execute(true).unwrap();
    assert_eq!(Trail::take(), vec!["removes_c", "C"]);

    channel.execute(true).unwrap();
    assert_eq!(Trail::take(), vec!["removes_c"]);
}

#[test]
fn test_round_start_scenario() {
    init_tracing();
    let registry = Registry::new();
    let channel = registry.create_channel("round_start");
    ChannelSlot::set(&channel);
    channel.add_listener(ListenerRef::new(record_a)).unwrap();
    channel.add_listener(ListenerRef::new(removes_a)).unwrap();

    channel.execute(true).unwrap();
    assert_eq!(Trail::take(), vec!["A", "removes_a"]);

    channel.execute(true).unwrap();
    assert_eq!(Trail::take(), vec!["removes_a"]);
}

#[test]
fn test_nested_execute_is_refused() {
    init_tracing();
    let channel = Arc::new(hookwire::Channel::new("nested"));
    ChannelSlot::set(&channel);
    channel.add_listener(ListenerRef::new(nested_execute)).unwrap();
    channel.add_listener(ListenerRef::new(record_b)).unwrap();

    let report = channel.execute(true).unwrap();

    assert_eq!(Trail::take(), vec!["nested_busy", "B"]);
    assert!(report.is_clean());
    // The refused nested pass could not touch the context.
    assert!(channel.with_context(|ctx| !ctx.has_error()).unwrap());
}
