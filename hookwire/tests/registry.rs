//! Registry lookup, bulk subscription and teardown.

use hookwire::{
    AddressPolicy, CallContext, Channel, DispatchError, ListenerRef, Registry, RegistryConfig,
    global,
    testing::{ChannelSlot, Trail},
};
use std::sync::Arc;

mod common;
use common::{init_tracing, record_a, record_b};

#[test]
fn test_duplicate_names_resolve_first_match() {
    init_tracing();
    let registry = Registry::new();
    let first = registry.create_channel("spawn");
    let second = registry.create_channel("spawn");
    assert!(!Arc::ptr_eq(&first, &second));

    let found = registry.find_channel("spawn").unwrap();
    assert!(Arc::ptr_eq(&found, &first));

    registry.release_channel(first);
    let found = registry.find_channel("spawn").unwrap();
    assert!(Arc::ptr_eq(&found, &second));
}

#[test]
fn test_duplicate_name_warning_keeps_permissive_create() {
    init_tracing();
    let registry =
        Registry::with_config(RegistryConfig::new().with_duplicate_name_warning(true));
    registry.create_channel("dup");
    registry.create_channel("dup");
    assert_eq!(registry.len(), 2);
}

#[test]
fn test_lookup_is_exact() {
    init_tracing();
    let registry = Registry::new();
    registry.create_channel("Round");
    assert!(registry.find_channel("round").is_none());
    assert!(registry.find_channel("Round ").is_none());
    assert!(registry.find_channel("Round").is_some());
}

#[test]
fn test_try_add_and_remove_by_name() {
    init_tracing();
    let registry = Registry::new();
    let channel = registry.create_channel("tick");

    assert!(registry.try_add_function("tick", ListenerRef::new(record_a)));
    assert!(registry.try_add_function("tick", ListenerRef::new(record_b)));
    assert!(!registry.try_add_function("tick", ListenerRef::null()));
    assert_eq!(channel.len(), 2);

    assert!(registry.try_remove_function("tick", ListenerRef::new(record_a)));
    assert!(!registry.try_remove_function("tick", ListenerRef::new(record_a)));

    channel.execute(true).unwrap();
    assert_eq!(Trail::take(), vec!["B"]);
}

#[test]
fn test_try_functions_never_create_channels() {
    init_tracing();
    let registry = Registry::new();
    assert!(!registry.try_add_function("missing", ListenerRef::new(record_a)));
    assert!(!registry.try_remove_function("missing", ListenerRef::new(record_a)));
    assert!(registry.is_empty());
}

#[test]
fn test_release_detaches_handle() {
    init_tracing();
    let registry = Registry::new();
    let channel = registry.create_channel("gone");
    channel.add_listener(ListenerRef::new(record_a)).unwrap();

    registry.release_channel(Arc::clone(&channel));
    registry.release_channel(None::<Arc<Channel>>);

    assert!(!registry.contains(&channel));
    assert!(registry.find_channel("gone").is_none());
    assert_eq!(
        channel.execute(true),
        Err(DispatchError::Released("gone".to_string()))
    );
    assert!(Trail::take().is_empty());

    // Releasing an already released handle only warns.
    registry.release_channel(channel);
}

#[test]
fn test_clear_all_callbacks() {
    init_tracing();
    let registry = Registry::new();
    let a = registry.create_channel("a");
    let b = registry.create_channel("b");

    registry.clear_all_callbacks();

    assert!(registry.is_empty());
    assert!(a.is_released() && b.is_released());
    assert!(registry.channel_names().is_empty());
    registry.clear_all_callbacks();
}

#[test]
fn test_registry_policy_applies_to_channels() {
    init_tracing();
    let policy = AddressPolicy::new().with_address_floor(usize::MAX);
    let registry = Registry::with_config(RegistryConfig::new().with_policy(policy));
    let channel = registry.create_channel("strict");

    assert!(!registry.try_add_function("strict", ListenerRef::new(record_a)));
    assert!(channel.is_empty());
}

#[test]
fn test_global_registry() {
    init_tracing();
    let channel = hookwire::global().create_channel("global_registry_test");
    let found = hookwire::global()
        .find_channel("global_registry_test")
        .unwrap();
    assert!(Arc::ptr_eq(&channel, &found));
    hookwire::global().release_channel(channel);
    assert!(
        hookwire::global()
            .find_channel("global_registry_test")
            .is_none()
    );
}

fn releases_own_channel(ctx: &mut CallContext) {
    ctx.set_result(77_u32).unwrap();
    global().release_channel(ChannelSlot::get());
}

#[test]
fn test_listener_releasing_its_channel() {
    init_tracing();
    let channel = global().create_channel("releases_itself");
    ChannelSlot::set(&channel);
    channel.add_listener(ListenerRef::new(releases_own_channel)).unwrap();
    channel.add_listener(ListenerRef::new(record_b)).unwrap();
    channel.with_context(|ctx| ctx.push_arg(3_u32)).unwrap().unwrap();

    let report = channel.execute(false).unwrap();

    assert_eq!(report.invoked, 2);
    assert_eq!(Trail::take(), vec!["B"]);
    assert!(!global().contains(&channel));
    assert!(channel.with_context(|ctx| ctx.is_zeroed()).unwrap());
    assert_eq!(
        channel.execute(false),
        Err(DispatchError::Released("releases_itself".to_string()))
    );
}
