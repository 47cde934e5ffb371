//! Unit tests for the store module.
//! No filesystem, timing, or external dependencies.

#![allow(clippy::unwrap_used, clippy::panic)]


use std::{
    panic::{self, AssertUnwindSafe},
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};

use serde_json::json;

use crate::{
    PathSelector, Value,
    store::{ChangeKind, Store, StoreChange, StoreError},
};

fn sel(path: &str) -> PathSelector {
    PathSelector::parse(path).unwrap()
}

fn counting(store: &Store, path: &str) -> Arc<AtomicUsize> {
    let count = Arc::new(AtomicUsize::new(0));
    let inner = Arc::clone(&count);
    store.subscribe(&sel(path), move |_| {
        inner.fetch_add(1, Ordering::SeqCst);
    });
    count
}

fn profile_store() -> Store {
    Store::new(Value::from(json!({
        "user": {"name": "Ann", "age": 30},
        "theme": "dark"
    })))
}

#[test]
fn scoped_write_reaches_only_matching_listeners() {
    let store = profile_store();
    let name = counting(&store, "user.name");
    let theme = counting(&store, "theme");

    let report = store.write_at(&sel("user.name"), "Bea").unwrap();

    assert_eq!(name.load(Ordering::SeqCst), 1);
    assert_eq!(theme.load(Ordering::SeqCst), 0);
    assert_eq!(report.delivered, 1);
    assert_eq!(store.read(&sel("user.name")), Some(Value::from("Bea")));
}

#[test]
fn write_then_read_round_trip() {
    let store = Store::new(Value::from(json!({"x": {"y": 0}})));

    store.write_at(&sel("x.y"), 5).unwrap();

    assert_eq!(sel("x.y").read(&store.current()), Some(Value::from(5)));
}

#[test]
fn replace_reaches_every_listener_once() {
    let store = profile_store();
    let a = counting(&store, "a");
    let zq = counting(&store, "z.q");
    let root = counting(&store, "");

    let report = store.replace(Value::from(json!({"a": 1})));

    assert_eq!(a.load(Ordering::SeqCst), 1);
    assert_eq!(zq.load(Ordering::SeqCst), 1);
    assert_eq!(root.load(Ordering::SeqCst), 1);
    assert_eq!(report.delivered, 3);
    assert_eq!(store.current(), Value::from(json!({"a": 1})));
}

#[test]
fn replace_with_sees_old_root() {
    let store = Store::new(Value::from(json!({"count": 1})));

    let _ = store.replace_with(|old| {
        let count = sel("count").read(old).and_then(|v| v.as_i64()).unwrap_or(0);
        Value::from(json!({"count": count + 1}))
    });

    assert_eq!(store.read(&sel("count")), Some(Value::from(2)));
}

#[test]
fn failing_replacer_leaves_store_untouched() {
    let store = profile_store();
    let calls = counting(&store, "theme");
    let before = store.version();

    let result = store.try_replace_with(|_| Err::<Value, _>("boom"));

    assert_eq!(result.unwrap_err(), "boom");
    assert_eq!(store.version(), before);
    assert_eq!(store.current(), profile_store().current());
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn panicking_replacer_does_not_poison_the_store() {
    let store = profile_store();

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        let _ = store.replace_with(|_| panic!("replacer exploded"));
    }));
    assert!(outcome.is_err());

    assert_eq!(store.current(), profile_store().current());
    store.write_at(&sel("theme"), "light").unwrap();
    assert_eq!(store.read(&sel("theme")), Some(Value::from("light")));
}

#[test]
fn version_advances_on_every_successful_mutation() {
    let store = profile_store();
    let v0 = store.version();

    store.write_at(&sel("theme"), "light").unwrap();
    let v1 = store.version();
    let _ = store.replace(Value::mapping());
    let v2 = store.version();

    assert!(v0 < v1);
    assert!(v1 < v2);
}

#[test]
fn failed_write_keeps_version_and_notifies_nobody() {
    let store = profile_store();
    let everything = counting(&store, "");
    let before = store.version();

    let err = store.write_at(&sel("settings.volume"), 3).unwrap_err();
    assert!(matches!(err, StoreError::BrokenPath { .. }));

    let err = store.write_at(&PathSelector::root(), 3).unwrap_err();
    assert!(matches!(err, StoreError::InvalidSelector { .. }));

    assert_eq!(store.version(), before);
    assert_eq!(everything.load(Ordering::SeqCst), 0);
}

#[test]
fn unsubscribe_stops_delivery_and_prunes() {
    let store = profile_store();
    let count = Arc::new(AtomicUsize::new(0));
    let inner = Arc::clone(&count);
    let handle = store.subscribe(&sel("user.name"), move |_| {
        inner.fetch_add(1, Ordering::SeqCst);
    });
    assert_eq!(store.listener_node_count(), 3);

    assert!(store.unsubscribe(&sel("user.name"), handle));
    store.write_at(&sel("user.name"), "Bea").unwrap();

    assert_eq!(count.load(Ordering::SeqCst), 0);
    assert_eq!(store.listener_count(), 0);
    assert_eq!(store.listener_node_count(), 1);
}

#[test]
fn unsubscribe_unknown_pair_is_noop() {
    let store = profile_store();
    let handle = store.subscribe(&sel("theme"), |_| {});

    assert!(!store.unsubscribe(&sel("user"), handle));
    assert!(store.unsubscribe(&sel("theme"), handle));
    assert!(!store.unsubscribe(&sel("theme"), handle));
}

#[test]
fn listeners_observe_post_write_root() {
    let store = profile_store();
    let seen = Arc::new(Mutex::new(None));

    let reader = store.clone();
    let slot = Arc::clone(&seen);
    store.subscribe(&sel("user"), move |_| {
        *slot.lock().unwrap() = reader.read(&sel("user.name"));
    });

    store.write_at(&sel("user.name"), "Bea").unwrap();

    assert_eq!(*seen.lock().unwrap(), Some(Value::from("Bea")));
}

#[test]
fn listener_may_write_back_into_store() {
    let store = Store::new(Value::from(json!({"input": 0, "derived": 0})));

    let writer = store.clone();
    store.subscribe(&sel("input"), move |change| {
        if let Some(value) = change.value().and_then(Value::as_i64) {
            writer.write_at(&sel("derived"), value * 2).unwrap();
        }
    });

    store.write_at(&sel("input"), 21).unwrap();

    assert_eq!(store.read(&sel("derived")), Some(Value::from(42)));
}

#[test]
fn change_payload_describes_the_write() {
    let store = profile_store();
    let received = Arc::new(Mutex::new(Vec::<StoreChange>::new()));
    let sink = Arc::clone(&received);
    store.subscribe(&sel("user"), move |change| sink.lock().unwrap().push(change.clone()));

    store.write_at(&sel("user.age"), 31).unwrap();
    let _ = store.replace(Value::mapping());

    let received = received.lock().unwrap();
    assert_eq!(received.len(), 2);
    assert_eq!(received[0].path, sel("user.age"));
    assert_eq!(
        received[0].kind,
        ChangeKind::Write {
            value: Value::from(31)
        }
    );
    assert!(received[1].is_replace());
    assert!(received[1].path.is_root());
    assert!(received[0].version < received[1].version);
}

#[test]
fn failing_listener_is_reported_and_isolated() {
    let store = profile_store();
    store.subscribe(&sel("theme"), |_| panic!("subscriber bug"));
    let healthy = counting(&store, "theme");

    let report = store.write_at(&sel("theme"), "light").unwrap();

    assert_eq!(healthy.load(Ordering::SeqCst), 1);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].path, "theme");
    assert_eq!(store.read(&sel("theme")), Some(Value::from("light")));
}

#[test]
fn scoped_subscription_unsubscribes_on_drop() {
    let store = profile_store();
    let count = Arc::new(AtomicUsize::new(0));
    let inner = Arc::clone(&count);

    let guard = store.subscribe_scoped(&sel("theme"), move |_| {
        inner.fetch_add(1, Ordering::SeqCst);
    });
    store.write_at(&sel("theme"), "light").unwrap();
    drop(guard);
    store.write_at(&sel("theme"), "dark").unwrap();

    assert_eq!(count.load(Ordering::SeqCst), 1);
    assert_eq!(store.listener_node_count(), 1);
}

#[test]
fn scoped_subscription_outliving_store_is_harmless() {
    let store = profile_store();
    let guard = store.subscribe_scoped(&sel("theme"), |_| {});

    drop(store);
    guard.cancel();
}

#[test]
fn clones_share_state() {
    let store = profile_store();
    let other = store.clone();
    let count = counting(&other, "theme");

    store.write_at(&sel("theme"), "light").unwrap();

    assert_eq!(other.read(&sel("theme")), Some(Value::from("light")));
    assert_eq!(count.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn watch_streams_matching_changes() {
    use futures::StreamExt;

    let store = profile_store();
    let mut changes = store.watch(&sel("user"));

    store.write_at(&sel("user.name"), "Bea").unwrap();
    store.write_at(&sel("theme"), "light").unwrap();
    store.write_at(&sel("user.age"), 31).unwrap();

    let first = changes.next().await.unwrap();
    let second = changes.next().await.unwrap();
    assert_eq!(first.path, sel("user.name"));
    assert_eq!(second.path, sel("user.age"));

    drop(changes);
    assert_eq!(store.listener_count(), 0);
}
