use std::time::Duration;

use gale::server::state::{Registry, Signal};
use tokio::time::timeout;

#[test]
fn test_signal_starts_unstopped() {
    let signal = Signal::default();
    assert!(!signal.stopped());
}

#[test]
fn test_signal_stop_is_sticky() {
    let signal = Signal::default();
    signal.stop();
    assert!(signal.stopped());
    signal.stop();
    assert!(signal.stopped());
}

#[test]
fn test_registry_register_and_drop() {
    let registry = Registry::new();
    assert!(registry.is_empty());

    let guard = registry.register();
    assert_eq!(registry.len(), 1);

    let second = registry.register();
    assert_eq!(registry.len(), 2);

    drop(guard);
    assert_eq!(registry.len(), 1);
    drop(second);
    assert!(registry.is_empty());
}

#[tokio::test]
async fn test_registry_close_idle_notifies_idle_guards() {
    let registry = Registry::new();
    let idle = registry.register();

    assert_eq!(registry.close_idle(), 1);

    // The notification is buffered, so a guard that starts waiting after
    // the drain pass still resolves.
    timeout(Duration::from_millis(100), idle.closed())
        .await
        .expect("idle guard was not asked to close");
}

#[tokio::test]
async fn test_registry_close_idle_skips_busy_guards() {
    let registry = Registry::new();
    let idle = registry.register();
    let busy = registry.register();
    busy.set_busy(true);

    assert_eq!(registry.close_idle(), 1);

    timeout(Duration::from_millis(100), idle.closed())
        .await
        .expect("idle guard was not asked to close");
    assert!(
        timeout(Duration::from_millis(100), busy.closed())
            .await
            .is_err(),
        "busy guard must stay open"
    );
}

#[tokio::test]
async fn test_registry_close_idle_after_cycle_completes() {
    let registry = Registry::new();
    let guard = registry.register();
    guard.set_busy(true);

    assert_eq!(registry.close_idle(), 0);

    // Once the request cycle finishes the next drain pass catches it.
    guard.set_busy(false);
    assert_eq!(registry.close_idle(), 1);
}
