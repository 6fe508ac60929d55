//! Component resolution and recovery against a nested in-memory tree.

use std::sync::Arc;

use serde_json::json;

use adapter_sentinel::component::{resolve_by_handle, resolve_by_name};
use adapter_sentinel::host::MemoryHost;
use adapter_sentinel::{ComponentRef, ComponentTree, NodeHandle, RecoveryDriver, RecoveryError};

/// root
/// ├── group:ops
/// │   ├── adapter-onebot:a1
/// │   └── group/inner:x
/// │       └── adapter-discord:d1
/// └── adapter-onebot:b2
struct Tree {
    host: Arc<MemoryHost>,
    ops: NodeHandle,
    a1: NodeHandle,
    inner: NodeHandle,
    d1: NodeHandle,
    b2: NodeHandle,
}

fn tree() -> Tree {
    let host = Arc::new(MemoryHost::new());
    let root = host.root();
    let ops = host.add_component(root, "group:ops", json!({}));
    let a1 = host.add_component(ops, "adapter-onebot:a1", json!({"selfId": "1"}));
    let inner = host.add_component(ops, "group/inner:x", json!({"label": "inner"}));
    let d1 = host.add_component(inner, "adapter-discord:d1", json!({"token": "d"}));
    let b2 = host.add_component(root, "adapter-onebot:b2", json!({"selfId": "2"}));
    Tree {
        host,
        ops,
        a1,
        inner,
        d1,
        b2,
    }
}

#[test]
fn first_pre_order_match_wins_over_shallower_sibling() {
    let t = tree();
    let found = resolve_by_name(t.host.as_ref(), t.host.root(), "adapter-onebot").unwrap();
    assert_eq!(found.node, t.a1);
    assert_eq!(found.parent, t.ops);
    assert_eq!(found.key, "adapter-onebot:a1");
}

#[test]
fn deep_node_resolves_with_its_direct_parent() {
    let t = tree();
    let found = resolve_by_handle(t.host.as_ref(), t.host.root(), t.d1).unwrap();
    assert_eq!(found.parent, t.inner);
    assert_eq!(found.key, "adapter-discord:d1");

    let by_name = resolve_by_name(t.host.as_ref(), t.host.root(), "adapter-discord").unwrap();
    assert_eq!(by_name, found);
}

#[test]
fn instance_suffix_is_part_of_the_logical_name() {
    let t = tree();
    assert!(resolve_by_name(t.host.as_ref(), t.host.root(), "group").is_some());
    let inner = resolve_by_name(t.host.as_ref(), t.host.root(), "group/inner").unwrap();
    assert_eq!(inner.node, t.inner);
}

#[test]
fn torn_down_subtree_is_skipped_without_error() {
    let t = tree();
    t.host.tear_down(t.ops);

    assert!(resolve_by_handle(t.host.as_ref(), t.host.root(), t.d1).is_none());
    let found = resolve_by_name(t.host.as_ref(), t.host.root(), "adapter-onebot").unwrap();
    assert_eq!(found.node, t.b2);
}

#[test]
fn search_can_start_below_the_root() {
    let t = tree();
    assert!(resolve_by_name(t.host.as_ref(), t.inner, "adapter-onebot").is_none());
    assert!(resolve_by_handle(t.host.as_ref(), t.ops, t.d1).is_some());
}

#[tokio::test]
async fn recovery_of_nested_adapter_keeps_siblings() {
    let t = tree();
    let driver = RecoveryDriver::new(t.host.clone());

    let resolved = driver.recover(&ComponentRef::Handle(t.d1)).await.unwrap();
    assert_eq!(resolved.parent, t.inner);
    assert_eq!(
        t.host.child_config(t.inner, "adapter-discord:d1"),
        Some(json!({"token": "d"}))
    );

    let children = t.host.children(t.inner).unwrap();
    assert_eq!(children.len(), 1);
    assert_ne!(children[0].1, t.d1, "reload must allocate a fresh node");
    assert_eq!(t.host.children(t.ops).unwrap().len(), 2);
}

#[tokio::test]
async fn stale_handle_after_reload_is_not_found() {
    let t = tree();
    let driver = RecoveryDriver::new(t.host.clone());
    driver.recover(&ComponentRef::Handle(t.b2)).await.unwrap();

    let err = driver
        .recover(&ComponentRef::Handle(t.b2))
        .await
        .unwrap_err();
    assert!(matches!(err, RecoveryError::NotFound(_)));
    assert_eq!(t.host.reloads().len(), 1);
}
