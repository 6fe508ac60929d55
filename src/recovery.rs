//! Recovery driver: unload a component, then reload it with the
//! configuration its parent holds for it.
//!
//! Failures are not retried here; they are returned to the health-check
//! loop or the status reactor, which log them and carry on.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info};

use crate::component::{resolve, ComponentHost, ComponentRef, Resolved};
use crate::error::RecoveryError;

#[derive(Clone)]
pub struct RecoveryDriver {
    host: Arc<dyn ComponentHost>,
}

impl RecoveryDriver {
    pub fn new(host: Arc<dyn ComponentHost>) -> Self {
        Self { host }
    }

    /// Locate `target` and reload it.
    ///
    /// Returns the tree position that was recovered. `NotFound` means no
    /// host call was made.
    pub async fn recover(&self, target: &ComponentRef) -> Result<Resolved, RecoveryError> {
        let resolved = resolve(self.host.as_ref(), target)
            .ok_or_else(|| RecoveryError::NotFound(target.to_string()))?;

        let config = self
            .host
            .child_config(resolved.parent, &resolved.key)
            .unwrap_or_else(|| {
                debug!(key = %resolved.key, "No stored config for component, reloading with null");
                Value::Null
            });

        info!(
            key = %resolved.key,
            parent = %resolved.parent,
            node = %resolved.node,
            "Reloading component"
        );

        self.host
            .unload(resolved.parent, &resolved.key)
            .await
            .map_err(|source| RecoveryError::Unload {
                key: resolved.key.clone(),
                source,
            })?;

        self.host
            .reload(resolved.parent, &resolved.key, config)
            .await
            .map_err(|source| RecoveryError::Reload {
                key: resolved.key.clone(),
                source,
            })?;

        Ok(resolved)
    }
}

impl std::fmt::Debug for RecoveryDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecoveryDriver").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::ComponentTree;
    use crate::host::{HostCall, MemoryHost};
    use serde_json::json;

    fn setup() -> (Arc<MemoryHost>, RecoveryDriver) {
        let host = Arc::new(MemoryHost::new());
        let driver = RecoveryDriver::new(host.clone());
        (host, driver)
    }

    #[tokio::test]
    async fn unloads_then_reloads_with_parent_config() {
        let (host, driver) = setup();
        let group = host.add_component(host.root(), "group:g1", json!({}));
        let adapter = host.add_component(group, "adapter-onebot:x1", json!({"selfId": "123"}));

        let resolved = driver.recover(&ComponentRef::Handle(adapter)).await.unwrap();
        assert_eq!(resolved.parent, group);
        assert_eq!(resolved.key, "adapter-onebot:x1");

        assert_eq!(
            host.calls(),
            vec![
                HostCall::Unload {
                    parent: group,
                    key: "adapter-onebot:x1".to_string(),
                },
                HostCall::Reload {
                    parent: group,
                    key: "adapter-onebot:x1".to_string(),
                    config: json!({"selfId": "123"}),
                },
            ]
        );
    }

    #[tokio::test]
    async fn recover_by_name() {
        let (host, driver) = setup();
        host.add_component(host.root(), "adapter-discord:d9", json!({"token": "abc"}));
        let resolved = driver.recover(&ComponentRef::from("adapter-discord")).await.unwrap();
        assert_eq!(resolved.parent, host.root());
        assert_eq!(host.reloads(), vec![(host.root(), "adapter-discord:d9".to_string())]);
    }

    #[tokio::test]
    async fn not_found_makes_no_host_calls() {
        let (host, driver) = setup();
        host.add_component(host.root(), "other", json!(null));
        let err = driver.recover(&ComponentRef::from("missing")).await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "Not found: 'missing'");
        assert!(host.calls().is_empty());
    }

    #[tokio::test]
    async fn unload_failure_skips_reload() {
        let (host, driver) = setup();
        let adapter = host.add_component(host.root(), "adapter-qq", json!({}));
        host.set_fail_unload(true);
        let err = driver.recover(&ComponentRef::Handle(adapter)).await.unwrap_err();
        assert!(matches!(err, RecoveryError::Unload { .. }));
        assert!(host.reloads().is_empty());
    }

    #[tokio::test]
    async fn reload_failure_is_reported() {
        let (host, driver) = setup();
        let adapter = host.add_component(host.root(), "adapter-qq", json!({}));
        host.set_fail_reload(true);
        let err = driver.recover(&ComponentRef::Handle(adapter)).await.unwrap_err();
        assert!(matches!(err, RecoveryError::Reload { ref key, .. } if key == "adapter-qq"));
        assert_eq!(host.unloads().len(), 1);
    }

    #[tokio::test]
    async fn stale_handle_after_reload_is_not_found() {
        let (host, driver) = setup();
        let adapter = host.add_component(host.root(), "adapter-qq", json!({}));
        driver.recover(&ComponentRef::Handle(adapter)).await.unwrap();
        let err = driver.recover(&ComponentRef::Handle(adapter)).await.unwrap_err();
        assert!(err.is_not_found());
        assert!(host.children(host.root()).is_some());
    }
}
