/*!
 * GovernorManager: registry and refresh loop for characteristic governors
 */

use crate::config::Config;
use crate::error::{Error, Result};
use gatt_governor_core::{Address, Characteristic, CharacteristicGovernor, Resolver};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Outcome of one refresh pass over every registered governor
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefreshSummary {
    /// Governors holding a binding after the pass
    pub ready: usize,
    /// Governors whose object could not be reached
    pub pending: usize,
    /// Governors disposed because their binding was considered lost
    pub reset: usize,
}

/// Owning manager for characteristic governors
///
/// Responsibilities:
/// - Maintain one governor per address, created lazily
/// - Detect lost bindings (repeated transport errors) and dispose them so
///   the next use re-resolves
/// - Periodically refresh every governor
///
/// # Example
///
/// ```rust,no_run
/// use gatt_governor::{Config, GovernorManager};
/// use gatt_governor_core::testing::MockResolver;
/// use gatt_governor_core::Address;
/// use std::sync::Arc;
///
/// # async fn example() -> gatt_governor::Result<()> {
/// let manager = GovernorManager::new(Arc::new(MockResolver::new()), &Config::default());
///
/// let address = Address::new("AA:BB:CC:DD:EE:FF", "180f", "2a19");
/// let governor = manager.governor(&address).await;
/// let level = governor.read().await?;
/// # Ok(())
/// # }
/// ```
pub struct GovernorManager {
    resolver: Arc<dyn Resolver<dyn Characteristic>>,

    /// Consecutive transport errors that mark a binding as lost
    transport_error_threshold: u32,

    refresh_interval: Duration,

    /// Registered governors (Address -> Governor)
    governors: RwLock<HashMap<Address, Arc<CharacteristicGovernor>>>,
}

impl GovernorManager {
    pub fn new(resolver: Arc<dyn Resolver<dyn Characteristic>>, config: &Config) -> Self {
        Self {
            resolver,
            transport_error_threshold: config.transport_error_threshold,
            refresh_interval: config.refresh_interval(),
            governors: RwLock::new(HashMap::new()),
        }
    }

    /// Create a manager with every governor listed in `config` registered
    pub async fn from_config(
        resolver: Arc<dyn Resolver<dyn Characteristic>>,
        config: &Config,
    ) -> Result<Self> {
        config.validate()?;
        let manager = Self::new(resolver, config);
        for address in &config.governors {
            manager.governor(address).await;
        }
        Ok(manager)
    }

    /// Governor for `address`, registering it on first request.
    ///
    /// This does not bind anything; binding is lazy and happens on first use.
    pub async fn governor(&self, address: &Address) -> Arc<CharacteristicGovernor> {
        {
            let governors = self.governors.read().await;
            if let Some(governor) = governors.get(address) {
                return governor.clone();
            }
        }

        let mut governors = self.governors.write().await;
        governors
            .entry(address.clone())
            .or_insert_with(|| {
                info!("Registering governor: {}", address);
                Arc::new(CharacteristicGovernor::characteristic(
                    address.clone(),
                    self.resolver.clone(),
                ))
            })
            .clone()
    }

    /// Governor for `address` if one is registered
    pub async fn get(&self, address: &Address) -> Option<Arc<CharacteristicGovernor>> {
        self.governors.read().await.get(address).cloned()
    }

    /// All registered governors
    pub async fn governors(&self) -> Vec<Arc<CharacteristicGovernor>> {
        self.governors.read().await.values().cloned().collect()
    }

    /// Release the binding of one governor but keep it registered.
    ///
    /// Useful when the transport reports a disconnect; the next use
    /// re-resolves.
    pub async fn reset_governor(&self, address: &Address) -> Result<()> {
        let governor = self
            .get(address)
            .await
            .ok_or_else(|| Error::GovernorNotFound(address.clone()))?;
        governor.dispose().await;
        Ok(())
    }

    /// Dispose a governor and remove it from the registry
    pub async fn dispose_governor(&self, address: &Address) -> Result<()> {
        info!("Disposing governor: {}", address);

        let governor = self
            .governors
            .write()
            .await
            .remove(address)
            .ok_or_else(|| Error::GovernorNotFound(address.clone()))?;
        governor.dispose().await;
        Ok(())
    }

    /// Dispose every governor and clear the registry
    pub async fn dispose_all(&self) {
        info!("Disposing all governors");

        let drained: Vec<_> = self.governors.write().await.drain().collect();
        for (_, governor) in drained {
            governor.dispose().await;
        }
    }

    /// One refresh pass over every registered governor
    pub async fn update_all(&self) -> RefreshSummary {
        let mut summary = RefreshSummary::default();

        for governor in self.governors().await {
            let errors = governor.transport_errors();
            if errors >= self.transport_error_threshold && governor.is_ready().await {
                warn!(
                    "Binding of {} considered lost after {} transport errors",
                    governor.address(),
                    errors
                );
                governor.dispose().await;
                summary.reset += 1;
            }

            if governor.update().await {
                summary.ready += 1;
            } else {
                summary.pending += 1;
            }
        }

        debug!(
            "Refresh pass: {} ready, {} pending, {} reset",
            summary.ready, summary.pending, summary.reset
        );
        summary
    }

    /// Run [`GovernorManager::update_all`] on a fixed interval until the
    /// returned handle is aborted
    pub fn spawn_refresh(self: &Arc<Self>) -> JoinHandle<()> {
        let manager = Arc::clone(self);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(manager.refresh_interval);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                manager.update_all().await;
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gatt_governor_core::testing::{MockCharacteristic, MockResolver};
    use gatt_governor_core::CharacteristicFlags;

    fn address(characteristic: &str) -> Address {
        Address::new("AB:CD:EF:01:23:45", "180d", characteristic)
    }

    #[tokio::test]
    async fn test_governor_is_created_once() {
        let manager = GovernorManager::new(Arc::new(MockResolver::new()), &Config::default());

        let a = manager.governor(&address("2a37")).await;
        let b = manager.governor(&address("2a37")).await;
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(manager.governors().await.len(), 1);
    }

    #[tokio::test]
    async fn test_dispose_unknown_governor() {
        let manager = GovernorManager::new(Arc::new(MockResolver::new()), &Config::default());
        let result = manager.dispose_governor(&address("2a38")).await;
        assert!(matches!(result, Err(Error::GovernorNotFound(_))));
        let result = manager.reset_governor(&address("2a38")).await;
        assert!(matches!(result, Err(Error::GovernorNotFound(_))));
    }

    #[tokio::test]
    async fn test_update_all_counts_pending_and_ready() {
        let resolver = Arc::new(MockResolver::new());
        resolver.insert(
            address("2a37"),
            Arc::new(MockCharacteristic::new(CharacteristicFlags::NOTIFY)),
        );
        let manager = GovernorManager::new(resolver, &Config::default());
        manager.governor(&address("2a37")).await;
        manager.governor(&address("2a39")).await;

        let summary = manager.update_all().await;
        assert_eq!(
            summary,
            RefreshSummary {
                ready: 1,
                pending: 1,
                reset: 0
            }
        );
    }
}
