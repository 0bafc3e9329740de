//! Characteristic governor: notification wiring plus read/write access

use crate::address::Address;
use crate::error::{GovernorError, Result, TransportError};
use crate::flags::CharacteristicFlags;
use crate::governor::{Bindable, Governor, ObjectKind};
use crate::listener::{ListenerSlot, ValueListener};
use crate::relay::NotificationRelay;
use crate::transport::{Characteristic, Notification, Resolver};
use async_trait::async_trait;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

/// Governor specialised for GATT characteristics
pub type CharacteristicGovernor = Governor<CharacteristicBinding>;

/// Init/dispose strategy for characteristics.
///
/// Owns the listener slot (which outlives bindings) and the relay (which
/// lives exactly as long as one binding's notifications).
#[derive(Debug, Default)]
pub struct CharacteristicBinding {
    listeners: Arc<ListenerSlot>,
    relay: Mutex<Option<Arc<NotificationRelay>>>,
}

impl CharacteristicBinding {
    pub fn new() -> Self {
        Self::default()
    }

    /// Relay currently installed for dispatch, if notifications are on
    pub fn relay(&self) -> Option<Arc<NotificationRelay>> {
        self.relay_cell().clone()
    }

    pub fn listeners(&self) -> &Arc<ListenerSlot> {
        &self.listeners
    }

    /// Close and drop the installed relay, if any
    fn close_relay(&self) {
        if let Some(relay) = self.relay_cell().take() {
            relay.close();
        }
    }

    fn relay_cell(&self) -> MutexGuard<'_, Option<Arc<NotificationRelay>>> {
        self.relay.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl Bindable for CharacteristicBinding {
    type Object = dyn Characteristic;

    fn kind(&self) -> ObjectKind {
        ObjectKind::Characteristic
    }

    async fn init(
        &self,
        address: &Address,
        characteristic: &Arc<dyn Characteristic>,
    ) -> std::result::Result<(), TransportError> {
        self.close_relay();

        let flags = characteristic.flags().await?;
        if !flags.can_notify() {
            debug!(%address, flags = ?flags.names(), "Characteristic cannot notify");
            return Ok(());
        }

        info!(%address, "Enabling characteristic notifications");
        let relay = Arc::new(NotificationRelay::new(
            address.clone(),
            Arc::clone(&self.listeners),
        ));
        if characteristic.is_notifying().await? {
            debug!(%address, "Characteristic already notifying, reinstalling relay only");
        } else {
            let sink: Arc<dyn Notification> = relay.clone();
            characteristic.enable_value_notifications(sink).await?;
        }
        *self.relay_cell() = Some(relay);
        Ok(())
    }

    async fn dispose(&self, address: &Address, characteristic: &Arc<dyn Characteristic>) {
        info!(%address, "Disabling characteristic notifications");
        match characteristic.is_notifying().await {
            Ok(true) => {
                if let Err(e) = characteristic.disable_value_notifications().await {
                    warn!(%address, error = %e, "Could not disable characteristic notifications");
                }
            }
            Ok(false) => {}
            Err(e) => {
                debug!(%address, error = %e, "Notification state unavailable during dispose");
            }
        }
        // the stale object may still hold the relay
        self.close_relay();
    }
}

impl Governor<CharacteristicBinding> {
    /// Create an unbound characteristic governor
    pub fn characteristic(address: Address, resolver: Arc<dyn Resolver<dyn Characteristic>>) -> Self {
        Governor::new(address, resolver, CharacteristicBinding::new())
    }

    /// Capabilities of the bound characteristic, queried fresh every time
    pub async fn flags(&self) -> Result<CharacteristicFlags> {
        let characteristic = self.bound_object().await?;
        characteristic
            .flags()
            .await
            .map_err(|e| self.transport_failure(e))
    }

    pub async fn is_notifiable(&self) -> Result<bool> {
        Ok(self.flags().await?.can_notify())
    }

    pub async fn is_writable(&self) -> Result<bool> {
        Ok(self.flags().await?.can_write())
    }

    pub async fn is_readable(&self) -> Result<bool> {
        Ok(self.flags().await?.can_read())
    }

    /// Whether the peripheral currently has notifications enabled
    pub async fn is_notifying(&self) -> Result<bool> {
        let characteristic = self.bound_object().await?;
        characteristic
            .is_notifying()
            .await
            .map_err(|e| self.transport_failure(e))
    }

    /// Read the raw value
    pub async fn read(&self) -> Result<Vec<u8>> {
        let characteristic = self.required_object().await?;
        let value = characteristic
            .read_value()
            .await
            .map_err(|e| self.transport_failure(e))?;
        self.touch();
        Ok(value)
    }

    /// Write a raw value; returns whether the peripheral acknowledged it.
    ///
    /// Only an acknowledged write refreshes the last-updated time.
    pub async fn write(&self, data: &[u8]) -> Result<bool> {
        let characteristic = self.required_object().await?;
        let acknowledged = characteristic
            .write_value(data)
            .await
            .map_err(|e| self.transport_failure(e))?;
        if acknowledged {
            self.touch();
        } else {
            debug!(address = %self.address(), "Write was not acknowledged");
        }
        Ok(acknowledged)
    }

    /// Register the listener, replacing any previous one.
    ///
    /// Legal before a binding exists; takes effect on the next delivery.
    pub fn add_value_listener(&self, listener: Arc<dyn ValueListener>) {
        self.strategy().listeners().set(listener);
    }

    /// Clear the listener slot
    pub fn remove_value_listener(&self) {
        self.strategy().listeners().clear();
    }

    pub fn has_listener(&self) -> bool {
        !self.strategy().listeners().is_empty()
    }

    /// Whether a notification relay is installed for the current binding
    pub fn relay_installed(&self) -> bool {
        self.strategy().relay().is_some()
    }

    async fn required_object(&self) -> Result<Arc<dyn Characteristic>> {
        self.try_bound_object()
            .await?
            .ok_or_else(|| GovernorError::NotBound(self.address().clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockCharacteristic, MockResolver};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn address() -> Address {
        Address::new("C0:FF:EE:00:00:01", "180f", "2a19")
    }

    fn setup(flags: CharacteristicFlags) -> (CharacteristicGovernor, Arc<MockCharacteristic>) {
        let characteristic = Arc::new(MockCharacteristic::new(flags));
        let resolver = Arc::new(MockResolver::new());
        resolver.insert(address(), characteristic.clone());
        (
            CharacteristicGovernor::characteristic(address(), resolver),
            characteristic,
        )
    }

    #[tokio::test]
    async fn test_init_enables_notifications_once() {
        let (governor, characteristic) =
            setup(CharacteristicFlags::READ | CharacteristicFlags::NOTIFY);

        for _ in 0..4 {
            governor.read().await.unwrap();
        }

        assert_eq!(characteristic.enable_calls(), 1);
        assert!(governor.relay_installed());
        assert!(characteristic.has_subscriber());
    }

    #[tokio::test]
    async fn test_indicate_counts_as_notifiable() {
        let (governor, characteristic) = setup(CharacteristicFlags::INDICATE);
        assert!(governor.is_notifiable().await.unwrap());
        assert_eq!(characteristic.enable_calls(), 1);
    }

    #[tokio::test]
    async fn test_listener_registered_before_binding_receives_events() {
        let (governor, characteristic) = setup(CharacteristicFlags::NOTIFY);
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        governor.add_value_listener(Arc::new(move |value: &[u8]| -> anyhow::Result<()> {
            assert_eq!(value.to_vec(), vec![0x42]);
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }));

        governor.flags().await.unwrap();
        assert!(characteristic.emit(&[0x42]));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unacknowledged_write_keeps_last_updated() {
        let (governor, characteristic) = setup(CharacteristicFlags::WRITE);
        characteristic.set_write_ack(false);

        assert!(!governor.write(&[1, 2, 3]).await.unwrap());
        assert!(governor.last_updated().is_none());
        assert_eq!(characteristic.written(), vec![vec![1, 2, 3]]);
    }

    #[tokio::test]
    async fn test_dispose_tolerates_transport_failure() {
        let (governor, characteristic) = setup(CharacteristicFlags::NOTIFY);
        governor.flags().await.unwrap();

        characteristic.set_connected(false);
        governor.dispose().await;

        assert!(!governor.relay_installed());
        assert!(!governor.is_ready().await);
    }
}
