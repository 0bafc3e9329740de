//! In-memory transport doubles
//!
//! Used by this crate's tests and by downstream crates that need a
//! characteristic without a radio.

use crate::address::Address;
use crate::error::TransportError;
use crate::flags::CharacteristicFlags;
use crate::transport::{Characteristic, Notification, Resolver};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Scriptable characteristic that records every call made against it
pub struct MockCharacteristic {
    flags: Mutex<CharacteristicFlags>,
    value: Mutex<Vec<u8>>,
    written: Mutex<Vec<Vec<u8>>>,
    subscriber: Mutex<Option<Arc<dyn Notification>>>,
    notifying: AtomicBool,
    connected: AtomicBool,
    write_ack: AtomicBool,
    enable_calls: AtomicUsize,
    disable_calls: AtomicUsize,
    read_calls: AtomicUsize,
}

impl MockCharacteristic {
    pub fn new(flags: CharacteristicFlags) -> Self {
        Self {
            flags: Mutex::new(flags),
            value: Mutex::new(Vec::new()),
            written: Mutex::new(Vec::new()),
            subscriber: Mutex::new(None),
            notifying: AtomicBool::new(false),
            connected: AtomicBool::new(true),
            write_ack: AtomicBool::new(true),
            enable_calls: AtomicUsize::new(0),
            disable_calls: AtomicUsize::new(0),
            read_calls: AtomicUsize::new(0),
        }
    }

    /// Value returned by subsequent reads
    pub fn with_value(self, value: impl Into<Vec<u8>>) -> Self {
        *lock(&self.value) = value.into();
        self
    }

    pub fn set_value(&self, value: impl Into<Vec<u8>>) {
        *lock(&self.value) = value.into();
    }

    pub fn set_flags(&self, flags: CharacteristicFlags) {
        *lock(&self.flags) = flags;
    }

    /// Pretend notifications were left enabled by someone else
    pub fn set_notifying(&self, notifying: bool) {
        self.notifying.store(notifying, Ordering::SeqCst);
    }

    /// A disconnected mock fails every call with `TransportError::Disconnected`
    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }

    pub fn set_write_ack(&self, acknowledged: bool) {
        self.write_ack.store(acknowledged, Ordering::SeqCst);
    }

    /// Deliver a value as the transport would. Returns whether a sink was
    /// registered to receive it.
    pub fn emit(&self, value: &[u8]) -> bool {
        let subscriber = lock(&self.subscriber).clone();
        match subscriber {
            Some(sink) => {
                sink.notify(value);
                true
            }
            None => false,
        }
    }

    pub fn has_subscriber(&self) -> bool {
        lock(&self.subscriber).is_some()
    }

    pub fn enable_calls(&self) -> usize {
        self.enable_calls.load(Ordering::SeqCst)
    }

    pub fn disable_calls(&self) -> usize {
        self.disable_calls.load(Ordering::SeqCst)
    }

    pub fn read_calls(&self) -> usize {
        self.read_calls.load(Ordering::SeqCst)
    }

    pub fn written(&self) -> Vec<Vec<u8>> {
        lock(&self.written).clone()
    }

    fn ensure_connected(&self, operation: &str) -> Result<(), TransportError> {
        if self.connected.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(TransportError::Disconnected(operation.to_string()))
        }
    }
}

#[async_trait]
impl Characteristic for MockCharacteristic {
    async fn flags(&self) -> Result<CharacteristicFlags, TransportError> {
        self.ensure_connected("flags")?;
        Ok(*lock(&self.flags))
    }

    async fn is_notifying(&self) -> Result<bool, TransportError> {
        self.ensure_connected("is_notifying")?;
        Ok(self.notifying.load(Ordering::SeqCst))
    }

    async fn enable_value_notifications(
        &self,
        notification: Arc<dyn Notification>,
    ) -> Result<(), TransportError> {
        self.ensure_connected("enable_value_notifications")?;
        self.enable_calls.fetch_add(1, Ordering::SeqCst);
        *lock(&self.subscriber) = Some(notification);
        self.notifying.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn disable_value_notifications(&self) -> Result<(), TransportError> {
        self.ensure_connected("disable_value_notifications")?;
        self.disable_calls.fetch_add(1, Ordering::SeqCst);
        lock(&self.subscriber).take();
        self.notifying.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn read_value(&self) -> Result<Vec<u8>, TransportError> {
        self.ensure_connected("read_value")?;
        self.read_calls.fetch_add(1, Ordering::SeqCst);
        Ok(lock(&self.value).clone())
    }

    async fn write_value(&self, data: &[u8]) -> Result<bool, TransportError> {
        self.ensure_connected("write_value")?;
        lock(&self.written).push(data.to_vec());
        if self.write_ack.load(Ordering::SeqCst) {
            *lock(&self.value) = data.to_vec();
            Ok(true)
        } else {
            Ok(false)
        }
    }
}

/// Resolver backed by a map; unknown addresses resolve to `None`
#[derive(Default)]
pub struct MockResolver {
    objects: Mutex<HashMap<Address, Arc<MockCharacteristic>>>,
    resolve_calls: AtomicUsize,
}

impl MockResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `characteristic` reachable at `address`
    pub fn insert(&self, address: Address, characteristic: Arc<MockCharacteristic>) {
        lock(&self.objects).insert(address, characteristic);
    }

    /// Make `address` unreachable
    pub fn remove(&self, address: &Address) -> Option<Arc<MockCharacteristic>> {
        lock(&self.objects).remove(address)
    }

    pub fn resolve_calls(&self) -> usize {
        self.resolve_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Resolver<dyn Characteristic> for MockResolver {
    async fn resolve(&self, address: &Address) -> Option<Arc<dyn Characteristic>> {
        self.resolve_calls.fetch_add(1, Ordering::SeqCst);
        let found = lock(&self.objects).get(address).cloned();
        found.map(|characteristic| characteristic as Arc<dyn Characteristic>)
    }
}
