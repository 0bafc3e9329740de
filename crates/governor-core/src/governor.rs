//! Generic governor: lazy binding and the init/dispose lifecycle
//!
//! A [`Governor`] owns the decision to acquire and release the live object
//! behind an [`Address`]. Kind-specific behaviour (what init and dispose do)
//! is supplied by a [`Bindable`] strategy.
//!
//! # Locking
//!
//! Resolution, init, dispose and rebinding run under one async mutex per
//! governor. Operations against an already bound object only hold the lock
//! long enough to clone the handle, so a concurrent dispose never waits for
//! in-flight reads or writes. Those either complete against the
//! not-yet-released object or fail with a transport error.

use crate::address::Address;
use crate::error::{GovernorError, Result, TransportError};
use crate::transport::Resolver;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex as StdMutex, PoisonError};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Kind of remote object a governor controls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    Characteristic,
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ObjectKind::Characteristic => "Characteristic",
        };
        f.write_str(name)
    }
}

/// Kind-specific half of a governor.
///
/// `init` runs exactly once per acquired binding and `dispose` undoes what
/// the most recent `init` did. Both are called with the governor's binding
/// lock held, so they never overlap for one governor.
#[async_trait]
pub trait Bindable: Send + Sync + 'static {
    type Object: ?Sized + Send + Sync + 'static;

    fn kind(&self) -> ObjectKind;

    /// Prepare a freshly resolved object. On error the binding is not kept.
    async fn init(&self, address: &Address, object: &Arc<Self::Object>)
        -> std::result::Result<(), TransportError>;

    /// Tear down whatever `init` set up. Must not fail.
    async fn dispose(&self, address: &Address, object: &Arc<Self::Object>);

    /// Periodic refresh hook driven by the owning manager
    async fn update_state(
        &self,
        _address: &Address,
        _object: &Arc<Self::Object>,
    ) -> std::result::Result<(), TransportError> {
        Ok(())
    }
}

/// Lifecycle and access controller for one remote object.
///
/// Two governors are equal when their addresses are equal, regardless of
/// binding state.
pub struct Governor<B: Bindable> {
    address: Address,
    resolver: Arc<dyn Resolver<B::Object>>,
    strategy: B,
    /// Live bound object, if any
    binding: Mutex<Option<Arc<B::Object>>>,
    /// Last successful read or write
    last_updated: StdMutex<Option<DateTime<Utc>>>,
    /// Transport failures since the last successful interaction
    transport_errors: AtomicU32,
}

impl<B: Bindable> Governor<B> {
    /// Create an unbound governor. Nothing is resolved until first use.
    pub fn new(address: Address, resolver: Arc<dyn Resolver<B::Object>>, strategy: B) -> Self {
        Self {
            address,
            resolver,
            strategy,
            binding: Mutex::new(None),
            last_updated: StdMutex::new(None),
            transport_errors: AtomicU32::new(0),
        }
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn kind(&self) -> ObjectKind {
        self.strategy.kind()
    }

    pub fn strategy(&self) -> &B {
        &self.strategy
    }

    /// Whether a bound object is currently held
    pub async fn is_ready(&self) -> bool {
        self.binding.lock().await.is_some()
    }

    /// Time of the last successful read or write
    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        *self.last_updated.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Consecutive transport failures since the last success or rebinding
    pub fn transport_errors(&self) -> u32 {
        self.transport_errors.load(Ordering::SeqCst)
    }

    /// Bound object, resolving and initialising it if needed.
    ///
    /// Fails with [`GovernorError::NotReady`] when the resolver has nothing.
    pub async fn bound_object(&self) -> Result<Arc<B::Object>> {
        self.acquire()
            .await?
            .ok_or_else(|| GovernorError::NotReady(self.address.clone()))
    }

    /// Like [`Governor::bound_object`] but reports an unreachable object as `None`
    pub async fn try_bound_object(&self) -> Result<Option<Arc<B::Object>>> {
        self.acquire().await
    }

    /// Hand over a fresh object obtained by the manager.
    ///
    /// Any previous binding is disposed first, then `init` runs on the new
    /// one.
    pub async fn bind(&self, object: Arc<B::Object>) -> Result<()> {
        let mut binding = self.binding.lock().await;
        if let Some(previous) = binding.take() {
            debug!(address = %self.address, "Disposing previous binding before rebind");
            self.strategy.dispose(&self.address, &previous).await;
        }
        self.initialize(&object).await?;
        *binding = Some(object);
        Ok(())
    }

    /// Release the binding. Safe to call any number of times.
    pub async fn dispose(&self) {
        let mut binding = self.binding.lock().await;
        let Some(object) = binding.as_ref() else {
            debug!(address = %self.address, "Dispose on unbound governor, nothing to do");
            return;
        };

        info!(address = %self.address, kind = %self.kind(), "Disposing governor");
        self.strategy.dispose(&self.address, object).await;
        // strategy teardown completes before the object reference goes away
        *binding = None;
    }

    /// One refresh pass: bind lazily if unbound, otherwise refresh state.
    ///
    /// Returns whether the governor is bound afterwards. Never fails; errors
    /// are logged and counted.
    pub async fn update(&self) -> bool {
        let object = match self.acquire().await {
            Ok(Some(object)) => object,
            Ok(None) => return false,
            Err(e) => {
                warn!(address = %self.address, error = %e, "Could not bind governor");
                return false;
            }
        };

        match self.strategy.update_state(&self.address, &object).await {
            Ok(()) => true,
            Err(e) => {
                let e = self.transport_failure(e);
                warn!(address = %self.address, error = %e, "Could not refresh governor state");
                true
            }
        }
    }

    async fn acquire(&self) -> Result<Option<Arc<B::Object>>> {
        let mut binding = self.binding.lock().await;
        if let Some(object) = binding.as_ref() {
            return Ok(Some(Arc::clone(object)));
        }

        let Some(object) = self.resolver.resolve(&self.address).await else {
            debug!(address = %self.address, "Object is not currently reachable");
            return Ok(None);
        };

        self.initialize(&object).await?;
        *binding = Some(Arc::clone(&object));
        Ok(Some(object))
    }

    async fn initialize(&self, object: &Arc<B::Object>) -> Result<()> {
        info!(address = %self.address, kind = %self.kind(), "Initializing governor");
        self.strategy
            .init(&self.address, object)
            .await
            .map_err(|e| self.transport_failure(e))?;
        self.transport_errors.store(0, Ordering::SeqCst);
        Ok(())
    }

    /// Count a wire-level failure and wrap it for the caller
    pub(crate) fn transport_failure(&self, source: TransportError) -> GovernorError {
        self.transport_errors.fetch_add(1, Ordering::SeqCst);
        GovernorError::Transport {
            address: self.address.clone(),
            source,
        }
    }

    /// Record a successful interaction. The timestamp never moves backwards.
    pub(crate) fn touch(&self) {
        let now = Utc::now();
        let mut last = self
            .last_updated
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        *last = Some(last.map_or(now, |previous| previous.max(now)));
        self.transport_errors.store(0, Ordering::SeqCst);
    }
}

impl<B: Bindable> PartialEq for Governor<B> {
    fn eq(&self, other: &Self) -> bool {
        self.address == other.address
    }
}

impl<B: Bindable> Eq for Governor<B> {}

impl<B: Bindable> Hash for Governor<B> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.address.hash(state);
    }
}

impl<B: Bindable> fmt::Display for Governor<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind(), self.address)
    }
}

impl<B: Bindable> fmt::Debug for Governor<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Governor")
            .field("kind", &self.kind())
            .field("address", &self.address)
            .field("last_updated", &self.last_updated())
            .field("transport_errors", &self.transport_errors())
            .finish()
    }
}
