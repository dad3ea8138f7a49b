//! Shared-store lifecycle: one live backend per address, reference counted.
//!
//! Several logical repositories in one process may open the same store
//! address. The manager hands out shared handles and tears the backend down
//! when the last handle is released, which happens on every exit path
//! because release is tied to [`Connection`]'s `Drop`.

use std::collections::HashMap;
use std::hash::Hash;
use std::ops::Deref;
use std::sync::{Arc, Mutex};

use tracing::debug;

struct Slot<R> {
    resource: Arc<R>,
    refs: usize,
}

/// Reference-counted map of address to shared backend handle.
pub struct ConnectionManager<A, R> {
    connect: Box<dyn Fn(&A) -> R + Send + Sync>,
    slots: Mutex<HashMap<A, Slot<R>>>,
}

impl<A, R> ConnectionManager<A, R>
where
    A: Eq + Hash + Clone + std::fmt::Debug,
{
    /// Create a manager that builds a fresh backend with `connect` the first
    /// time an address is acquired.
    pub fn new(connect: impl Fn(&A) -> R + Send + Sync + 'static) -> Self {
        Self {
            connect: Box::new(connect),
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Acquire a scoped handle to the backend at `address`.
    ///
    /// The first acquisition connects; later ones share the same backend.
    pub fn acquire(&self, address: A) -> Connection<'_, A, R> {
        let mut slots = self.slots.lock().expect("lock poisoned");
        let slot = slots.entry(address.clone()).or_insert_with(|| {
            debug!(?address, "connecting store backend");
            Slot {
                resource: Arc::new((self.connect)(&address)),
                refs: 0,
            }
        });
        slot.refs += 1;
        Connection {
            manager: self,
            address,
            resource: Arc::clone(&slot.resource),
        }
    }

    /// Number of distinct live addresses.
    pub fn live_connections(&self) -> usize {
        self.slots.lock().expect("lock poisoned").len()
    }

    fn release(&self, address: &A) {
        let mut slots = self.slots.lock().expect("lock poisoned");
        if let Some(slot) = slots.get_mut(address) {
            slot.refs -= 1;
            if slot.refs == 0 {
                slots.remove(address);
                debug!(?address, "disconnected store backend");
            }
        }
    }
}

/// Scoped handle to a shared backend.
///
/// Dereferences to the backend; dropping it releases the reference and
/// disconnects the backend when it was the last one.
pub struct Connection<'m, A, R>
where
    A: Eq + Hash + Clone + std::fmt::Debug,
{
    manager: &'m ConnectionManager<A, R>,
    address: A,
    resource: Arc<R>,
}

impl<A, R> Connection<'_, A, R>
where
    A: Eq + Hash + Clone + std::fmt::Debug,
{
    /// The address this handle is connected to.
    pub fn address(&self) -> &A {
        &self.address
    }
}

impl<A, R> Deref for Connection<'_, A, R>
where
    A: Eq + Hash + Clone + std::fmt::Debug,
{
    type Target = R;

    fn deref(&self) -> &R {
        &self.resource
    }
}

impl<A, R> Drop for Connection<'_, A, R>
where
    A: Eq + Hash + Clone + std::fmt::Debug,
{
    fn drop(&mut self) {
        self.manager.release(&self.address);
    }
}
