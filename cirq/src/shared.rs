//! A circuit shared between threads.
//!
//! Hosts that deliver editor events from several threads keep one
//! [`SharedCircuit`] per circuit. Every operation takes the single lock, so
//! events are still applied one at a time.

use std::sync::{Arc, Mutex, MutexGuard};

use crate::circuit::Circuit;
use crate::events::{EditorEvent, EventOutcome};

#[derive(Debug, Clone)]
pub struct SharedCircuit {
    inner: Arc<Mutex<Circuit>>,
}

impl SharedCircuit {
    pub fn new(circuit: Circuit) -> Self {
        Self {
            inner: Arc::new(Mutex::new(circuit)),
        }
    }

    /// Lock the circuit. A panic in another holder does not leave the graph
    /// half-mutated, so a poisoned lock is recovered.
    pub fn lock(&self) -> MutexGuard<'_, Circuit> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn with<R>(&self, f: impl FnOnce(&mut Circuit) -> R) -> R {
        f(&mut self.lock())
    }

    pub fn handle_event(&self, event: EditorEvent) -> EventOutcome {
        self.lock().handle_event(event)
    }

    /// Take the circuit back if this is the last handle.
    pub fn try_unwrap(self) -> Result<Circuit, Self> {
        match Arc::try_unwrap(self.inner) {
            Ok(mutex) => Ok(mutex.into_inner().unwrap_or_else(|poisoned| poisoned.into_inner())),
            Err(inner) => Err(Self { inner }),
        }
    }
}

impl From<Circuit> for SharedCircuit {
    fn from(circuit: Circuit) -> Self {
        Self::new(circuit)
    }
}
