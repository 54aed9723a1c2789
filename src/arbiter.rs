// src/arbiter.rs

use std::sync::{Arc, Mutex, MutexGuard};

/// Exclusive access token for one physical serial bus.
///
/// Every sensor attached to the same port holds a clone of the same
/// arbiter. The token must be held across exactly one write+read-line
/// exchange (or the setup buffer drain) and released before decode and
/// publish, so the worst-case exclusion window is one I/O round trip.
#[derive(Clone, Debug, Default)]
pub struct BusArbiter {
    inner: Arc<Mutex<()>>,
}

/// Guard granting the bus; dropping it releases the bus.
pub type BusGuard<'a> = MutexGuard<'a, ()>;

impl BusArbiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Blocks until no other worker holds the bus.
    pub fn lock(&self) -> BusGuard<'_> {
        // The guarded state is (), so a poisoned lock carries no damage.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
