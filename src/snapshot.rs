// src/snapshot.rs

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;

/// One published f64 field: a single writer (the owning worker) and any
/// number of readers, none of which ever block. The value travels as its
/// bit pattern through an `AtomicU64`, so readers always see a complete
/// value from some sample cycle; there is no cross-field atomicity.
#[derive(Debug, Default)]
pub struct SharedF64(AtomicU64);

impl SharedF64 {
    pub fn new(value: f64) -> Self {
        Self(AtomicU64::new(value.to_bits()))
    }

    /// Writer side; only the owning worker publishes.
    pub(crate) fn store(&self, value: f64) {
        self.0.store(value.to_bits(), Ordering::Relaxed);
    }

    pub fn load(&self) -> f64 {
        f64::from_bits(self.0.load(Ordering::Relaxed))
    }
}

/// Unix time in float seconds, the resolution `measured_time` is published at.
pub(crate) fn unix_now() -> f64 {
    Utc::now().timestamp_micros() as f64 / 1e6
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn starts_at_zero() {
        assert_eq!(SharedF64::default().load(), 0.0);
    }

    #[test]
    fn store_then_load_roundtrips() {
        let cell = SharedF64::new(1013.25);
        assert_eq!(cell.load(), 1013.25);
        cell.store(-25.76);
        assert_eq!(cell.load(), -25.76);
    }

    #[test]
    fn readers_see_complete_values_only() {
        let cell = Arc::new(SharedF64::new(1.0));
        let writer_cell = Arc::clone(&cell);
        let writer = thread::spawn(move || {
            for _ in 0..10_000 {
                writer_cell.store(1.0);
                writer_cell.store(2.0);
            }
        });
        for _ in 0..10_000 {
            let v = cell.load();
            assert!(v == 1.0 || v == 2.0, "torn read: {v}");
        }
        writer.join().unwrap();
    }

    #[test]
    fn unix_now_is_recent() {
        let t = unix_now();
        // Sometime after 2020 and before 2100.
        assert!(t > 1.577e9 && t < 4.102e9);
    }
}
