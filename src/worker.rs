// src/worker.rs

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::error::SensorError;
use crate::sensors::{Driver, Reading, SharedState};

/// Pause between successful samples.
pub const SAMPLE_INTERVAL: Duration = Duration::from_secs(1);
/// Settle time after a successful setup, before the sampling thread starts.
pub const SETUP_SETTLE: Duration = Duration::from_secs(1);

/// One supervised sensor: runs the driver's sampling loop on its own OS
/// thread and publishes into the driver's shared state.
///
/// The owner observes the worker through [`is_active`](Self::is_active)
/// and [`reading`](Self::reading) only. A dead worker reports
/// `is_active() == false` and its `measured_time` stops advancing; no
/// error value crosses this boundary; diagnostics go to the log.
pub struct SensorWorker {
    shared: SharedState,
    active: Arc<AtomicBool>,
    run: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl SensorWorker {
    /// Runs the driver's setup, then starts the sampling thread.
    ///
    /// A setup failure closes the driver on the spot: the returned worker
    /// is already inactive and never entered the sampling loop.
    pub fn spawn(mut driver: Driver) -> Self {
        let active = Arc::new(AtomicBool::new(true));
        let run = Arc::new(AtomicBool::new(true));
        let shared = driver.shared();

        if let Err(e) = driver.setup() {
            log::error!("{}: setup failed: {e}", driver.kind());
            driver.close();
            active.store(false, Ordering::Relaxed);
            return Self {
                shared,
                active,
                run,
                handle: None,
            };
        }
        thread::sleep(SETUP_SETTLE);

        let handle = {
            let run = Arc::clone(&run);
            let active = Arc::clone(&active);
            thread::spawn(move || run_worker(driver, run, active))
        };
        Self {
            shared,
            active,
            run,
            handle: Some(handle),
        }
    }

    /// Whether the sampling loop is still running. Never flips back to
    /// true once false.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Relaxed)
    }

    /// Lock-free copy of the latest published snapshot.
    pub fn reading(&self) -> Reading {
        self.shared.reading()
    }

    /// Requests a cooperative stop and waits for the sampling thread to
    /// tear down. The loop notices the request at its next iteration
    /// boundary; in-flight I/O finishes first. Calling this on an
    /// already-stopped worker is a no-op.
    pub fn stop(&mut self) {
        self.run.store(false, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!("sensor worker thread panicked");
            }
        }
    }
}

impl Drop for SensorWorker {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_worker(mut driver: Driver, run: Arc<AtomicBool>, active: Arc<AtomicBool>) {
    let kind = driver.kind();
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| sample_loop(&mut driver, &run)));
    match outcome {
        Ok(Ok(())) => log::info!("{kind}: worker stopped"),
        Ok(Err(e)) => log::error!("{kind}: worker fault: {e}"),
        Err(_) => log::error!("{kind}: worker panicked"),
    }
    // Teardown runs on every exit path: fault, panic, or stop request.
    driver.close();
    active.store(false, Ordering::Relaxed);
}

fn sample_loop(driver: &mut Driver, run: &AtomicBool) -> Result<(), SensorError> {
    // Stop requests are honored here, between the sleep and the next read.
    while run.load(Ordering::Relaxed) {
        driver.sample()?;
        thread::sleep(SAMPLE_INTERVAL);
    }
    Ok(())
}
