// tests/worker.rs
//
// End-to-end worker lifecycle tests over mock transports. These use the
// real 1 s sample cadence and settle delays, so generous poll timeouts.

use std::sync::atomic::Ordering;
use std::time::{Duration, Instant};

use sensor_hub::sensors::{AccelerometerSensor, PressureSensor, ThermistorSensor};
use sensor_hub::testing::{EchoSerial, MockI2c, ScriptedSerial, SharedWire};
use sensor_hub::{BusArbiter, Driver, Reading, SensorWorker};

fn wait_for(timeout: Duration, mut cond: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(20));
    }
    cond()
}

#[test]
fn pressure_worker_end_to_end() {
    let mock = MockI2c::new()
        .with_register(0x28, 0x00)
        .with_register(0x29, 0x00)
        .with_register(0x2a, 0x40)
        .with_register(0x2b, 0x00)
        .with_register(0x2c, 0x80);
    let stats = mock.stats();
    let mut worker = SensorWorker::spawn(Driver::Pressure(PressureSensor::new(Box::new(mock))));

    assert!(worker.is_active());
    assert!(wait_for(Duration::from_secs(5), || {
        worker.reading().measured_time() > 0.0
    }));

    match worker.reading() {
        Reading::Pressure(r) => {
            assert_eq!(r.kind, "pressure_sensor");
            assert_eq!(r.model_number, "LPS251B");
            assert!((r.pressure_hpa - 1024.0).abs() < 1e-9);
            let expected_temp = 42.5 + (32768.0 - 65535.0) / 480.0;
            assert!((r.temperature_celsius - expected_temp).abs() < 1e-9);
            let expected_alt =
                ((1024.0f64 / 1013.25).powf(0.190263) - 1.0) * expected_temp / 0.0065;
            assert!((r.altitude_meters - expected_alt).abs() < 1e-9);
        }
        other => panic!("wrong reading variant: {other:?}"),
    }

    worker.stop();
    assert!(!worker.is_active());
    assert_eq!(stats.closes.load(Ordering::Relaxed), 1);

    // Stopping again must not fail, double-close, or revive the flag.
    worker.stop();
    assert!(!worker.is_active());
    assert_eq!(stats.closes.load(Ordering::Relaxed), 1);
}

#[test]
fn unparseable_lines_close_the_worker_after_four_attempts() {
    let mock = ScriptedSerial::repeating("hot garbage\n");
    let stats = mock.stats();
    let worker = SensorWorker::spawn(Driver::Thermistor(ThermistorSensor::new(
        Box::new(mock),
        "1",
        BusArbiter::new(),
    )));

    assert!(wait_for(Duration::from_secs(10), || !worker.is_active()));

    // Initial attempt plus exactly three retries, then the close.
    assert_eq!(stats.reads.load(Ordering::Relaxed), 4);
    assert_eq!(stats.closes.load(Ordering::Relaxed), 1);
    match worker.reading() {
        Reading::Thermistor(r) => {
            assert_eq!(r.temperature_celsius, 0.0);
            assert_eq!(r.measured_time, 0.0);
        }
        other => panic!("wrong reading variant: {other:?}"),
    }
}

#[test]
fn accelerometer_publishes_then_holds_values_while_dying() {
    // One good line, then the wire degrades permanently.
    let mock = ScriptedSerial::new(["1.0,2.0,3.0\n"]).then_repeating("1.0,bad,3.0\n");
    let stats = mock.stats();
    let worker = SensorWorker::spawn(Driver::Accelerometer(AccelerometerSensor::new(
        Box::new(mock),
        "2",
        BusArbiter::new(),
    )));

    assert!(wait_for(Duration::from_secs(5), || {
        worker.reading().measured_time() > 0.0
    }));
    let first = match worker.reading() {
        Reading::Accelerometer(r) => r,
        other => panic!("wrong reading variant: {other:?}"),
    };
    assert_eq!(
        (
            first.accelerometer_x_mps2,
            first.accelerometer_y_mps2,
            first.accelerometer_z_mps2
        ),
        (1.0, 2.0, 3.0)
    );

    // The bad lines exhaust the retry budget on the next sample cycle.
    assert!(wait_for(Duration::from_secs(10), || !worker.is_active()));

    let last = match worker.reading() {
        Reading::Accelerometer(r) => r,
        other => panic!("wrong reading variant: {other:?}"),
    };
    // Nothing from the bad lines was ever published.
    assert_eq!(last.accelerometer_x_mps2, 1.0);
    assert_eq!(last.accelerometer_y_mps2, 2.0);
    assert_eq!(last.accelerometer_z_mps2, 3.0);
    assert_eq!(last.measured_time, first.measured_time);
    // One good read plus four failed attempts.
    assert_eq!(stats.reads.load(Ordering::Relaxed), 5);
}

#[test]
fn setup_failure_never_enters_the_loop() {
    let mock = ScriptedSerial::repeating("21.0\n").fail_resets();
    let stats = mock.stats();
    let worker = SensorWorker::spawn(Driver::Thermistor(ThermistorSensor::new(
        Box::new(mock),
        "1",
        BusArbiter::new(),
    )));

    assert!(!worker.is_active());
    assert_eq!(stats.reads.load(Ordering::Relaxed), 0);
    assert_eq!(stats.closes.load(Ordering::Relaxed), 1);
    assert_eq!(worker.reading().measured_time(), 0.0);
}

#[test]
fn arbiter_keeps_shared_wire_exchanges_whole() {
    let wire = SharedWire::new();
    let arbiter = BusArbiter::new();
    let hold = Duration::from_millis(150);

    let mut first = SensorWorker::spawn(Driver::Thermistor(ThermistorSensor::new(
        Box::new(EchoSerial::new(7, wire.clone(), hold)),
        "1",
        arbiter.clone(),
    )));
    let mut second = SensorWorker::spawn(Driver::Thermistor(ThermistorSensor::new(
        Box::new(EchoSerial::new(8, wire.clone(), hold)),
        "2",
        arbiter.clone(),
    )));

    // Both publish their echoed handle id as a temperature.
    assert!(wait_for(Duration::from_secs(5), || {
        first.reading().measured_time() > 0.0 && second.reading().measured_time() > 0.0
    }));
    std::thread::sleep(Duration::from_secs(3));

    assert!(first.is_active());
    assert!(second.is_active());
    match (first.reading(), second.reading()) {
        (Reading::Thermistor(a), Reading::Thermistor(b)) => {
            assert_eq!(a.temperature_celsius, 7.0);
            assert_eq!(b.temperature_celsius, 8.0);
        }
        other => panic!("wrong reading variants: {other:?}"),
    }
    assert_eq!(wire.violations.load(Ordering::Relaxed), 0);

    first.stop();
    second.stop();
    assert!(!first.is_active());
    assert!(!second.is_active());
}
