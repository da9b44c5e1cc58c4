use std::time::Duration;

use crate::dom::clock::Clock;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaitOutcome<T> {
    Ready(T),
    TimedOut { waited: Duration },
}

/// Poll `probe` every `interval` until it yields a value or `timeout` elapses.
///
/// The probe runs once more when the timeout is reached, so a value that shows
/// up during the final sleep is still observed.
pub fn await_condition<T, F>(
    clock: &dyn Clock,
    interval: Duration,
    timeout: Duration,
    mut probe: F,
) -> WaitOutcome<T>
where
    F: FnMut() -> Option<T>,
{
    let mut waited = Duration::ZERO;
    loop {
        if let Some(value) = probe() {
            return WaitOutcome::Ready(value);
        }
        if waited >= timeout || interval.is_zero() {
            return WaitOutcome::TimedOut { waited };
        }
        clock.sleep(interval);
        waited += interval;
    }
}
