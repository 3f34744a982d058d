//! The in-game tick timer.
//!
//! A background thread sends a tick every interval into a queue owned by the timer itself. Dropping the timer stops
//! the thread and discards whatever ticks are still queued, so ticks never outlive the timer that produced them.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

#[derive(Debug)]
pub struct TickTimer {
    /// Dropping the sender disconnects the worker's stop channel, which is how the worker learns it should exit.
    stop: Option<Sender<()>>,
    ticks: Receiver<()>,
    worker: Option<JoinHandle<()>>,
    interval: Duration,
}

impl TickTimer {
    /// Starts a timer ticking once per `interval`. The first tick comes one full interval after the start.
    pub fn start(interval: Duration) -> Self {
        let (stop_sender, stop_receiver) = mpsc::channel::<()>();
        let (tick_sender, tick_receiver) = mpsc::channel();

        let worker = thread::Builder::new()
            .name("tick-timer".to_string())
            .spawn(move || run(interval, stop_receiver, tick_sender));

        let worker = match worker {
            Ok(worker) => Some(worker),
            Err(error) => {
                tracing::warn!(%error, "couldn't spawn the tick timer thread, the clock won't run");
                None
            }
        };

        tracing::debug!(?interval, "tick timer started");

        TickTimer {
            stop: Some(stop_sender),
            ticks: tick_receiver,
            worker,
            interval,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Takes all the ticks delivered since the last call and returns their amount. Never blocks.
    pub fn take_pending(&self) -> u32 {
        self.ticks.try_iter().count() as u32
    }
}

fn run(interval: Duration, stop: Receiver<()>, ticks: Sender<()>) {
    loop {
        match stop.recv_timeout(interval) {
            Err(RecvTimeoutError::Timeout) => {
                if ticks.send(()).is_err() {
                    break;
                }
            }
            Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
        }
    }
}

impl Drop for TickTimer {
    fn drop(&mut self) {
        drop(self.stop.take());

        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                tracing::warn!("the tick timer thread panicked");
            }
        }

        tracing::debug!("tick timer stopped");
    }
}

#[cfg(test)]
mod test {
    use super::TickTimer;
    use std::thread;
    use std::time::{Duration, Instant};

    #[test]
    fn a_fresh_timer_has_no_pending_ticks() {
        let timer = TickTimer::start(Duration::from_secs(60));

        assert_eq!(timer.take_pending(), 0);
    }

    #[test]
    fn the_timer_delivers_ticks_periodically() {
        let timer = TickTimer::start(Duration::from_millis(10));
        let deadline = Instant::now() + Duration::from_secs(5);
        let mut ticks = 0;

        while ticks < 3 && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(10));
            ticks += timer.take_pending();
        }

        assert!(ticks >= 3);
    }

    #[test]
    fn taking_pending_ticks_drains_them() {
        let timer = TickTimer::start(Duration::from_millis(5));
        thread::sleep(Duration::from_millis(50));

        // stop the clock by comparing two immediate reads: the second one only sees ticks from the gap in between
        let first = timer.take_pending();
        let second = timer.take_pending();

        assert!(first >= 1);
        assert!(second <= 1);
    }

    #[test]
    fn dropping_a_long_interval_timer_returns_promptly() {
        let timer = TickTimer::start(Duration::from_secs(3600));
        let started = Instant::now();

        drop(timer);

        assert!(started.elapsed() < Duration::from_secs(5));
    }
}
