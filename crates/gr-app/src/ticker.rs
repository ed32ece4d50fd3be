use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use flume::{Receiver, TrySendError};

/// Upper bound on how long a cancelled ticker thread keeps sleeping.
const CANCEL_SLICE: Duration = Duration::from_millis(5);

/// Cancellable periodic task bound to a refresh rate.
///
/// The thread emits one tick per period into a single-slot channel: a tick
/// not consumed before the next one is due is coalesced, never queued.
/// Dropping or cancelling the ticker stops and joins the thread.
///
/// # Example
/// ```
/// use gr_app::ticker::RefreshTicker;
/// use std::time::Duration;
///
/// let ticker = RefreshTicker::start(120).unwrap();
/// assert_eq!(ticker.period(), Duration::from_nanos(8_333_333));
/// std::thread::sleep(Duration::from_millis(50));
/// assert!(ticker.try_tick());
/// ticker.cancel();
/// ```
pub struct RefreshTicker {
    rx: Receiver<Instant>,
    cancelled: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
    period: Duration,
}

impl RefreshTicker {
    /// Spawn a ticker at `fps` ticks per second (clamped to 1..=240).
    ///
    /// # Errors
    /// Returns an error if the thread cannot be spawned.
    pub fn start(fps: u32) -> Result<Self> {
        let period = Duration::from_nanos(1_000_000_000 / u64::from(fps.clamp(1, 240)));
        let (tx, rx) = flume::bounded(1);
        let cancelled = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&cancelled);

        let handle = thread::Builder::new()
            .name("gr-ticker".to_string())
            .spawn(move || {
                let mut next = Instant::now() + period;
                while !flag.load(Ordering::Relaxed) {
                    let now = Instant::now();
                    if now < next {
                        thread::sleep((next - now).min(CANCEL_SLICE));
                        continue;
                    }
                    next += period;
                    if next < now {
                        // En retard de plus d'une période : on ne rattrape pas.
                        next = now + period;
                    }
                    match tx.try_send(now) {
                        Ok(()) | Err(TrySendError::Full(_)) => {}
                        Err(TrySendError::Disconnected(_)) => break,
                    }
                }
            })
            .context("Impossible de spawner le thread de rafraîchissement")?;

        log::debug!("Ticker démarré : période {period:?}");
        Ok(Self {
            rx,
            cancelled,
            handle: Some(handle),
            period,
        })
    }

    /// Tick period.
    #[must_use]
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Consume a pending tick without blocking.
    #[must_use]
    pub fn try_tick(&self) -> bool {
        self.rx.try_recv().is_ok()
    }

    /// Stop the periodic task and join its thread.
    pub fn cancel(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        self.cancelled.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
            log::debug!("Ticker arrêté");
        }
    }
}

impl Drop for RefreshTicker {
    fn drop(&mut self) {
        self.stop();
    }
}
