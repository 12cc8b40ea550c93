//! Cancellable delays for hover previews, trailer autoplay and the auto-next
//! countdown.

use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

pub const HOVER_PREVIEW_DELAY: Duration = Duration::from_millis(1000);
pub const TRAILER_AUTOPLAY_DELAY: Duration = Duration::from_millis(3000);
pub const COUNTDOWN_TICK: Duration = Duration::from_millis(100);

/// Runs a task after a fixed delay. Scheduling again replaces the pending
/// task; dropping the handle cancels it.
pub struct DelayedTask {
    delay: Duration,
    handle: Option<JoinHandle<()>>,
}

impl DelayedTask {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            handle: None,
        }
    }

    pub fn hover_preview() -> Self {
        Self::new(HOVER_PREVIEW_DELAY)
    }

    pub fn trailer_autoplay() -> Self {
        Self::new(TRAILER_AUTOPLAY_DELAY)
    }

    pub fn schedule<F>(&mut self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.cancel();
        let delay = self.delay;
        self.handle = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            task.await;
        }));
    }

    pub fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    pub fn is_pending(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for DelayedTask {
    fn drop(&mut self) {
        self.cancel();
    }
}

struct CountdownState {
    remaining_ms: AtomicU64,
    paused: AtomicBool,
}

/// Auto-next countdown. Ticks every [`COUNTDOWN_TICK`] while not paused and
/// calls `on_done` once when it reaches zero.
pub struct Countdown {
    total: Duration,
    state: Arc<CountdownState>,
    handle: JoinHandle<()>,
}

impl Countdown {
    pub fn start<F>(total: Duration, on_done: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        let state = Arc::new(CountdownState {
            remaining_ms: AtomicU64::new(total.as_millis() as u64),
            paused: AtomicBool::new(false),
        });

        let handle = tokio::spawn({
            let state = Arc::clone(&state);
            async move {
                let tick = COUNTDOWN_TICK.as_millis() as u64;
                loop {
                    tokio::time::sleep(COUNTDOWN_TICK).await;
                    if state.paused.load(Ordering::Acquire) {
                        continue;
                    }
                    let left = state
                        .remaining_ms
                        .load(Ordering::Acquire)
                        .saturating_sub(tick);
                    state.remaining_ms.store(left, Ordering::Release);
                    if left == 0 {
                        break;
                    }
                }
                on_done();
            }
        });

        Self {
            total,
            state,
            handle,
        }
    }

    pub fn pause(&self) {
        self.state.paused.store(true, Ordering::Release);
    }

    pub fn resume(&self) {
        self.state.paused.store(false, Ordering::Release);
    }

    pub fn is_paused(&self) -> bool {
        self.state.paused.load(Ordering::Acquire)
    }

    pub fn remaining(&self) -> Duration {
        Duration::from_millis(self.state.remaining_ms.load(Ordering::Acquire))
    }

    /// Elapsed fraction in `0.0..=1.0`, for drawing the progress ring.
    pub fn progress(&self) -> f32 {
        if self.total.is_zero() {
            return 1.0;
        }
        1.0 - self.remaining().as_secs_f32() / self.total.as_secs_f32()
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    pub fn cancel(&self) {
        self.handle.abort();
    }
}

impl Drop for Countdown {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use tokio::time::sleep;

    use super::*;

    fn counter() -> (Arc<AtomicUsize>, impl Fn() -> Arc<AtomicUsize>) {
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        (count, move || Arc::clone(&c))
    }

    #[tokio::test(start_paused = true)]
    async fn test_delayed_task_fires_after_delay() {
        let (count, handle) = counter();
        let mut task = DelayedTask::hover_preview();
        let c = handle();
        task.schedule(async move {
            c.fetch_add(1, Ordering::SeqCst);
        });

        sleep(Duration::from_millis(950)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert!(task.is_pending());

        sleep(Duration::from_millis(100)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(!task.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_reschedule_replaces_pending() {
        let (count, handle) = counter();
        let mut task = DelayedTask::new(Duration::from_millis(1000));

        let c = handle();
        task.schedule(async move {
            c.fetch_add(1, Ordering::SeqCst);
        });
        sleep(Duration::from_millis(500)).await;
        let c = handle();
        task.schedule(async move {
            c.fetch_add(10, Ordering::SeqCst);
        });

        sleep(Duration::from_millis(600)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
        sleep(Duration::from_millis(500)).await;
        assert_eq!(count.load(Ordering::SeqCst), 10);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel() {
        let (count, handle) = counter();
        let mut task = DelayedTask::trailer_autoplay();
        let c = handle();
        task.schedule(async move {
            c.fetch_add(1, Ordering::SeqCst);
        });
        task.cancel();
        sleep(Duration::from_secs(5)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_countdown_fires_once() {
        let (count, handle) = counter();
        let c = handle();
        let countdown = Countdown::start(Duration::from_secs(3), move || {
            c.fetch_add(1, Ordering::SeqCst);
        });

        sleep(Duration::from_millis(1550)).await;
        assert_eq!(countdown.remaining(), Duration::from_millis(1500));
        assert!((countdown.progress() - 0.5).abs() < f32::EPSILON);

        sleep(Duration::from_millis(1500)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(countdown.is_finished());

        sleep(Duration::from_secs(1)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_countdown_pause_resume() {
        let (count, handle) = counter();
        let c = handle();
        let countdown = Countdown::start(Duration::from_secs(3), move || {
            c.fetch_add(1, Ordering::SeqCst);
        });

        sleep(Duration::from_millis(1050)).await;
        countdown.pause();
        sleep(Duration::from_secs(5)).await;
        assert_eq!(countdown.remaining(), Duration::from_millis(2000));
        assert_eq!(count.load(Ordering::SeqCst), 0);

        countdown.resume();
        sleep(Duration::from_millis(2050)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
