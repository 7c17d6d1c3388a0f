//! One-shot startup deadline

use std::time::Duration;

use tether_process::Generation;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Fired when a startup deadline passes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerElapsed {
    pub generation: Generation,
}

/// Cancellable one-shot timer tied to one spawn generation.
///
/// Cancelling after the timer fired but before its event was handled is a
/// no-op here; the receiver must check generation and state when the event
/// arrives.
#[derive(Debug)]
pub struct StartupTimer {
    generation: Generation,
    task: JoinHandle<()>,
}

impl StartupTimer {
    /// Arm a timer that reports [`TimerElapsed`] to `sink` after `after`
    pub fn arm<E>(generation: Generation, after: Duration, sink: mpsc::UnboundedSender<E>) -> Self
    where
        E: From<TimerElapsed> + Send + 'static,
    {
        let task = tokio::spawn(async move {
            tokio::time::sleep(after).await;
            let _ = sink.send(E::from(TimerElapsed { generation }));
        });
        Self { generation, task }
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn cancel(self) {
        self.task.abort();
    }
}

impl Drop for StartupTimer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_fires_after_deadline() {
        let (tx, mut rx) = mpsc::unbounded_channel::<TimerElapsed>();
        let started = tokio::time::Instant::now();
        let _timer = StartupTimer::arm(Generation::new(3), Duration::from_millis(3000), tx);

        let elapsed = rx.recv().await.unwrap();
        assert_eq!(elapsed.generation, Generation::new(3));
        assert!(started.elapsed() >= Duration::from_millis(3000));
        assert!(started.elapsed() < Duration::from_millis(3010));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_before_deadline() {
        let (tx, mut rx) = mpsc::unbounded_channel::<TimerElapsed>();
        let timer = StartupTimer::arm(Generation::default(), Duration::from_millis(100), tx);

        tokio::time::sleep(Duration::from_millis(50)).await;
        timer.cancel();

        // The aborted task drops its sender without sending.
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_after_fire_is_noop() {
        let (tx, mut rx) = mpsc::unbounded_channel::<TimerElapsed>();
        let timer = StartupTimer::arm(Generation::default(), Duration::from_millis(10), tx);

        tokio::time::sleep(Duration::from_millis(20)).await;
        timer.cancel();

        assert!(rx.recv().await.is_some());
    }
}
