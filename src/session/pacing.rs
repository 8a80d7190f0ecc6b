//! Reply pacing: runs an assistant reply after a short, cosmetic delay.

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;

/// Schedules work to run after a fixed delay.
#[derive(Debug, Clone, Copy)]
pub struct Pacer {
    delay: Duration,
}

impl Pacer {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Spawn `task` to run once the delay has elapsed.
    pub fn schedule<F>(&self, task: F) -> ScheduledReply
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let delay = self.delay;
        let handle = tokio::spawn(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            task.await;
        });
        ScheduledReply { handle }
    }
}

/// Handle to a scheduled reply.
#[derive(Debug)]
pub struct ScheduledReply {
    handle: JoinHandle<()>,
}

impl ScheduledReply {
    /// Abort the reply if it has not run yet.
    pub fn cancel(&self) {
        self.handle.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the reply to run (or be cancelled).
    pub async fn finished(self) {
        let _ = self.handle.await;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    use super::*;

    #[tokio::test]
    async fn scheduled_task_runs_after_delay() {
        let ran = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&ran);
        let pacer = Pacer::new(Duration::from_millis(20));

        let reply = pacer.schedule(async move {
            flag.store(true, Ordering::SeqCst);
        });
        assert!(!ran.load(Ordering::SeqCst));

        reply.finished().await;
        assert!(ran.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn cancelled_task_never_runs() {
        let ran = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&ran);
        let pacer = Pacer::new(Duration::from_millis(50));

        let reply = pacer.schedule(async move {
            flag.store(true, Ordering::SeqCst);
        });
        reply.cancel();
        reply.finished().await;

        tokio::time::sleep(Duration::from_millis(80)).await;
        assert!(!ran.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn zero_delay_runs_promptly() {
        let ran = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&ran);
        let reply = Pacer::new(Duration::ZERO).schedule(async move {
            flag.store(true, Ordering::SeqCst);
        });
        reply.finished().await;
        assert!(ran.load(Ordering::SeqCst));
    }
}
