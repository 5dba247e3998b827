//! Trailing-edge debounce for scheduled batch execution.
//!
//! Each [`DebounceScheduler::notify`] pushes the deadline out by the configured
//! delay. When the delay passes with no further notification, the flush
//! callback runs once.

use futures::future::BoxFuture;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

/// Callback run when the quiet period elapses. Returning `false` stops the scheduler.
pub type FlushFn = Box<dyn Fn() -> BoxFuture<'static, bool> + Send + Sync>;

/// Single pending deferred flush with an "extend deadline" operation
#[derive(Debug)]
pub struct DebounceScheduler {
    delay: Duration,
    tx: Option<mpsc::UnboundedSender<()>>,
    task: Option<JoinHandle<()>>,
}

impl DebounceScheduler {
    /// Start the scheduler task on the current tokio runtime.
    ///
    /// Outside a runtime the scheduler is inert and pending work only runs
    /// when flushed explicitly.
    pub fn spawn(delay: Duration, flush: FlushFn) -> Self {
        let Ok(handle) = Handle::try_current() else {
            debug!("No tokio runtime available, debounced execution disabled");
            return Self::disabled(delay);
        };

        let (tx, rx) = mpsc::unbounded_channel();
        let task = handle.spawn(run(delay, rx, flush));

        Self {
            delay,
            tx: Some(tx),
            task: Some(task),
        }
    }

    /// A scheduler that never fires on its own
    pub fn disabled(delay: Duration) -> Self {
        Self {
            delay,
            tx: None,
            task: None,
        }
    }

    /// Start or restart the delay. Returns false if the scheduler is not running.
    pub fn notify(&self) -> bool {
        match &self.tx {
            Some(tx) => tx.send(()).is_ok(),
            None => false,
        }
    }

    /// Whether a background task is driving the scheduler
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Configured quiet period
    pub fn delay(&self) -> Duration {
        self.delay
    }
}

impl Drop for DebounceScheduler {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

async fn run(delay: Duration, mut rx: mpsc::UnboundedReceiver<()>, flush: FlushFn) {
    while rx.recv().await.is_some() {
        let mut coalesced = 1usize;
        let mut closed = false;

        loop {
            tokio::select! {
                message = rx.recv() => match message {
                    Some(()) => coalesced += 1,
                    None => {
                        closed = true;
                        break;
                    }
                },
                _ = tokio::time::sleep(delay) => break,
            }
        }

        trace!(coalesced, "Debounce delay elapsed");
        if !flush().await || closed {
            break;
        }
    }
    debug!("Debounce scheduler stopped");
}
