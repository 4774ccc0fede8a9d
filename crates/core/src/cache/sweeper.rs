use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::{Arc, Weak};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::info;

use crate::error::CacheError;

use super::ResultCache;

/// Owner of the background sweep thread. Dropping it stops the thread.
#[derive(Debug)]
pub struct SweepHandle {
    stop: Option<Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl SweepHandle {
    /// Stop the sweeper and wait for it to exit.
    pub fn shutdown(mut self) {
        self.stop_and_join();
    }

    fn stop_and_join(&mut self) {
        // Dropping the sender wakes the thread with `Disconnected`.
        self.stop.take();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
            info!("cache sweeper stopped");
        }
    }
}

impl Drop for SweepHandle {
    fn drop(&mut self) {
        self.stop_and_join();
    }
}

impl ResultCache {
    /// Spawn a thread that sweeps expired entries every `sweep_interval`.
    ///
    /// The thread holds only a weak reference, so it also exits once the
    /// cache itself is dropped.
    pub fn start_sweeper(self: &Arc<Self>) -> Result<SweepHandle, CacheError> {
        self.start_sweeper_every(self.options.sweep_interval())
    }

    /// Like [`ResultCache::start_sweeper`] with an explicit interval.
    pub fn start_sweeper_every(self: &Arc<Self>, interval: Duration) -> Result<SweepHandle, CacheError> {
        let cache: Weak<ResultCache> = Arc::downgrade(self);
        let (stop, stopped) = mpsc::channel::<()>();

        let thread = thread::Builder::new().name("mapdiff-cache-sweeper".into()).spawn(
            move || loop {
                match stopped.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => {
                        let Some(cache) = cache.upgrade() else { break };
                        let evicted = cache.sweep_expired();
                        if evicted > 0 {
                            info!(evicted, remaining = cache.len(), "cache sweep evicted results");
                        }
                    }
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            },
        )?;

        info!(interval_ms = interval.as_millis() as u64, "cache sweeper started");
        Ok(SweepHandle { stop: Some(stop), thread: Some(thread) })
    }
}
