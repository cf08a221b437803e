use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

/// A worker-thread job where only the most recent request counts.
///
/// Spawning again drops the receiver of the previous job, so whatever that
/// job eventually produces has nowhere to go. Results are picked up with
/// [`BackgroundTask::poll`] once per frame on the UI thread.
pub struct BackgroundTask<T> {
    generation: u64,
    pending: Option<Receiver<(u64, T)>>,
}

impl<T> Default for BackgroundTask<T> {
    fn default() -> Self { Self { generation: 0, pending: None } }
}

impl<T: Send + 'static> BackgroundTask<T> {
    pub fn new() -> Self { Self::default() }

    /// Starts `job` and returns its generation number.
    pub fn spawn<F>(&mut self, job: F) -> u64
    where
        F: FnOnce() -> T + Send + 'static,
    {
        if self.pending.is_some() {
            log::debug!("superseding background job #{}", self.generation);
        }
        self.generation += 1;
        let generation: u64 = self.generation;
        let (tx, rx) = mpsc::channel();
        self.pending = Some(rx);
        thread::spawn(move || {
            // The receiver is gone when a newer job replaced this one.
            let _ = tx.send((generation, job()));
        });
        generation
    }

    /// The finished result of the latest job, if it is done.
    pub fn poll(&mut self) -> Option<T> {
        let rx: &Receiver<(u64, T)> = self.pending.as_ref()?;
        match rx.try_recv() {
            Ok((generation, value)) => {
                self.pending = None;
                (generation == self.generation).then_some(value)
            }
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                log::warn!("background job #{} ended without a result", self.generation);
                self.pending = None;
                None
            }
        }
    }

    pub fn is_pending(&self) -> bool { self.pending.is_some() }

    /// Forgets the running job, if any.
    pub fn cancel(&mut self) {
        self.pending = None;
    }
}
