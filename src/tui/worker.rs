//! Background submit worker.
//!
//! Persistence calls run on their own thread so the TUI loop keeps drawing
//! (and can show a busy state) while a request is in flight. There is no
//! cancellation: dropping the handle only stops listening for the result.

use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread::{self, JoinHandle};

use crate::CarepulseError;

/// Outcome of a background submission.
#[derive(Debug)]
pub enum SubmitOutcome<T> {
    Done(T),
    Failed(CarepulseError),
}

/// Handle to a running submission.
pub struct SubmitHandle<T> {
    rx: Receiver<SubmitOutcome<T>>,
    _handle: JoinHandle<()>,
}

impl<T> SubmitHandle<T> {
    /// Try to receive the outcome (non-blocking).
    #[must_use]
    pub fn try_recv(&self) -> Option<SubmitOutcome<T>> {
        match self.rx.try_recv() {
            Ok(outcome) => Some(outcome),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(SubmitOutcome::Failed(CarepulseError::Io(
                std::io::Error::other("submit worker exited without a result"),
            ))),
        }
    }
}

pub struct SubmitWorker;

impl SubmitWorker {
    /// Run `job` on a background thread.
    pub fn spawn<T, F>(job: F) -> SubmitHandle<T>
    where
        T: Send + 'static,
        F: FnOnce() -> Result<T, CarepulseError> + Send + 'static,
    {
        let (tx, rx) = mpsc::channel();

        let handle = thread::spawn(move || {
            let outcome = match job() {
                Ok(value) => SubmitOutcome::Done(value),
                Err(e) => {
                    tracing::error!("Submission failed: {}", e);
                    SubmitOutcome::Failed(e)
                }
            };
            // Receiver may be gone if the user left the screen.
            let _ = tx.send(outcome);
        });

        SubmitHandle {
            rx,
            _handle: handle,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    fn wait<T>(handle: &SubmitHandle<T>) -> SubmitOutcome<T> {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            if let Some(outcome) = handle.try_recv() {
                return outcome;
            }
            assert!(Instant::now() < deadline, "worker timed out");
            thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn test_delivers_result() {
        let handle = SubmitWorker::spawn(|| Ok(42));
        assert!(matches!(wait(&handle), SubmitOutcome::Done(42)));
    }

    #[test]
    fn test_delivers_error() {
        let handle: SubmitHandle<()> = SubmitWorker::spawn(|| {
            Err(CarepulseError::Io(std::io::Error::other("backend down")))
        });
        assert!(matches!(wait(&handle), SubmitOutcome::Failed(CarepulseError::Io(_))));
    }
}
