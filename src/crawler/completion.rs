//! One-shot completion signal that tolerates repeated settlement

use std::sync::Mutex;
use tokio::sync::oneshot;

/// Settling side of a one-shot result
///
/// The first call to [`Completion::complete`] delivers the value; later calls
/// are ignored. Settling after the receiver was dropped is not an error.
#[derive(Debug)]
pub struct Completion<T> {
    sender: Mutex<Option<oneshot::Sender<T>>>,
}

impl<T> Completion<T> {
    /// Creates the settling side and the receiver that awaits it
    pub fn channel() -> (Self, oneshot::Receiver<T>) {
        let (sender, receiver) = oneshot::channel();
        let completion = Self {
            sender: Mutex::new(Some(sender)),
        };
        (completion, receiver)
    }

    /// Settles with `value`; returns true only for the call that settled
    pub fn complete(&self, value: T) -> bool {
        let sender = match self.sender.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };

        match sender {
            Some(sender) => {
                // The receiver may already be gone if the caller gave up
                let _ = sender.send(value);
                true
            }
            None => false,
        }
    }
}
