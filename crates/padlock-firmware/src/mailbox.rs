//! Single-slot handoff between event producers and the tick loop.

use std::sync::{Arc, Mutex, MutexGuard};

/// One-item mailbox shared between a producer and the tick loop.
///
/// Posting replaces any value that was not yet taken, so a burst of events
/// between two ticks collapses to the latest one. Each posted value is taken
/// at most once.
///
/// # Examples
///
/// ```
/// use padlock_firmware::Mailbox;
///
/// let mailbox = Mailbox::new();
/// let producer = mailbox.clone();
///
/// assert_eq!(producer.post(1), None);
/// assert_eq!(producer.post(2), Some(1));
/// assert_eq!(mailbox.take(), Some(2));
/// assert_eq!(mailbox.take(), None);
/// ```
#[derive(Debug)]
pub struct Mailbox<T> {
    slot: Arc<Mutex<Option<T>>>,
}

impl<T> Mailbox<T> {
    pub fn new() -> Self {
        Self {
            slot: Arc::new(Mutex::new(None)),
        }
    }

    /// Store `value`, returning the unconsumed value it displaced.
    pub fn post(&self, value: T) -> Option<T> {
        self.lock().replace(value)
    }

    pub fn take(&self) -> Option<T> {
        self.lock().take()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_none()
    }

    // A panicking holder cannot leave a half-written Option behind.
    fn lock(&self) -> MutexGuard<'_, Option<T>> {
        self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<T> Clone for Mailbox<T> {
    fn clone(&self) -> Self {
        Self {
            slot: Arc::clone(&self.slot),
        }
    }
}

impl<T> Default for Mailbox<T> {
    fn default() -> Self {
        Self::new()
    }
}
