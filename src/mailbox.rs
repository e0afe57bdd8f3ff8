use std::sync::{Mutex, MutexGuard};

/// Single-slot holder: every `put` overwrites, nothing is queued.
///
/// Producers (detector callback, recognizer events) write at their own rate;
/// the controller reads once per tick with `take`. A value overwritten before
/// it was taken is simply lost.
#[derive(Debug)]
pub struct LatestSlot<T> {
    slot: Mutex<Option<T>>,
}

impl<T> LatestSlot<T> {
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(None),
        }
    }

    fn guard(&self) -> MutexGuard<'_, Option<T>> {
        match self.slot.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Store `value`, returning whatever unread value it replaced.
    pub fn put(&self, value: T) -> Option<T> {
        self.guard().replace(value)
    }

    pub fn take(&self) -> Option<T> {
        self.guard().take()
    }

    pub fn clear(&self) {
        self.guard().take();
    }

    pub fn is_empty(&self) -> bool {
        self.guard().is_none()
    }
}

impl<T: Clone> LatestSlot<T> {
    /// Read without consuming. Used for the landmark overlay.
    pub fn peek(&self) -> Option<T> {
        self.guard().clone()
    }
}

impl<T> Default for LatestSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}
