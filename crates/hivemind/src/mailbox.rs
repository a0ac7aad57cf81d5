//! # Frame Mailbox
//!
//! Single-slot holder for the newest tick.
//!
//! ```text
//! put(A)  →  [A]
//! put(B)  →  [B]      A dropped, counted, never reported as an error
//! take()  →  B, []
//! ```
//!
//! This is the controller's only backpressure: when ticks arrive faster than
//! user logic consumes them, only the newest is ever processed.

/// Last-write-wins single-slot mailbox.
#[derive(Debug)]
pub struct FrameMailbox<T> {
    slot: Option<T>,
    dropped: u64,
}

impl<T> FrameMailbox<T> {
    /// Creates an empty mailbox.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            slot: None,
            dropped: 0,
        }
    }

    /// Stores `frame`, returning the frame it displaced.
    pub fn put(&mut self, frame: T) -> Option<T> {
        let displaced = self.slot.replace(frame);
        if displaced.is_some() {
            self.dropped += 1;
        }
        displaced
    }

    /// Removes and returns the stored frame.
    pub fn take(&mut self) -> Option<T> {
        self.slot.take()
    }

    /// Returns true if a frame is waiting.
    #[inline]
    #[must_use]
    pub const fn is_occupied(&self) -> bool {
        self.slot.is_some()
    }

    /// Total frames overwritten before they were taken.
    #[inline]
    #[must_use]
    pub const fn dropped(&self) -> u64 {
        self.dropped
    }
}

impl<T> Default for FrameMailbox<T> {
    fn default() -> Self {
        Self::new()
    }
}
