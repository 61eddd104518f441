//! Background image decoding.
//!
//! Each request decodes on its own worker thread; results come back through a
//! channel that the UI loop polls, so one slow file never blocks interaction
//! with the other cells.

use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread::{self, JoinHandle};

use crate::image_handle::ImageHandle;

/// What a decoded image is destined for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeTarget {
    /// Slot `index` of upload batch `serial`.
    Batch { serial: u64, index: usize },
    /// Replacement for the image `image_id`, requested during `generation`
    /// while it sat in `cell`.
    Replace {
        generation: u64,
        cell: usize,
        image_id: u64,
    },
}

/// Result emitted once a decode completes.
#[derive(Debug)]
pub struct DecodeResult {
    pub target: DecodeTarget,
    pub image: Result<ImageHandle, String>,
}

struct PendingDecode {
    target: DecodeTarget,
    receiver: Receiver<Result<ImageHandle, String>>,
    join: Option<JoinHandle<()>>,
}

impl PendingDecode {
    fn finish(mut self, image: Result<ImageHandle, String>) -> DecodeResult {
        if let Some(join) = self.join.take() {
            let _ = join.join();
        }
        DecodeResult {
            target: self.target,
            image,
        }
    }
}

/// Manages asynchronous decode requests without blocking the event loop.
#[derive(Default)]
pub struct DecodeService {
    pending: Vec<PendingDecode>,
}

impl DecodeService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start decoding `bytes`. The result becomes available on a future call
    /// to [`poll`](Self::poll) or [`wait_all`](Self::wait_all).
    pub fn request(&mut self, target: DecodeTarget, bytes: Vec<u8>) {
        let (tx, rx) = mpsc::channel();

        let join = thread::spawn(move || {
            let decoded = ImageHandle::decode(bytes).map_err(|e| e.to_string());
            let _ = tx.send(decoded);
        });

        self.pending.push(PendingDecode {
            target,
            receiver: rx,
            join: Some(join),
        });
    }

    /// Collect every decode that has finished, leaving the rest pending.
    pub fn poll(&mut self) -> Vec<DecodeResult> {
        let mut ready = Vec::new();
        let mut still_pending = Vec::new();

        for pending in self.pending.drain(..) {
            match pending.receiver.try_recv() {
                Ok(image) => ready.push(pending.finish(image)),
                Err(TryRecvError::Empty) => still_pending.push(pending),
                Err(TryRecvError::Disconnected) => {
                    let image = Err("decoder thread exited without a result".to_string());
                    ready.push(pending.finish(image));
                }
            }
        }

        self.pending = still_pending;
        ready
    }

    /// Block until every pending decode has finished.
    pub fn wait_all(&mut self) -> Vec<DecodeResult> {
        self.pending
            .drain(..)
            .map(|pending| {
                let image = pending
                    .receiver
                    .recv()
                    .unwrap_or_else(|_| Err("decoder thread exited without a result".to_string()));
                pending.finish(image)
            })
            .collect()
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}
