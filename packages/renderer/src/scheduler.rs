//! Frame coalescing.
//!
//! Render requests are parked on the next frame. A newer request cancels the
//! frame requested for the previous one and replaces its state, so at most
//! one frame is ever pending and it always renders the latest state.

use std::collections::BTreeSet;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameHandle(pub u64);

/// The host's animation-frame primitive.
pub trait FrameClock {
    fn request_frame(&mut self) -> FrameHandle;
    fn cancel_frame(&mut self, handle: FrameHandle);
}

pub struct FrameScheduler<T> {
    clock: Box<dyn FrameClock>,
    pending: Option<(FrameHandle, T)>,
}

impl<T> FrameScheduler<T> {
    pub fn new(clock: Box<dyn FrameClock>) -> Self {
        Self {
            clock,
            pending: None,
        }
    }

    /// Parks `state` on a new frame, superseding any pending one.
    pub fn schedule(&mut self, state: T) -> FrameHandle {
        if let Some((previous, _)) = self.pending.take() {
            debug!(frame = previous.0, "Superseding pending frame");
            self.clock.cancel_frame(previous);
        }
        let handle = self.clock.request_frame();
        self.pending = Some((handle, state));
        handle
    }

    /// Drops the pending frame and returns its state.
    pub fn cancel_scheduled(&mut self) -> Option<T> {
        let (handle, state) = self.pending.take()?;
        self.clock.cancel_frame(handle);
        Some(state)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn pending_handle(&self) -> Option<FrameHandle> {
        self.pending.as_ref().map(|(handle, _)| *handle)
    }

    /// Called by the host when a frame fires. Stale handles yield nothing.
    pub fn on_frame(&mut self, handle: FrameHandle) -> Option<T> {
        match &self.pending {
            Some((pending, _)) if *pending == handle => self.pending.take().map(|(_, state)| state),
            _ => {
                debug!(frame = handle.0, "Ignoring stale frame");
                None
            }
        }
    }
}

/// Clock driven by hand; frames fire only when the caller says so.
#[derive(Debug, Default)]
pub struct ManualClock {
    next: u64,
    requested: BTreeSet<FrameHandle>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Frames requested and not cancelled, oldest first.
    pub fn requested(&self) -> Vec<FrameHandle> {
        self.requested.iter().copied().collect()
    }

    /// Removes and returns the oldest live frame.
    pub fn take_next(&mut self) -> Option<FrameHandle> {
        self.requested.pop_first()
    }
}

impl FrameClock for ManualClock {
    fn request_frame(&mut self) -> FrameHandle {
        self.next += 1;
        let handle = FrameHandle(self.next);
        self.requested.insert(handle);
        handle
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        self.requested.remove(&handle);
    }
}

/// Clock that never fires on its own. The host polls the pending handle and
/// calls `on_frame` itself when it is ready to paint.
#[derive(Debug, Default)]
pub struct HostDrivenClock {
    next: u64,
}

impl FrameClock for HostDrivenClock {
    fn request_frame(&mut self) -> FrameHandle {
        self.next += 1;
        FrameHandle(self.next)
    }

    fn cancel_frame(&mut self, _handle: FrameHandle) {}
}
