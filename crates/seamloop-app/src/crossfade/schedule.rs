/// Identifies one requested frame callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameRequestId(pub u64);

/// Display-refresh driven callback source.
///
/// One request yields at most one callback on the next refresh. Cancelled
/// requests never fire.
pub trait FrameScheduler {
    fn request_frame(&mut self) -> FrameRequestId;
    fn cancel_frame(&mut self, id: FrameRequestId);
}

/// Scheduler with an explicit queue of outstanding requests.
///
/// The driver pulls due ids with [`ManualScheduler::take_pending`] and hands
/// them to the controller. Used by tests and headless drivers.
#[derive(Debug, Default)]
pub struct ManualScheduler {
    next_id: u64,
    pending: Vec<FrameRequestId>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Remove and return every outstanding request, oldest first.
    pub fn take_pending(&mut self) -> Vec<FrameRequestId> {
        std::mem::take(&mut self.pending)
    }
}

impl FrameScheduler for ManualScheduler {
    fn request_frame(&mut self) -> FrameRequestId {
        self.next_id += 1;
        let id = FrameRequestId(self.next_id);
        self.pending.push(id);
        id
    }

    fn cancel_frame(&mut self, id: FrameRequestId) {
        self.pending.retain(|p| *p != id);
    }
}
