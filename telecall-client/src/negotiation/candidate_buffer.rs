use std::collections::VecDeque;
use telecall_core::IceCandidate;
use telecall_core::utils::MAX_PENDING_CANDIDATES;

/// Remote candidates that arrived before the remote description.
/// Bounded; when full the oldest candidate is evicted.
#[derive(Debug)]
pub struct CandidateBuffer {
    pending: VecDeque<IceCandidate>,
    capacity: usize,
}

impl CandidateBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            pending: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    /// Queues `candidate`, returning the evicted one if the buffer was full.
    pub fn push(&mut self, candidate: IceCandidate) -> Option<IceCandidate> {
        let evicted = if self.pending.len() == self.capacity {
            self.pending.pop_front()
        } else {
            None
        };
        self.pending.push_back(candidate);
        evicted
    }

    /// Takes every queued candidate in arrival order.
    pub fn drain(&mut self) -> Vec<IceCandidate> {
        self.pending.drain(..).collect()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

impl Default for CandidateBuffer {
    fn default() -> Self {
        Self::new(MAX_PENDING_CANDIDATES)
    }
}
