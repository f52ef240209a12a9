use crate::error::NegotiationError;
use crate::negotiation::CandidateBuffer;
use telecall_core::IceCandidate;
use tracing::{debug, warn};

/// Offer/answer position of the local side, mirroring the JSEP signaling state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalingPhase {
    Stable,
    HaveLocalOffer,
    HaveRemoteOffer,
    Closed,
}

/// What to do with a remote offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OfferDecision {
    Accept,
    /// Our own offer collided with it and we yield. The local offer must be
    /// discarded on a fresh connection before the remote one is applied.
    RestartThenAccept,
    /// Our own offer collided with it and we keep ours.
    Ignore,
}

/// Bookkeeping for one peer connection's offer/answer rounds.
///
/// Holds no webrtc handles: the session asks it what to do, performs the
/// webrtc call, then reports back. At most one offer is outstanding at a time.
#[derive(Debug)]
pub struct Negotiation {
    phase: SignalingPhase,
    polite: bool,
    pending_offer: Option<String>,
    remote_description_set: bool,
    candidates: CandidateBuffer,
}

impl Negotiation {
    pub fn new(polite: bool) -> Self {
        Self::with_buffer(polite, CandidateBuffer::default())
    }

    pub fn with_buffer(polite: bool, candidates: CandidateBuffer) -> Self {
        Self {
            phase: SignalingPhase::Stable,
            polite,
            pending_offer: None,
            remote_description_set: false,
            candidates,
        }
    }

    pub fn phase(&self) -> SignalingPhase {
        self.phase
    }

    pub fn has_remote_description(&self) -> bool {
        self.remote_description_set
    }

    pub fn buffered_candidates(&self) -> usize {
        self.candidates.len()
    }

    /// Claims the single offer slot.
    pub fn begin_offer(&mut self) -> Result<(), NegotiationError> {
        match self.phase {
            SignalingPhase::Stable => {
                self.phase = SignalingPhase::HaveLocalOffer;
                Ok(())
            }
            SignalingPhase::Closed => Err(NegotiationError::Closed),
            _ => Err(NegotiationError::OfferInFlight),
        }
    }

    /// Records the SDP of the offer we just set locally.
    pub fn offer_created(&mut self, sdp: String) {
        self.pending_offer = Some(sdp);
    }

    /// True if `sdp` is our own outstanding offer coming back through the relay.
    pub fn is_own_offer(&self, sdp: &str) -> bool {
        self.pending_offer.as_deref() == Some(sdp)
    }

    pub fn pending_offer(&self) -> Option<&str> {
        self.pending_offer.as_deref()
    }

    pub fn remote_offer(&mut self) -> Result<OfferDecision, NegotiationError> {
        match self.phase {
            SignalingPhase::Closed => Err(NegotiationError::Closed),
            SignalingPhase::Stable | SignalingPhase::HaveRemoteOffer => {
                self.phase = SignalingPhase::HaveRemoteOffer;
                Ok(OfferDecision::Accept)
            }
            SignalingPhase::HaveLocalOffer if self.polite => {
                debug!("Offer collision, yielding our offer");
                self.pending_offer = None;
                self.phase = SignalingPhase::HaveRemoteOffer;
                Ok(OfferDecision::RestartThenAccept)
            }
            SignalingPhase::HaveLocalOffer => {
                debug!("Offer collision, keeping our offer");
                Ok(OfferDecision::Ignore)
            }
        }
    }

    /// Puts back a yielded offer when the connection could not be restarted,
    /// so the bookkeeping matches the connection still holding it.
    pub fn restore_local_offer(&mut self, sdp: String) {
        if self.phase == SignalingPhase::Closed {
            return;
        }
        self.phase = SignalingPhase::HaveLocalOffer;
        self.pending_offer = Some(sdp);
    }

    /// The peer connection was rebuilt and has no remote description yet.
    /// Candidates still buffered are kept for the new connection.
    pub fn transport_replaced(&mut self) {
        self.remote_description_set = false;
    }

    /// Frees the offer slot after our answer went out.
    pub fn answer_sent(&mut self) -> Result<(), NegotiationError> {
        match self.phase {
            SignalingPhase::HaveRemoteOffer => {
                self.phase = SignalingPhase::Stable;
                Ok(())
            }
            SignalingPhase::Closed => Err(NegotiationError::Closed),
            _ => Err(NegotiationError::NoRemoteOffer),
        }
    }

    pub fn remote_answer(&mut self) -> Result<(), NegotiationError> {
        match self.phase {
            SignalingPhase::HaveLocalOffer => {
                self.pending_offer = None;
                self.phase = SignalingPhase::Stable;
                Ok(())
            }
            SignalingPhase::Closed => Err(NegotiationError::Closed),
            _ => Err(NegotiationError::UnexpectedAnswer),
        }
    }

    /// Marks the remote description as applied and hands back the candidates
    /// that were waiting for it, oldest first.
    pub fn remote_description_applied(&mut self) -> Vec<IceCandidate> {
        self.remote_description_set = true;
        self.candidates.drain()
    }

    /// Returns the candidate if it can be applied now; otherwise buffers it.
    pub fn remote_candidate(&mut self, candidate: IceCandidate) -> Option<IceCandidate> {
        if self.phase == SignalingPhase::Closed {
            return None;
        }
        if self.remote_description_set {
            return Some(candidate);
        }

        debug!("Buffering remote candidate until a remote description is set");
        if let Some(evicted) = self.candidates.push(candidate) {
            warn!("Candidate buffer full, dropped {}", evicted.candidate);
        }
        None
    }

    /// Gives up on the current round after a failed webrtc call.
    pub fn abandon_round(&mut self) {
        if self.phase != SignalingPhase::Closed {
            self.phase = SignalingPhase::Stable;
            self.pending_offer = None;
        }
    }

    pub fn close(&mut self) {
        self.phase = SignalingPhase::Closed;
        self.pending_offer = None;
        self.candidates.clear();
    }
}
