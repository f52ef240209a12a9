mod candidate_buffer;
mod negotiation_state;

pub use candidate_buffer::CandidateBuffer;
pub use negotiation_state::{Negotiation, OfferDecision, SignalingPhase};
