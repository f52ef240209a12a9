pub const DEFAULT_STUN_ADDR: &str = "stun:stun.l.google.com:19302";
pub const DEFAULT_STUN_ADDR_2: &str = "stun:stun1.l.google.com:19302";

/// Upper bound on remote candidates held while no remote description is set.
pub const MAX_PENDING_CANDIDATES: usize = 128;
