pub use telecall_core::model::{CallState, MediaKind, MediaState, PeerId};

pub mod model {
    pub use telecall_core::model::*;
}

#[cfg(feature = "client")]
pub mod client {
    pub use telecall_client::*;
}
