use crate::error::MediaError;
use crate::media::LocalMediaStream;
use async_trait::async_trait;
use telecall_core::MediaConstraints;

/// Source of local capture tracks, the equivalent of `getUserMedia`.
#[async_trait]
pub trait MediaDevices: Send + Sync {
    async fn get_user_media(
        &self,
        constraints: MediaConstraints,
    ) -> Result<LocalMediaStream, MediaError>;
}
