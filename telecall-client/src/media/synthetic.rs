use crate::error::MediaError;
use crate::media::{LocalMediaStream, LocalTrack, MediaDevices};
use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;
use std::time::Duration;
use telecall_core::{MediaConstraints, MediaKind, PeerId};
use tracing::{debug, info};
use webrtc::api::media_engine::{MIME_TYPE_OPUS, MIME_TYPE_VP8};
use webrtc::rtp_transceiver::rtp_codec::RTCRtpCodecCapability;
use webrtc::track::track_local::track_local_static_sample::TrackLocalStaticSample;

const AUDIO_FRAME: Duration = Duration::from_millis(20);
const VIDEO_FRAME: Duration = Duration::from_millis(33);

/// Opus TOC + payload for a 20ms silent frame.
const OPUS_SILENCE: [u8; 3] = [0xf8, 0xff, 0xfe];

/// Headless capture: paced Opus silence and a constant VP8 payload.
#[derive(Debug, Clone)]
pub struct SyntheticDevices {
    label: String,
}

impl SyntheticDevices {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
        }
    }

    fn make_track(&self, kind: MediaKind, stream_id: &str) -> LocalTrack {
        let capability = match kind {
            MediaKind::Audio => RTCRtpCodecCapability {
                mime_type: MIME_TYPE_OPUS.to_owned(),
                clock_rate: 48000,
                channels: 2,
                ..Default::default()
            },
            MediaKind::Video => RTCRtpCodecCapability {
                mime_type: MIME_TYPE_VP8.to_owned(),
                clock_rate: 90000,
                ..Default::default()
            },
        };
        let track = Arc::new(TrackLocalStaticSample::new(
            capability,
            format!("{}-{}", self.label, kind),
            stream_id.to_owned(),
        ));
        LocalTrack::new(kind, track)
    }
}

impl Default for SyntheticDevices {
    fn default() -> Self {
        Self::new("synthetic")
    }
}

#[async_trait]
impl MediaDevices for SyntheticDevices {
    async fn get_user_media(
        &self,
        constraints: MediaConstraints,
    ) -> Result<LocalMediaStream, MediaError> {
        if !constraints.audio && !constraints.video {
            return Err(MediaError::Device(
                "constraints request neither audio nor video".to_owned(),
            ));
        }

        let stream_id = format!("{}-{}", self.label, PeerId::new());
        let tracks: Vec<LocalTrack> = [MediaKind::Audio, MediaKind::Video]
            .into_iter()
            .filter(|kind| constraints.wants(*kind))
            .map(|kind| self.make_track(kind, &stream_id))
            .collect();

        let mut stream = LocalMediaStream::new(stream_id, tracks.clone());
        for track in tracks {
            stream.attach_pump(tokio::spawn(pump(track)));
        }

        info!(
            "Captured synthetic stream {} ({} tracks)",
            stream.id(),
            stream.tracks().len()
        );
        Ok(stream)
    }
}

async fn pump(track: LocalTrack) {
    let (frame, payload) = match track.kind() {
        MediaKind::Audio => (AUDIO_FRAME, Bytes::from_static(&OPUS_SILENCE)),
        MediaKind::Video => (VIDEO_FRAME, Bytes::from(vec![0u8; 160])),
    };

    let mut ticker = tokio::time::interval(frame);
    loop {
        ticker.tick().await;
        if let Err(e) = track.write_sample(payload.clone(), frame).await {
            debug!("Sample pump for {} stopped: {}", track.id(), e);
            break;
        }
    }
}
