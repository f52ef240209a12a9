use bytes::Bytes;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use telecall_core::MediaKind;
use tokio::task::JoinHandle;
use tracing::debug;
use webrtc::media::Sample;
use webrtc::track::track_local::TrackLocal;
use webrtc::track::track_local::track_local_static_sample::TrackLocalStaticSample;

/// One captured track. Disabling it keeps it attached to the connection
/// but stops samples from reaching the wire.
#[derive(Clone)]
pub struct LocalTrack {
    kind: MediaKind,
    track: Arc<TrackLocalStaticSample>,
    enabled: Arc<AtomicBool>,
}

impl LocalTrack {
    pub fn new(kind: MediaKind, track: Arc<TrackLocalStaticSample>) -> Self {
        Self {
            kind,
            track,
            enabled: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn kind(&self) -> MediaKind {
        self.kind
    }

    pub fn id(&self) -> &str {
        self.track.id()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
    }

    pub fn rtc_track(&self) -> Arc<dyn TrackLocal + Send + Sync> {
        self.track.clone()
    }

    /// Writes one sample; returns `false` without writing while disabled.
    pub async fn write_sample(&self, data: Bytes, duration: Duration) -> webrtc::error::Result<bool> {
        if !self.is_enabled() {
            return Ok(false);
        }
        self.track
            .write_sample(&Sample {
                data,
                duration,
                ..Default::default()
            })
            .await?;
        Ok(true)
    }
}

/// Tracks returned by one capture request, plus the tasks feeding them.
pub struct LocalMediaStream {
    id: String,
    tracks: Vec<LocalTrack>,
    pumps: Vec<JoinHandle<()>>,
}

impl LocalMediaStream {
    pub fn new(id: impl Into<String>, tracks: Vec<LocalTrack>) -> Self {
        Self {
            id: id.into(),
            tracks,
            pumps: Vec::new(),
        }
    }

    /// Ties a feeding task to the stream; it is aborted on `stop`.
    pub fn attach_pump(&mut self, pump: JoinHandle<()>) {
        self.pumps.push(pump);
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn tracks(&self) -> &[LocalTrack] {
        &self.tracks
    }

    pub fn tracks_of(&self, kind: MediaKind) -> impl Iterator<Item = &LocalTrack> {
        self.tracks.iter().filter(move |t| t.kind() == kind)
    }

    pub fn has(&self, kind: MediaKind) -> bool {
        self.tracks_of(kind).next().is_some()
    }

    /// Enables or disables every track of `kind`. Returns how many were touched.
    pub fn set_enabled(&self, kind: MediaKind, enabled: bool) -> usize {
        let mut touched = 0;
        for track in self.tracks_of(kind) {
            track.set_enabled(enabled);
            touched += 1;
        }
        touched
    }

    pub fn stop(&mut self) {
        if self.pumps.is_empty() {
            return;
        }
        debug!("Stopping local stream {}", self.id);
        for pump in self.pumps.drain(..) {
            pump.abort();
        }
    }
}

impl Drop for LocalMediaStream {
    fn drop(&mut self) {
        self.stop();
    }
}
