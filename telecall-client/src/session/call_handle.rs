use crate::error::{Result, SessionError};
use crate::session::{SessionCommand, SessionEvent};
use telecall_core::{MediaKind, MediaState, PeerId};
use tokio::sync::{broadcast, mpsc, oneshot};

/// Cheap, clonable remote control for a running call session.
/// The session tears itself down once every handle is dropped.
#[derive(Clone)]
pub struct CallHandle {
    peer_id: PeerId,
    command_tx: mpsc::Sender<SessionCommand>,
    event_tx: broadcast::Sender<SessionEvent>,
}

impl CallHandle {
    pub(crate) fn new(
        peer_id: PeerId,
        command_tx: mpsc::Sender<SessionCommand>,
        event_tx: broadcast::Sender<SessionEvent>,
    ) -> Self {
        Self {
            peer_id,
            command_tx,
            event_tx,
        }
    }

    pub fn peer_id(&self) -> PeerId {
        self.peer_id
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.event_tx.subscribe()
    }

    pub fn is_finished(&self) -> bool {
        self.command_tx.is_closed()
    }

    pub async fn toggle_mute(&self) -> Result<MediaState> {
        self.toggle(MediaKind::Audio).await
    }

    pub async fn toggle_video(&self) -> Result<MediaState> {
        self.toggle(MediaKind::Video).await
    }

    pub async fn media_state(&self) -> Result<MediaState> {
        let (reply, rx) = oneshot::channel();
        self.send(SessionCommand::MediaState { reply }).await?;
        rx.await.map_err(|_| SessionError::SessionEnded)
    }

    pub async fn send_chat(&self, text: impl Into<String>) -> Result<()> {
        let (reply, rx) = oneshot::channel();
        self.send(SessionCommand::SendChat {
            text: text.into(),
            reply,
        })
        .await?;
        rx.await.map_err(|_| SessionError::SessionEnded)?
    }

    pub async fn hang_up(&self) -> Result<()> {
        self.send(SessionCommand::HangUp).await
    }

    async fn toggle(&self, kind: MediaKind) -> Result<MediaState> {
        let (reply, rx) = oneshot::channel();
        self.send(SessionCommand::ToggleMedia { kind, reply }).await?;
        rx.await.map_err(|_| SessionError::SessionEnded)?
    }

    async fn send(&self, cmd: SessionCommand) -> Result<()> {
        self.command_tx
            .send(cmd)
            .await
            .map_err(|_| SessionError::SessionEnded)
    }
}
