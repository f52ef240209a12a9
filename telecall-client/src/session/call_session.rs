use crate::config::{CallRole, SessionConfig};
use crate::error::{MediaError, RelayError, Result, SessionError};
use crate::media::{LocalMediaStream, MediaDevices};
use crate::negotiation::{Negotiation, OfferDecision};
use crate::session::{CallHandle, SessionCommand, SessionEvent};
use crate::signaling::{SignalingRelay, WsRelay};
use crate::transport::{PeerTransport, TransportEvent};
use serde_json::json;
use telecall_core::{
    CallState, IceCandidate, MediaKind, MediaState, PeerId, RelayFrame, SessionDescription,
    SignalMessage, decode_frame, encode_signal,
};
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, error, info, warn};
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;

const TRANSPORT_EVENT_CAPACITY: usize = 256;

/// One side of a one-to-one call.
///
/// A single task owns all call state. Relay frames, webrtc callbacks and
/// handle commands are processed one at a time, so offer, answer and
/// candidate handling never interleave.
pub struct CallSession {
    id: PeerId,
    config: SessionConfig,
    devices: Box<dyn MediaDevices>,
    relay: Box<dyn SignalingRelay>,
    relay_open: bool,
    transport: PeerTransport,
    transport_rx: mpsc::Receiver<TransportEvent>,
    command_rx: mpsc::Receiver<SessionCommand>,
    event_tx: broadcast::Sender<SessionEvent>,
    negotiation: Negotiation,
    local_stream: Option<LocalMediaStream>,
    media_state: MediaState,
    call_state: CallState,
}

impl CallSession {
    pub async fn new(
        config: SessionConfig,
        devices: Box<dyn MediaDevices>,
        relay: Box<dyn SignalingRelay>,
        command_rx: mpsc::Receiver<SessionCommand>,
        event_tx: broadcast::Sender<SessionEvent>,
    ) -> Result<Self> {
        let (transport_tx, transport_rx) = mpsc::channel(TRANSPORT_EVENT_CAPACITY);
        let transport = PeerTransport::new(&config.ice_servers, transport_tx).await?;
        let negotiation = Negotiation::new(config.polite);

        Ok(Self {
            id: PeerId::new(),
            config,
            devices,
            relay,
            relay_open: true,
            transport,
            transport_rx,
            command_rx,
            event_tx,
            negotiation,
            local_stream: None,
            media_state: MediaState::default(),
            call_state: CallState::Idle,
        })
    }

    /// Spawns a session over `relay` and returns its handle plus an event stream
    /// that observes the session from its first event.
    pub async fn start<D, R>(
        config: SessionConfig,
        devices: D,
        relay: R,
    ) -> Result<(CallHandle, broadcast::Receiver<SessionEvent>)>
    where
        D: MediaDevices + 'static,
        R: SignalingRelay,
    {
        let (command_tx, command_rx) = mpsc::channel(32);
        let (event_tx, event_rx) = broadcast::channel(config.event_capacity.max(1));

        let session = Self::new(
            config,
            Box::new(devices),
            Box::new(relay),
            command_rx,
            event_tx.clone(),
        )
        .await?;
        let handle = CallHandle::new(session.id, command_tx, event_tx);

        tokio::spawn(session.run());
        Ok((handle, event_rx))
    }

    /// Connects to the configured WebSocket relay, then starts the session.
    pub async fn connect<D>(
        config: SessionConfig,
        devices: D,
    ) -> Result<(CallHandle, broadcast::Receiver<SessionEvent>)>
    where
        D: MediaDevices + 'static,
    {
        let endpoint = config.relay_endpoint().map_err(RelayError::from)?;
        let relay = WsRelay::connect(endpoint).await?;
        Self::start(config, devices, relay).await
    }

    pub fn id(&self) -> PeerId {
        self.id
    }

    pub async fn run(mut self) {
        info!("Call session {} started ({:?})", self.id, self.config.role);

        self.acquire_media().await;

        loop {
            tokio::select! {
                cmd = self.command_rx.recv() => {
                    match cmd {
                        Some(SessionCommand::HangUp) => {
                            info!("Hang-up requested");
                            break;
                        }
                        Some(c) => self.handle_command(c).await,
                        None => {
                            info!("All call handles dropped. Ending call.");
                            break;
                        }
                    }
                }

                frame = self.relay.recv(), if self.relay_open => {
                    match frame {
                        Some(text) => self.handle_relay_frame(text).await,
                        None => self.mark_relay_closed(),
                    }
                }

                evt = self.transport_rx.recv() => {
                    match evt {
                        Some(e) => self.handle_transport_event(e).await,
                        None => {
                            warn!("Transport channel closed unexpectedly");
                            break;
                        }
                    }
                }
            }
        }

        self.teardown().await;
    }

    async fn acquire_media(&mut self) {
        self.set_state(CallState::AcquiringMedia);

        let stream = match self.devices.get_user_media(self.config.constraints).await {
            Ok(stream) => stream,
            Err(MediaError::PermissionDenied) => {
                warn!("Media permission denied; continuing receive-only");
                self.set_state(CallState::PermissionDenied);
                return;
            }
            Err(e) => {
                error!("Media capture failed: {}", e);
                self.emit(SessionEvent::MediaUnavailable(e.to_string()));
                self.set_state(CallState::Idle);
                return;
            }
        };

        match self.transport.add_local_tracks(&stream).await {
            Ok(tracks) => {
                info!("Local media ready: {} tracks", tracks);
                self.emit(SessionEvent::LocalMediaReady { tracks });
            }
            Err(e) => {
                error!("Failed to attach local tracks: {}", e);
                self.emit(SessionEvent::MediaUnavailable(e.to_string()));
            }
        }
        self.local_stream = Some(stream);

        match self.config.role {
            CallRole::Initiator => self.start_offer().await,
            CallRole::Responder => self.set_state(CallState::Idle),
        }
    }

    async fn start_offer(&mut self) {
        if let Err(e) = self.negotiation.begin_offer() {
            warn!("Not creating offer: {}", e);
            return;
        }
        self.set_state(CallState::Negotiating);

        match self.transport.create_offer().await {
            Ok(sdp) => {
                self.negotiation.offer_created(sdp.clone());
                info!("Sending offer");
                self.send_signal(SignalMessage::Offer {
                    offer: SessionDescription::offer(sdp),
                    from: Some(self.id),
                })
                .await;
            }
            Err(e) => self.fail_round("create offer", e.into()),
        }
    }

    async fn handle_command(&mut self, cmd: SessionCommand) {
        match cmd {
            SessionCommand::ToggleMedia { kind, reply } => {
                let _ = reply.send(self.toggle_media(kind));
            }

            SessionCommand::MediaState { reply } => {
                let _ = reply.send(self.media_state);
            }

            SessionCommand::SendChat { text, reply } => {
                let frame = json!({ "message": text }).to_string();
                let result = if self.relay_open {
                    self.relay.send(frame).await
                } else {
                    Err(RelayError::Closed)
                };
                if matches!(result, Err(RelayError::Closed)) {
                    self.mark_relay_closed();
                }
                let _ = reply.send(result.map_err(SessionError::from));
            }

            SessionCommand::HangUp => {}
        }
    }

    fn toggle_media(&mut self, kind: MediaKind) -> Result<MediaState> {
        let Some(stream) = self.local_stream.as_ref().filter(|s| s.has(kind)) else {
            warn!("Cannot toggle {}: no local {} track", kind, kind);
            return Err(SessionError::NoLocalMedia);
        };

        let enabled = self.media_state.toggle(kind);
        let touched = stream.set_enabled(kind, enabled);
        debug!("{} {} track(s) {}", kind, touched, if enabled { "enabled" } else { "disabled" });

        self.emit(SessionEvent::MediaStateChanged(self.media_state));
        Ok(self.media_state)
    }

    async fn handle_relay_frame(&mut self, text: String) {
        let msg = match decode_frame(&text) {
            Ok(RelayFrame::Signal(msg)) => msg,
            Ok(RelayFrame::Passthrough(value)) => {
                self.emit(SessionEvent::RelayMessage(value));
                return;
            }
            Err(e) => {
                warn!("Dropping relay frame: {}", e);
                return;
            }
        };

        if msg.sender() == Some(self.id) {
            debug!("Dropping our own {} echoed by the relay", msg.kind());
            return;
        }
        debug!("Relay in: {}", msg.kind());

        match msg {
            SignalMessage::Offer { offer, .. } => self.handle_remote_offer(offer).await,
            SignalMessage::Answer { answer, .. } => self.handle_remote_answer(answer).await,
            SignalMessage::IceCandidate { candidate, .. } => {
                self.handle_remote_candidate(candidate).await
            }
        }
    }

    async fn handle_remote_offer(&mut self, offer: SessionDescription) {
        if self.negotiation.is_own_offer(&offer.sdp) {
            debug!("Dropping our own offer echoed by the relay");
            return;
        }
        let offer = SessionDescription::offer(offer.sdp);
        let ours = self.negotiation.pending_offer().map(str::to_owned);

        match self.negotiation.remote_offer() {
            Ok(OfferDecision::Accept) => {}
            Ok(OfferDecision::RestartThenAccept) => {
                info!("Offer collision, discarding our offer");
                if let Err(e) = self.replace_transport().await {
                    error!("Failed to restart peer connection: {}", e);
                    if let Some(sdp) = ours {
                        self.negotiation.restore_local_offer(sdp);
                    }
                    self.emit(SessionEvent::NegotiationFailed(format!(
                        "restart peer connection: {e}"
                    )));
                    return;
                }
            }
            Ok(OfferDecision::Ignore) => {
                info!("Ignoring colliding remote offer");
                return;
            }
            Err(e) => {
                warn!("Ignoring remote offer: {}", e);
                return;
            }
        }

        info!("Received offer");
        self.set_state(CallState::Negotiating);

        if let Err(e) = self.transport.set_remote_description(&offer).await {
            self.fail_round("apply remote offer", e.into());
            return;
        }
        self.flush_candidates().await;

        let sdp = match self.transport.create_answer().await {
            Ok(sdp) => sdp,
            Err(e) => {
                self.fail_round("create answer", e.into());
                // The connection is left holding the remote offer.
                if let Err(e) = self.replace_transport().await {
                    error!("Failed to reset peer connection: {}", e);
                }
                return;
            }
        };

        info!("Sending answer");
        self.send_signal(SignalMessage::Answer {
            answer: SessionDescription::answer(sdp),
            from: Some(self.id),
        })
        .await;

        if let Err(e) = self.negotiation.answer_sent() {
            warn!("Answer bookkeeping out of step: {}", e);
        }
    }

    /// Swaps in a fresh peer connection carrying the same local tracks.
    /// webrtc-rs rejects a local rollback from have-local-offer, so this is
    /// the only way back to stable once our offer is set.
    async fn replace_transport(&mut self) -> Result<()> {
        let (transport_tx, transport_rx) = mpsc::channel(TRANSPORT_EVENT_CAPACITY);
        let transport = PeerTransport::new(&self.config.ice_servers, transport_tx).await?;

        if let Some(stream) = &self.local_stream {
            if let Err(e) = transport.add_local_tracks(stream).await {
                let _ = transport.close().await;
                return Err(e.into());
            }
        }

        let old = std::mem::replace(&mut self.transport, transport);
        // Events still queued from the old connection are dropped with it.
        self.transport_rx = transport_rx;
        if let Err(e) = old.close().await {
            warn!("Failed to close replaced peer connection: {}", e);
        }

        self.negotiation.transport_replaced();
        debug!("Peer connection replaced");
        Ok(())
    }

    async fn handle_remote_answer(&mut self, answer: SessionDescription) {
        if let Err(e) = self.negotiation.remote_answer() {
            warn!("Ignoring answer: {}", e);
            return;
        }

        info!("Received answer");
        let answer = SessionDescription::answer(answer.sdp);
        if let Err(e) = self.transport.set_remote_description(&answer).await {
            self.fail_round("apply remote answer", e.into());
            return;
        }
        self.flush_candidates().await;
    }

    async fn handle_remote_candidate(&mut self, candidate: IceCandidate) {
        let Some(candidate) = self.negotiation.remote_candidate(candidate) else {
            return;
        };
        self.apply_candidate(candidate).await;
    }

    async fn flush_candidates(&mut self) {
        let pending = self.negotiation.remote_description_applied();
        if !pending.is_empty() {
            debug!("Applying {} buffered candidates", pending.len());
        }
        for candidate in pending {
            self.apply_candidate(candidate).await;
        }
    }

    async fn apply_candidate(&mut self, candidate: IceCandidate) {
        if let Err(e) = self.transport.add_ice_candidate(candidate).await {
            warn!("Failed to add remote ICE candidate: {}", e);
        }
    }

    async fn handle_transport_event(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::CandidateGenerated(candidate) => {
                self.send_signal(SignalMessage::IceCandidate {
                    candidate,
                    from: Some(self.id),
                })
                .await;
            }

            TransportEvent::StateChanged(state) => {
                let mapped = match state {
                    RTCPeerConnectionState::Connecting => CallState::Negotiating,
                    RTCPeerConnectionState::Connected => CallState::Connected,
                    RTCPeerConnectionState::Disconnected => CallState::Disconnected,
                    RTCPeerConnectionState::Failed => CallState::Failed,
                    RTCPeerConnectionState::Closed => CallState::Closed,
                    _ => return,
                };
                self.set_state(mapped);
            }

            TransportEvent::RemoteTrack { kind, id } => {
                info!("Receiving remote {} track {}", kind, id);
                self.emit(SessionEvent::RemoteTrack { kind, id });
            }
        }
    }

    async fn send_signal(&mut self, msg: SignalMessage) {
        if !self.relay_open {
            warn!("Relay is closed, dropping outgoing {}", msg.kind());
            return;
        }

        let text = match encode_signal(&msg) {
            Ok(text) => text,
            Err(e) => {
                error!("Failed to encode {}: {}", msg.kind(), e);
                return;
            }
        };

        match self.relay.send(text).await {
            Ok(()) => {}
            Err(RelayError::Closed) => self.mark_relay_closed(),
            Err(e) => error!("Failed to send {} to relay: {}", msg.kind(), e),
        }
    }

    fn mark_relay_closed(&mut self) {
        if self.relay_open {
            warn!("Relay connection closed");
            self.relay_open = false;
            self.emit(SessionEvent::RelayClosed);
        }
    }

    fn fail_round(&mut self, step: &str, err: SessionError) {
        error!("Failed to {}: {}", step, err);
        self.negotiation.abandon_round();
        self.emit(SessionEvent::NegotiationFailed(format!("{step}: {err}")));
    }

    fn set_state(&mut self, state: CallState) {
        if self.call_state == state {
            return;
        }
        debug!("Call state {:?} -> {:?}", self.call_state, state);
        self.call_state = state;
        self.emit(SessionEvent::StateChanged(state));
    }

    fn emit(&self, event: SessionEvent) {
        let _ = self.event_tx.send(event);
    }

    async fn teardown(&mut self) {
        self.negotiation.close();

        self.relay.close().await;
        self.relay_open = false;

        if let Err(e) = self.transport.close().await {
            warn!("Failed to close peer connection: {}", e);
        }
        let connection_closed = self.transport.connection_state() == RTCPeerConnectionState::Closed;

        if let Some(mut stream) = self.local_stream.take() {
            stream.stop();
        }

        self.set_state(CallState::Closed);
        self.emit(SessionEvent::Closed { connection_closed });
        info!("Call session {} finished", self.id);
    }
}
