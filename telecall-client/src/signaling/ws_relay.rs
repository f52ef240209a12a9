use crate::error::RelayError;
use crate::signaling::SignalingRelay;
use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};
use url::Url;

const CLOSE_GRACE: Duration = Duration::from_secs(1);

/// WebSocket client for the signaling relay.
pub struct WsRelay {
    outbound: Option<mpsc::UnboundedSender<Message>>,
    inbound: mpsc::UnboundedReceiver<String>,
    send_task: JoinHandle<()>,
    recv_task: JoinHandle<()>,
}

impl WsRelay {
    pub async fn connect(endpoint: Url) -> Result<Self, RelayError> {
        let (socket, _) = connect_async(endpoint.as_str()).await?;
        info!(
            "Connected to relay {}{}",
            endpoint.host_str().unwrap_or_default(),
            endpoint.path()
        );

        let (mut sender, mut receiver) = socket.split();
        let (out_tx, mut out_rx) = mpsc::unbounded_channel::<Message>();
        let (in_tx, in_rx) = mpsc::unbounded_channel::<String>();

        let send_task = tokio::spawn(async move {
            while let Some(msg) = out_rx.recv().await {
                let closing = matches!(msg, Message::Close(_));
                if let Err(e) = sender.send(msg).await {
                    warn!("Relay send failed: {}", e);
                    break;
                }
                if closing {
                    break;
                }
            }
            let _ = sender.close().await;
        });

        let recv_task = tokio::spawn(async move {
            while let Some(frame) = receiver.next().await {
                match frame {
                    Ok(Message::Text(text)) => {
                        if in_tx.send(text.to_string()).is_err() {
                            break;
                        }
                    }
                    Ok(Message::Close(_)) => break,
                    Ok(_) => {}
                    Err(e) => {
                        warn!("Relay receive failed: {}", e);
                        break;
                    }
                }
            }
            debug!("Relay receive loop finished");
        });

        Ok(Self {
            outbound: Some(out_tx),
            inbound: in_rx,
            send_task,
            recv_task,
        })
    }
}

#[async_trait]
impl SignalingRelay for WsRelay {
    async fn send(&mut self, text: String) -> Result<(), RelayError> {
        let outbound = self.outbound.as_ref().ok_or(RelayError::Closed)?;
        outbound
            .send(Message::text(text))
            .map_err(|_| RelayError::Closed)
    }

    async fn recv(&mut self) -> Option<String> {
        self.inbound.recv().await
    }

    async fn close(&mut self) {
        let Some(outbound) = self.outbound.take() else {
            return;
        };
        let _ = outbound.send(Message::Close(None));
        drop(outbound);

        if tokio::time::timeout(CLOSE_GRACE, &mut self.send_task)
            .await
            .is_err()
        {
            self.send_task.abort();
        }
        self.recv_task.abort();
        info!("Relay connection closed");
    }
}

impl Drop for WsRelay {
    fn drop(&mut self) {
        self.send_task.abort();
        self.recv_task.abort();
    }
}
