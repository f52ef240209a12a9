use serde::Deserialize;
use telecall_core::utils::{DEFAULT_STUN_ADDR, DEFAULT_STUN_ADDR_2};
use telecall_core::{IceServerConfig, MediaConstraints};
use url::Url;

/// Who opens the negotiation once local media is ready.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallRole {
    /// Sends an offer as soon as local media is attached.
    #[default]
    Initiator,
    /// Waits for the remote side to offer.
    Responder,
}

/// Settings for one call session.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// WebSocket relay endpoint, e.g. `ws://localhost:8000/ws/chat/`.
    pub relay_url: String,
    /// Appended to the relay URL as the `token` query parameter.
    pub auth_token: Option<String>,
    pub ice_servers: Vec<IceServerConfig>,
    pub role: CallRole,
    /// On offer collision a polite session drops its own offer and answers.
    pub polite: bool,
    pub constraints: MediaConstraints,
    /// Capacity of the session event channel.
    pub event_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            relay_url: "ws://localhost:8000/ws/chat/".to_owned(),
            auth_token: None,
            ice_servers: vec![IceServerConfig {
                urls: vec![DEFAULT_STUN_ADDR.to_owned(), DEFAULT_STUN_ADDR_2.to_owned()],
                username: None,
                credential: None,
            }],
            role: CallRole::default(),
            polite: false,
            constraints: MediaConstraints::default(),
            event_capacity: 64,
        }
    }
}

impl SessionConfig {
    /// Relay URL with the auth token attached.
    pub fn relay_endpoint(&self) -> Result<Url, url::ParseError> {
        let mut url = Url::parse(&self.relay_url)?;
        if let Some(token) = &self.auth_token {
            url.query_pairs_mut().append_pair("token", token);
        }
        Ok(url)
    }
}
