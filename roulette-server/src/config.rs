use clap::Parser;
use roulette_core::IceServerConfig;
use std::net::SocketAddr;

pub const DEFAULT_STUN_URL: &str = "stun:stun.l.google.com:19302";

/// Settings the lobby actor needs.
#[derive(Debug, Clone)]
pub struct LobbyConfig {
    /// Handed to every participant in its `welcome` frame.
    pub ice_servers: Vec<IceServerConfig>,
    /// Capacity of the lobby's command queue.
    pub command_buffer: usize,
    /// Longest chat text relayed, in characters.
    pub max_chat_len: usize,
}

impl Default for LobbyConfig {
    fn default() -> Self {
        Self {
            ice_servers: vec![IceServerConfig {
                urls: vec![DEFAULT_STUN_URL.to_owned()],
                username: None,
                credential: None,
            }],
            command_buffer: 256,
            max_chat_len: 2000,
        }
    }
}

/// Command line / environment configuration of the server binary.
#[derive(Debug, Clone, Parser)]
#[command(name = "roulette", version, about = "Random pairing and WebRTC signaling relay")]
pub struct ServerConfig {
    /// Address the HTTP/WebSocket listener binds to.
    #[arg(long, env = "ROULETTE_BIND", default_value = "0.0.0.0:3000")]
    pub bind: SocketAddr,

    #[arg(long, env = "ROULETTE_STUN_URL", default_value = DEFAULT_STUN_URL)]
    pub stun_url: String,

    #[arg(long, env = "TURN_URL")]
    pub turn_url: Option<String>,

    #[arg(long, env = "TURN_USERNAME")]
    pub turn_username: Option<String>,

    #[arg(long, env = "TURN_CREDENTIAL")]
    pub turn_credential: Option<String>,

    #[arg(long, env = "ROULETTE_COMMAND_BUFFER", default_value_t = 256)]
    pub command_buffer: usize,

    #[arg(long, env = "ROULETTE_MAX_CHAT_LEN", default_value_t = 2000)]
    pub max_chat_len: usize,
}

impl ServerConfig {
    pub fn ice_servers(&self) -> Vec<IceServerConfig> {
        let mut servers = vec![IceServerConfig {
            urls: vec![self.stun_url.clone()],
            username: None,
            credential: None,
        }];

        if let Some(turn_url) = &self.turn_url {
            servers.push(IceServerConfig {
                urls: vec![turn_url.clone()],
                username: self.turn_username.clone(),
                credential: self.turn_credential.clone(),
            });
        }

        servers
    }

    pub fn lobby_config(&self) -> LobbyConfig {
        LobbyConfig {
            ice_servers: self.ice_servers(),
            command_buffer: self.command_buffer.max(1),
            max_chat_len: self.max_chat_len,
        }
    }
}
