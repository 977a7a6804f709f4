use crate::config::LobbyConfig;
use crate::error::LobbyError;
use crate::lobby::lobby::Lobby;
use crate::lobby::lobby_command::LobbyCommand;
use crate::lobby::snapshot::{LobbySnapshot, LobbyStats};
use crate::signaling::{Outbox, SignalingOutput};
use roulette_core::{ParticipantId, SignalKind};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::info;

/// Cloneable entry point into a running `Lobby`.
#[derive(Clone)]
pub struct LobbyHandle {
    command_tx: mpsc::Sender<LobbyCommand>,
}

impl LobbyHandle {
    /// Starts a lobby on the current tokio runtime.
    pub fn spawn(config: LobbyConfig, signaling: Arc<dyn SignalingOutput>) -> Self {
        let (tx, rx) = mpsc::channel(config.command_buffer.max(1));
        let lobby = Lobby::new(config, rx, signaling);

        info!("Spawning lobby");
        tokio::spawn(lobby.run());

        Self { command_tx: tx }
    }

    pub async fn connect(&self, outbox: Outbox) -> Result<ParticipantId, LobbyError> {
        let (reply, rx) = oneshot::channel();
        self.send(LobbyCommand::Connect { outbox, reply }).await?;
        rx.await.map_err(|_| LobbyError::LobbyClosed)
    }

    pub async fn next(&self, participant: ParticipantId) -> Result<(), LobbyError> {
        self.send(LobbyCommand::Next { participant }).await
    }

    pub async fn disconnect(&self, participant: ParticipantId) -> Result<(), LobbyError> {
        self.send(LobbyCommand::Disconnect { participant }).await
    }

    pub async fn signal(
        &self,
        participant: ParticipantId,
        kind: SignalKind,
        payload: Value,
        to: Option<ParticipantId>,
    ) -> Result<(), LobbyError> {
        self.send(LobbyCommand::Signal {
            participant,
            kind,
            payload,
            to,
        })
        .await
    }

    pub async fn chat(&self, participant: ParticipantId, text: String) -> Result<(), LobbyError> {
        self.send(LobbyCommand::Chat { participant, text }).await
    }

    /// Waits until every command sent before this one has been applied,
    /// then returns the resulting state.
    pub async fn snapshot(&self) -> Result<LobbySnapshot, LobbyError> {
        let (reply, rx) = oneshot::channel();
        self.send(LobbyCommand::Snapshot { reply }).await?;
        rx.await.map_err(|_| LobbyError::LobbyClosed)
    }

    /// Counts only. Cheap enough to poll.
    pub async fn stats(&self) -> Result<LobbyStats, LobbyError> {
        let (reply, rx) = oneshot::channel();
        self.send(LobbyCommand::Stats { reply }).await?;
        rx.await.map_err(|_| LobbyError::LobbyClosed)
    }

    async fn send(&self, cmd: LobbyCommand) -> Result<(), LobbyError> {
        self.command_tx
            .send(cmd)
            .await
            .map_err(|_| LobbyError::LobbyClosed)
    }
}
