use async_trait::async_trait;
use roulette_core::{
    EndReason, ErrorCode, IceServerConfig, ParticipantId, ServerSignal, SignalKind,
};
use serde_json::Value;
use tokio::sync::mpsc;

/// Per-connection outbound queue. Unbounded so the lobby never waits on a
/// slow socket.
pub type Outbox = mpsc::UnboundedSender<ServerSignal>;

/// Whatever carries frames back to participants (the WebSocket layer in
/// production, a recorder in tests).
///
/// `deliver` must not block on the network: it hands the frame off and
/// reports whether the participant still had an open channel.
#[async_trait]
pub trait SignalingOutput: Send + Sync {
    fn attach(&self, participant: ParticipantId, outbox: Outbox);

    fn detach(&self, participant: &ParticipantId);

    async fn deliver(&self, participant: &ParticipantId, signal: ServerSignal) -> bool;

    async fn send_welcome(
        &self,
        participant: &ParticipantId,
        ice_servers: Vec<IceServerConfig>,
    ) -> bool {
        let signal = ServerSignal::Welcome {
            participant_id: participant.clone(),
            ice_servers,
        };
        self.deliver(participant, signal).await
    }

    async fn send_waiting(&self, participant: &ParticipantId) -> bool {
        self.deliver(participant, ServerSignal::Waiting).await
    }

    async fn send_matched(
        &self,
        participant: &ParticipantId,
        partner: &ParticipantId,
        initiator: bool,
    ) -> bool {
        let signal = ServerSignal::Matched {
            partner_id: partner.clone(),
            initiator,
        };
        self.deliver(participant, signal).await
    }

    async fn send_signal(
        &self,
        participant: &ParticipantId,
        from: &ParticipantId,
        kind: SignalKind,
        payload: Value,
    ) -> bool {
        let signal = ServerSignal::Signal {
            kind,
            payload,
            from_id: from.clone(),
        };
        self.deliver(participant, signal).await
    }

    async fn send_chat(&self, participant: &ParticipantId, from: &ParticipantId, text: String) -> bool {
        let signal = ServerSignal::Chat {
            text,
            from_id: from.clone(),
        };
        self.deliver(participant, signal).await
    }

    async fn send_session_ended(&self, participant: &ParticipantId, reason: EndReason) -> bool {
        self.deliver(participant, ServerSignal::SessionEnded { reason })
            .await
    }

    async fn send_error(&self, participant: &ParticipantId, code: ErrorCode, message: String) -> bool {
        self.deliver(participant, ServerSignal::Error { code, message })
            .await
    }
}
