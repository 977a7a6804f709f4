use crate::lobby::{LobbySnapshot, LobbyStats};
use crate::signaling::Outbox;
use roulette_core::{ParticipantId, SignalKind};
use serde_json::Value;
use tokio::sync::oneshot;

/// Events fed into the lobby by the transport layer, applied one at a time.
#[derive(Debug)]
pub enum LobbyCommand {
    /// A new connection. The lobby registers it and answers with its id.
    Connect {
        outbox: Outbox,
        reply: oneshot::Sender<ParticipantId>,
    },

    /// "Skip to the next partner".
    Next { participant: ParticipantId },

    /// The connection is gone (socket closed, errored or the client left).
    Disconnect { participant: ParticipantId },

    /// Negotiation payload for the sender's current partner.
    Signal {
        participant: ParticipantId,
        kind: SignalKind,
        payload: Value,
        to: Option<ParticipantId>,
    },

    /// Text message for the sender's current partner.
    Chat {
        participant: ParticipantId,
        text: String,
    },

    /// Full state plus an audit. Walks every participant.
    Snapshot {
        reply: oneshot::Sender<LobbySnapshot>,
    },

    /// Counts for `/stats`.
    Stats {
        reply: oneshot::Sender<LobbyStats>,
    },
}
