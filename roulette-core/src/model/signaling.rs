use crate::model::participant::ParticipantId;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IceServerConfig {
    pub urls: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential: Option<String>,
}

/// Negotiation step tag. Routing only, the payload is never inspected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SignalKind {
    Offer,
    Answer,
    Candidate,
}

/// Why a session ended, from the point of view of the member being told.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EndReason {
    PartnerNext,
    PartnerDisconnected,
    /// The server found the session inconsistent and dropped it.
    SessionReset,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorCode {
    ProtocolViolation,
    MalformedFrame,
}

/// Frames sent by a participant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    content = "payload",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum ClientSignal {
    /// End the current session (if any) and look for someone else.
    Next,
    /// Opaque negotiation payload for the current partner.
    /// `to_id` defaults to the current partner when absent.
    Signal {
        kind: SignalKind,
        payload: Value,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        to_id: Option<ParticipantId>,
    },
    /// Text message for the current partner.
    Chat { text: String },
    /// Leave the lobby; the connection is closed afterwards.
    Leave,
}

/// Frames sent to a participant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    content = "payload",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum ServerSignal {
    Welcome {
        participant_id: ParticipantId,
        ice_servers: Vec<IceServerConfig>,
    },
    Waiting,
    /// Exactly one member of a fresh match gets `initiator = true` and
    /// is expected to create the offer.
    Matched {
        partner_id: ParticipantId,
        initiator: bool,
    },
    Signal {
        kind: SignalKind,
        payload: Value,
        from_id: ParticipantId,
    },
    Chat {
        text: String,
        from_id: ParticipantId,
    },
    SessionEnded {
        reason: EndReason,
    },
    Error {
        code: ErrorCode,
        message: String,
    },
}
