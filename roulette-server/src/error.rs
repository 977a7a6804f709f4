use roulette_core::ParticipantId;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LobbyError {
    /// The participant asked for something its current state does not allow,
    /// e.g. signaling without a partner or to someone else's partner.
    #[error("protocol violation by {participant}: {reason}")]
    ProtocolViolation {
        participant: ParticipantId,
        reason: String,
    },

    /// The id is not (or no longer) registered.
    #[error("participant {0} is not connected")]
    StaleReference(ParticipantId),

    /// Registry, pool and match table disagree. Unreachable unless there is a bug.
    #[error("lobby invariant violated: {0}")]
    InvariantViolation(String),

    #[error("lobby task is not running")]
    LobbyClosed,
}

impl LobbyError {
    pub(crate) fn protocol(participant: &ParticipantId, reason: impl Into<String>) -> Self {
        Self::ProtocolViolation {
            participant: participant.clone(),
            reason: reason.into(),
        }
    }
}
