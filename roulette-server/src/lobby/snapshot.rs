use roulette_core::ParticipantId;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchSummary {
    pub initiator: ParticipantId,
    pub responder: ParticipantId,
}

impl MatchSummary {
    pub fn contains(&self, id: &ParticipantId) -> bool {
        &self.initiator == id || &self.responder == id
    }
}

/// Point-in-time view of the lobby, taken inside its critical section.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LobbySnapshot {
    pub connected: usize,
    /// Longest-waiting first.
    pub waiting: Vec<ParticipantId>,
    /// Oldest match first.
    pub matches: Vec<MatchSummary>,
    /// Inconsistencies between registry, pool and matches. Always empty
    /// unless there is a bug.
    pub violations: Vec<String>,
}

impl LobbySnapshot {
    pub fn stats(&self) -> LobbyStats {
        LobbyStats {
            connected: self.connected,
            waiting: self.waiting.len(),
            matched: self.matches.len() * 2,
        }
    }

    pub fn match_of(&self, id: &ParticipantId) -> Option<&MatchSummary> {
        self.matches.iter().find(|m| m.contains(id))
    }

    pub fn is_waiting(&self, id: &ParticipantId) -> bool {
        self.waiting.contains(id)
    }
}

/// Counts served by `GET /stats`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LobbyStats {
    pub connected: usize,
    pub waiting: usize,
    pub matched: usize,
}
