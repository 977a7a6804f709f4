use crate::error::LobbyError;
use roulette_core::ParticipantId;
use std::collections::HashMap;

/// Where a participant currently is. A participant is in exactly one place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParticipantState {
    /// Connected but neither waiting nor matched. Only observed transiently,
    /// between a match being dissolved and the member re-entering the pool.
    Idle,
    Waiting,
    Matched { partner: ParticipantId },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    pub id: ParticipantId,
    pub state: ParticipantState,
}

impl Participant {
    pub fn partner_id(&self) -> Option<&ParticipantId> {
        match &self.state {
            ParticipantState::Matched { partner } => Some(partner),
            _ => None,
        }
    }

    pub fn is_waiting(&self) -> bool {
        self.state == ParticipantState::Waiting
    }
}

/// Every live connection and its state.
///
/// State is only changed by the lobby (matchmaker and lifecycle
/// transitions), hence `set_state` is crate-private.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    participants: HashMap<ParticipantId, Participant>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new connection under a fresh id. New participants are
    /// `Waiting` right away; the caller is expected to enqueue them.
    pub fn register(&mut self) -> ParticipantId {
        let mut id = ParticipantId::new();
        while self.participants.contains_key(&id) {
            id = ParticipantId::new();
        }

        self.participants.insert(
            id.clone(),
            Participant {
                id: id.clone(),
                state: ParticipantState::Waiting,
            },
        );
        id
    }

    /// Removes the participant. Idempotent: a second call returns `None`.
    ///
    /// This only forgets the entry; dissolving a match the participant was in
    /// is the lobby's job and must happen first.
    pub fn unregister(&mut self, id: &ParticipantId) -> Option<Participant> {
        self.participants.remove(id)
    }

    pub fn get(&self, id: &ParticipantId) -> Option<&Participant> {
        self.participants.get(id)
    }

    pub fn contains(&self, id: &ParticipantId) -> bool {
        self.participants.contains_key(id)
    }

    pub(crate) fn set_state(
        &mut self,
        id: &ParticipantId,
        state: ParticipantState,
    ) -> Result<(), LobbyError> {
        let participant = self
            .participants
            .get_mut(id)
            .ok_or_else(|| LobbyError::StaleReference(id.clone()))?;
        participant.state = state;
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Participant> {
        self.participants.values()
    }

    pub fn len(&self) -> usize {
        self.participants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }
}
