use roulette_core::ParticipantId;
use std::collections::{BTreeMap, HashMap};

/// Participants looking for a partner.
///
/// A set ordered by arrival: `dequeue_any` always hands out the participant
/// that has been waiting longest, which keeps pairing deterministic for a
/// given sequence of events.
#[derive(Debug, Default)]
pub struct WaitingPool {
    next_ticket: u64,
    by_ticket: BTreeMap<u64, ParticipantId>,
    tickets: HashMap<ParticipantId, u64>,
}

impl WaitingPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the participant. Returns `false` (and keeps its place) if it was
    /// already waiting.
    pub fn enqueue(&mut self, id: ParticipantId) -> bool {
        if self.tickets.contains_key(&id) {
            return false;
        }

        let ticket = self.next_ticket;
        self.next_ticket += 1;
        self.by_ticket.insert(ticket, id.clone());
        self.tickets.insert(id, ticket);
        true
    }

    pub fn dequeue_any(&mut self) -> Option<ParticipantId> {
        let (_, id) = self.by_ticket.pop_first()?;
        self.tickets.remove(&id);
        Some(id)
    }

    pub fn remove(&mut self, id: &ParticipantId) -> bool {
        let Some(ticket) = self.tickets.remove(id) else {
            return false;
        };
        self.by_ticket.remove(&ticket);
        true
    }

    pub fn contains(&self, id: &ParticipantId) -> bool {
        self.tickets.contains_key(id)
    }

    /// Waiting participants, longest-waiting first.
    pub fn iter(&self) -> impl Iterator<Item = &ParticipantId> {
        self.by_ticket.values()
    }

    pub fn len(&self) -> usize {
        self.tickets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tickets.is_empty()
    }
}
