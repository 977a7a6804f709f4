use crate::error::LobbyError;
use crate::lobby::registry::{ConnectionRegistry, ParticipantState};
use crate::lobby::waiting_pool::WaitingPool;
use roulette_core::ParticipantId;
use std::collections::HashMap;
use std::fmt;
use tracing::{error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MatchId(u64);

impl fmt::Display for MatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "match-{}", self.0)
    }
}

/// An active pairing. The initiator is the member that had been waiting
/// longer; it is the one expected to send the first offer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    pub id: MatchId,
    pub initiator: ParticipantId,
    pub responder: ParticipantId,
}

impl Match {
    pub fn members(&self) -> [&ParticipantId; 2] {
        [&self.initiator, &self.responder]
    }

    pub fn contains(&self, id: &ParticipantId) -> bool {
        &self.initiator == id || &self.responder == id
    }

    /// The member that is not `id`, if `id` is a member at all.
    pub fn other(&self, id: &ParticipantId) -> Option<&ParticipantId> {
        if &self.initiator == id {
            Some(&self.responder)
        } else if &self.responder == id {
            Some(&self.initiator)
        } else {
            None
        }
    }
}

/// Owns the match table and moves participants between the pool and matches.
///
/// Every method takes the registry and pool by `&mut`, so callers can only
/// use it from inside the lobby's single critical section.
#[derive(Debug, Default)]
pub struct Matchmaker {
    next_id: u64,
    matches: HashMap<MatchId, Match>,
    by_member: HashMap<ParticipantId, MatchId>,
}

impl Matchmaker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pairs waiting participants until fewer than two are left.
    /// Returns the matches formed, oldest pair first.
    pub fn try_match(
        &mut self,
        registry: &mut ConnectionRegistry,
        pool: &mut WaitingPool,
    ) -> Vec<Match> {
        let mut formed = Vec::new();

        while pool.len() >= 2 {
            let (Some(first), Some(second)) = (pool.dequeue_any(), pool.dequeue_any()) else {
                break;
            };

            let first_ok = self.is_eligible(registry, &first);
            let second_ok = self.is_eligible(registry, &second);

            if first_ok && second_ok {
                match self.pair(registry, first, second) {
                    Ok(new_match) => {
                        info!(
                            "{} formed: {} <-> {}",
                            new_match.id, new_match.initiator, new_match.responder
                        );
                        formed.push(new_match);
                    }
                    Err(e) => error!("Pairing failed: {}", e),
                }
                continue;
            }

            // Something in the pool is not a waiting participant. Drop it and
            // give the healthy one back to the pool.
            for (id, ok) in [(first, first_ok), (second, second_ok)] {
                if ok {
                    pool.enqueue(id);
                } else {
                    error!(
                        "{}",
                        LobbyError::InvariantViolation(format!(
                            "{} was in the waiting pool but is not waiting",
                            id
                        ))
                    );
                }
            }
        }

        formed
    }

    /// Removes the match `member` belongs to and leaves both members `Idle`.
    /// Members that are no longer registered are skipped.
    pub fn dissolve(
        &mut self,
        registry: &mut ConnectionRegistry,
        member: &ParticipantId,
    ) -> Option<Match> {
        let match_id = self.by_member.remove(member)?;
        let removed = self.matches.remove(&match_id)?;

        for id in removed.members() {
            self.by_member.remove(id);
            if registry.contains(id) {
                let _ = registry.set_state(id, ParticipantState::Idle);
            }
        }

        info!(
            "{} dissolved: {} <-> {}",
            removed.id, removed.initiator, removed.responder
        );
        Some(removed)
    }

    pub fn match_of(&self, id: &ParticipantId) -> Option<&Match> {
        self.by_member
            .get(id)
            .and_then(|match_id| self.matches.get(match_id))
    }

    /// Checks that both members of `m` are registered and point at each other.
    pub fn verify(&self, registry: &ConnectionRegistry, m: &Match) -> Result<(), LobbyError> {
        for (member, expected_partner) in [
            (&m.initiator, &m.responder),
            (&m.responder, &m.initiator),
        ] {
            let partner = registry.get(member).and_then(|p| p.partner_id());
            if partner != Some(expected_partner) {
                return Err(LobbyError::InvariantViolation(format!(
                    "{}: {} does not point back at {}",
                    m.id, member, expected_partner
                )));
            }
        }
        Ok(())
    }

    /// Full cross-check of registry, pool and match table. Returns a
    /// description of every inconsistency found.
    pub fn audit(&self, registry: &ConnectionRegistry, pool: &WaitingPool) -> Vec<String> {
        let mut problems = Vec::new();

        for m in self.matches.values() {
            if let Err(e) = self.verify(registry, m) {
                problems.push(e.to_string());
            }
            if m.initiator == m.responder {
                problems.push(format!("{} pairs {} with itself", m.id, m.initiator));
            }
            for id in m.members() {
                if self.by_member.get(id) != Some(&m.id) {
                    problems.push(format!("{} is not indexed under {}", id, m.id));
                }
                if pool.contains(id) {
                    problems.push(format!("{} is both waiting and in {}", id, m.id));
                }
            }
        }

        if self.by_member.len() != self.matches.len() * 2 {
            problems.push(format!(
                "{} indexed members for {} matches",
                self.by_member.len(),
                self.matches.len()
            ));
        }

        for participant in registry.iter() {
            let in_pool = pool.contains(&participant.id);
            match &participant.state {
                ParticipantState::Waiting if !in_pool => {
                    problems.push(format!("{} is waiting but not in the pool", participant.id));
                }
                ParticipantState::Matched { partner } => {
                    let other = self.match_of(&participant.id).and_then(|m| m.other(&participant.id));
                    if other != Some(partner) {
                        problems.push(format!(
                            "{} claims partner {} without a matching record",
                            participant.id, partner
                        ));
                    }
                }
                ParticipantState::Idle if in_pool => {
                    problems.push(format!("{} is idle but in the pool", participant.id));
                }
                _ => {}
            }
        }

        for id in pool.iter() {
            if !registry.contains(id) {
                problems.push(format!("{} is in the pool but not registered", id));
            }
        }

        problems
    }

    pub fn iter(&self) -> impl Iterator<Item = &Match> {
        self.matches.values()
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    fn is_eligible(&self, registry: &ConnectionRegistry, id: &ParticipantId) -> bool {
        registry.get(id).is_some_and(|p| p.is_waiting()) && !self.by_member.contains_key(id)
    }

    fn pair(
        &mut self,
        registry: &mut ConnectionRegistry,
        initiator: ParticipantId,
        responder: ParticipantId,
    ) -> Result<Match, LobbyError> {
        if initiator == responder {
            return Err(LobbyError::InvariantViolation(format!(
                "attempted to pair {} with itself",
                initiator
            )));
        }

        registry.set_state(
            &initiator,
            ParticipantState::Matched {
                partner: responder.clone(),
            },
        )?;
        registry.set_state(
            &responder,
            ParticipantState::Matched {
                partner: initiator.clone(),
            },
        )?;

        let id = MatchId(self.next_id);
        self.next_id += 1;

        let new_match = Match {
            id,
            initiator,
            responder,
        };
        self.by_member.insert(new_match.initiator.clone(), id);
        self.by_member.insert(new_match.responder.clone(), id);
        self.matches.insert(id, new_match.clone());
        Ok(new_match)
    }
}
