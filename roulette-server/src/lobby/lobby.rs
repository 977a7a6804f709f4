use crate::config::LobbyConfig;
use crate::error::LobbyError;
use crate::lobby::lobby_command::LobbyCommand;
use crate::lobby::matchmaker::{Match, Matchmaker};
use crate::lobby::registry::{ConnectionRegistry, ParticipantState};
use crate::lobby::snapshot::{LobbySnapshot, LobbyStats, MatchSummary};
use crate::lobby::waiting_pool::WaitingPool;
use crate::signaling::{Outbox, SignalingOutput};
use roulette_core::{EndReason, ErrorCode, ParticipantId, SignalKind};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// The lobby actor.
///
/// Owns the registry, the waiting pool and the match table and applies
/// commands strictly one after another, so every transition below runs as a
/// single critical section. Outbound frames go through `SignalingOutput`,
/// which never waits on a socket.
pub struct Lobby {
    config: LobbyConfig,
    registry: ConnectionRegistry,
    pool: WaitingPool,
    matchmaker: Matchmaker,
    command_rx: mpsc::Receiver<LobbyCommand>,
    signaling: Arc<dyn SignalingOutput>,
}

impl Lobby {
    pub fn new(
        config: LobbyConfig,
        command_rx: mpsc::Receiver<LobbyCommand>,
        signaling: Arc<dyn SignalingOutput>,
    ) -> Self {
        Self {
            config,
            registry: ConnectionRegistry::new(),
            pool: WaitingPool::new(),
            matchmaker: Matchmaker::new(),
            command_rx,
            signaling,
        }
    }

    /// Event loop. Returns once every `LobbyHandle` has been dropped.
    pub async fn run(mut self) {
        info!("Lobby event loop started");

        while let Some(cmd) = self.command_rx.recv().await {
            self.handle_command(cmd).await;
        }

        info!("Command channel closed. Lobby event loop finished");
    }

    async fn handle_command(&mut self, cmd: LobbyCommand) {
        match cmd {
            LobbyCommand::Connect { outbox, reply } => {
                let participant = self.connect(outbox).await;
                if reply.send(participant.clone()).is_err() {
                    warn!("Connection {} went away during registration", participant);
                    let result = self.disconnect(&participant).await;
                    self.report(&participant, result).await;
                }
            }

            LobbyCommand::Next { participant } => {
                let result = self.next(&participant).await;
                self.report(&participant, result).await;
            }

            LobbyCommand::Disconnect { participant } => {
                let result = self.disconnect(&participant).await;
                self.report(&participant, result).await;
            }

            LobbyCommand::Signal {
                participant,
                kind,
                payload,
                to,
            } => {
                let result = self.relay(&participant, kind, payload, to.as_ref()).await;
                self.report(&participant, result).await;
            }

            LobbyCommand::Chat { participant, text } => {
                let result = self.relay_chat(&participant, text).await;
                self.report(&participant, result).await;
            }

            LobbyCommand::Snapshot { reply } => {
                let _ = reply.send(self.snapshot());
            }

            LobbyCommand::Stats { reply } => {
                let _ = reply.send(self.stats());
            }
        }
    }

    /// Registers a new connection, puts it in the pool and tries to pair it.
    pub async fn connect(&mut self, outbox: Outbox) -> ParticipantId {
        let participant = self.registry.register();
        self.signaling.attach(participant.clone(), outbox);
        info!("Participant {} connected", participant);

        self.signaling
            .send_welcome(&participant, self.config.ice_servers.clone())
            .await;

        self.pool.enqueue(participant.clone());
        self.signaling.send_waiting(&participant).await;

        self.run_matchmaker().await;
        participant
    }

    /// Ends the participant's session (if any) and sends both former members
    /// back to the pool. The partner is told with `sessionEnded`.
    pub async fn next(&mut self, participant: &ParticipantId) -> Result<(), LobbyError> {
        let state = self
            .registry
            .get(participant)
            .map(|p| p.state.clone())
            .ok_or_else(|| LobbyError::StaleReference(participant.clone()))?;

        match state {
            ParticipantState::Matched { .. } => {
                info!("Participant {} asked for the next partner", participant);
                let former_partner = self.end_session(participant, EndReason::PartnerNext).await;

                self.enter_pool(participant).await?;
                if let Some(partner) = former_partner {
                    self.enter_pool(&partner).await?;
                }
            }
            ParticipantState::Idle => self.enter_pool(participant).await?,
            ParticipantState::Waiting => {
                debug!("Participant {} is already waiting", participant);
            }
        }

        self.run_matchmaker().await;
        Ok(())
    }

    /// Removes the participant. A partner it had goes back to the pool.
    /// Unknown ids are ignored, so duplicate disconnects are harmless.
    pub async fn disconnect(&mut self, participant: &ParticipantId) -> Result<(), LobbyError> {
        let Some(state) = self.registry.get(participant).map(|p| p.state.clone()) else {
            debug!("Disconnect for unknown participant {} ignored", participant);
            return Ok(());
        };

        let former_partner = match state {
            ParticipantState::Matched { .. } => {
                self.end_session(participant, EndReason::PartnerDisconnected)
                    .await
            }
            ParticipantState::Waiting | ParticipantState::Idle => None,
        };

        self.pool.remove(participant);
        self.registry.unregister(participant);
        self.signaling.detach(participant);
        info!("Participant {} disconnected", participant);

        if let Some(partner) = former_partner {
            self.enter_pool(&partner).await?;
        }

        self.run_matchmaker().await;
        Ok(())
    }

    /// Forwards a negotiation payload to the sender's current partner.
    ///
    /// `to`, when given, must name that partner. Nothing is buffered: if the
    /// partner's channel is already gone the payload is dropped.
    pub async fn relay(
        &mut self,
        from: &ParticipantId,
        kind: SignalKind,
        payload: Value,
        to: Option<&ParticipantId>,
    ) -> Result<(), LobbyError> {
        let partner = self.current_partner(from, to).await?;

        debug!("Relaying {:?} from {} to {}", kind, from, partner);
        if !self.signaling.send_signal(&partner, from, kind, payload).await {
            warn!("{:?} from {} dropped: {} is unreachable", kind, from, partner);
        }
        Ok(())
    }

    /// Same routing rules as `relay`, for text messages.
    pub async fn relay_chat(&mut self, from: &ParticipantId, text: String) -> Result<(), LobbyError> {
        let partner = self.current_partner(from, None).await?;

        if text.trim().is_empty() {
            return Err(LobbyError::protocol(from, "empty chat message"));
        }
        if text.chars().count() > self.config.max_chat_len {
            return Err(LobbyError::protocol(
                from,
                format!("chat message longer than {} characters", self.config.max_chat_len),
            ));
        }

        debug!("Relaying chat message from {} to {}", from, partner);
        if !self.signaling.send_chat(&partner, from, text).await {
            warn!("Chat message from {} dropped: {} is unreachable", from, partner);
        }
        Ok(())
    }

    pub fn snapshot(&self) -> LobbySnapshot {
        let mut matches: Vec<&Match> = self.matchmaker.iter().collect();
        matches.sort_by_key(|m| m.id);

        LobbySnapshot {
            connected: self.registry.len(),
            waiting: self.pool.iter().cloned().collect(),
            matches: matches
                .into_iter()
                .map(|m| MatchSummary {
                    initiator: m.initiator.clone(),
                    responder: m.responder.clone(),
                })
                .collect(),
            violations: self.matchmaker.audit(&self.registry, &self.pool),
        }
    }

    pub fn stats(&self) -> LobbyStats {
        LobbyStats {
            connected: self.registry.len(),
            waiting: self.pool.len(),
            matched: self.matchmaker.len() * 2,
        }
    }

    async fn report(&self, participant: &ParticipantId, result: Result<(), LobbyError>) {
        let Err(e) = result else {
            return;
        };

        match &e {
            LobbyError::ProtocolViolation { .. } => {
                warn!("{}", e);
                self.signaling
                    .send_error(participant, ErrorCode::ProtocolViolation, e.to_string())
                    .await;
            }
            LobbyError::StaleReference(_) => warn!("Ignoring event: {}", e),
            LobbyError::InvariantViolation(_) => error!("{}", e),
            LobbyError::LobbyClosed => {}
        }
    }

    /// Resolves the partner a message from `from` may go to.
    async fn current_partner(
        &mut self,
        from: &ParticipantId,
        to: Option<&ParticipantId>,
    ) -> Result<ParticipantId, LobbyError> {
        let sender = self
            .registry
            .get(from)
            .ok_or_else(|| LobbyError::StaleReference(from.clone()))?;

        let Some(partner) = sender.partner_id().cloned() else {
            return Err(LobbyError::protocol(from, "not in a session"));
        };

        if let Some(to) = to {
            if to != &partner {
                return Err(LobbyError::protocol(
                    from,
                    format!("addressed to {} instead of the current partner", to),
                ));
            }
        }

        let verified = match self.matchmaker.match_of(from) {
            Some(m) => self.matchmaker.verify(&self.registry, m),
            None => Err(LobbyError::InvariantViolation(format!(
                "{} is matched with {} but no match is recorded",
                from, partner
            ))),
        };

        if let Err(e) = verified {
            self.force_dissolve(from, &partner).await;
            return Err(e);
        }

        Ok(partner)
    }

    /// Dissolves `member`'s match and tells the other side. Returns the
    /// former partner if it is still connected; it is left `Idle`.
    async fn end_session(
        &mut self,
        member: &ParticipantId,
        reason: EndReason,
    ) -> Option<ParticipantId> {
        let partner = match self.matchmaker.dissolve(&mut self.registry, member) {
            Some(ended) => ended.other(member).cloned(),
            None => self.clear_orphan(member),
        }?;

        if !self.registry.contains(&partner) {
            return None;
        }

        self.signaling.send_session_ended(&partner, reason).await;
        Some(partner)
    }

    /// `member` is marked matched but the match table has no record of it.
    fn clear_orphan(&mut self, member: &ParticipantId) -> Option<ParticipantId> {
        let claimed = self
            .registry
            .get(member)
            .and_then(|p| p.partner_id())
            .cloned();

        error!(
            "{}",
            LobbyError::InvariantViolation(format!(
                "{} is marked matched without a match record",
                member
            ))
        );
        let _ = self.registry.set_state(member, ParticipantState::Idle);

        let claimed = claimed?;
        let points_back =
            self.registry.get(&claimed).and_then(|p| p.partner_id()) == Some(member);

        if points_back && self.matchmaker.match_of(&claimed).is_none() {
            let _ = self.registry.set_state(&claimed, ParticipantState::Idle);
            Some(claimed)
        } else {
            None
        }
    }

    /// Recovery for an inconsistent match: dissolve whatever `a` and `b` are
    /// part of and send everyone involved back to the pool. Members that
    /// believed they were in a session are told it was reset.
    async fn force_dissolve(&mut self, a: &ParticipantId, b: &ParticipantId) {
        let mut affected = vec![a.clone(), b.clone()];
        for id in [a, b] {
            if let Some(m) = self.matchmaker.match_of(id) {
                affected.extend(m.members().into_iter().cloned());
            }
        }
        affected.sort();
        affected.dedup();

        let was_matched: Vec<bool> = affected
            .iter()
            .map(|id| {
                self.registry
                    .get(id)
                    .is_some_and(|p| p.partner_id().is_some())
            })
            .collect();

        for id in [a, b] {
            self.matchmaker.dissolve(&mut self.registry, id);
        }

        for (id, was_matched) in affected.iter().zip(was_matched) {
            if !self.registry.contains(id) {
                continue;
            }
            if was_matched {
                self.signaling
                    .send_session_ended(id, EndReason::SessionReset)
                    .await;
            }
            if let Err(e) = self.enter_pool(id).await {
                error!("Failed to return {} to the pool: {}", id, e);
            }
        }

        self.run_matchmaker().await;
    }

    async fn enter_pool(&mut self, participant: &ParticipantId) -> Result<(), LobbyError> {
        self.registry
            .set_state(participant, ParticipantState::Waiting)?;
        self.pool.enqueue(participant.clone());
        self.signaling.send_waiting(participant).await;
        Ok(())
    }

    async fn run_matchmaker(&mut self) {
        let formed = self.matchmaker.try_match(&mut self.registry, &mut self.pool);

        for m in formed {
            self.signaling
                .send_matched(&m.initiator, &m.responder, true)
                .await;
            self.signaling
                .send_matched(&m.responder, &m.initiator, false)
                .await;
        }
    }
}
