use async_trait::async_trait;
use roulette_core::{EndReason, ErrorCode, ParticipantId, ServerSignal};
use roulette_server::{Outbox, SignalingOutput};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone)]
pub struct Delivery {
    pub to: ParticipantId,
    pub signal: ServerSignal,
}

#[derive(Default)]
struct MockState {
    attached: HashSet<ParticipantId>,
    unreachable: HashSet<ParticipantId>,
    deliveries: Vec<Delivery>,
}

/// SignalingOutput that records every frame it accepts.
///
/// Like the real service, frames for participants that are not attached
/// (or were marked unreachable) are refused and not recorded.
#[derive(Clone, Default)]
pub struct MockSignalingOutput {
    state: Arc<Mutex<MockState>>,
}

impl MockSignalingOutput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulates a socket that died without the disconnect being processed yet.
    pub fn make_unreachable(&self, participant: &ParticipantId) {
        self.state
            .lock()
            .unwrap()
            .unreachable
            .insert(participant.clone());
    }

    pub fn is_attached(&self, participant: &ParticipantId) -> bool {
        self.state.lock().unwrap().attached.contains(participant)
    }

    pub fn deliveries(&self) -> Vec<Delivery> {
        self.state.lock().unwrap().deliveries.clone()
    }

    pub fn signals_for(&self, participant: &ParticipantId) -> Vec<ServerSignal> {
        self.deliveries()
            .into_iter()
            .filter(|d| &d.to == participant)
            .map(|d| d.signal)
            .collect()
    }

    /// `(partner, initiator)` of every `matched` frame sent to `participant`.
    pub fn matched_for(&self, participant: &ParticipantId) -> Vec<(ParticipantId, bool)> {
        self.signals_for(participant)
            .into_iter()
            .filter_map(|s| match s {
                ServerSignal::Matched {
                    partner_id,
                    initiator,
                } => Some((partner_id, initiator)),
                _ => None,
            })
            .collect()
    }

    pub fn session_ended_for(&self, participant: &ParticipantId) -> Vec<EndReason> {
        self.signals_for(participant)
            .into_iter()
            .filter_map(|s| match s {
                ServerSignal::SessionEnded { reason } => Some(reason),
                _ => None,
            })
            .collect()
    }

    /// Relayed `signal` and `chat` frames received by `participant`.
    pub fn relayed_to(&self, participant: &ParticipantId) -> Vec<ServerSignal> {
        self.signals_for(participant)
            .into_iter()
            .filter(|s| matches!(s, ServerSignal::Signal { .. } | ServerSignal::Chat { .. }))
            .collect()
    }

    pub fn errors_for(&self, participant: &ParticipantId) -> Vec<ErrorCode> {
        self.signals_for(participant)
            .into_iter()
            .filter_map(|s| match s {
                ServerSignal::Error { code, .. } => Some(code),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl SignalingOutput for MockSignalingOutput {
    fn attach(&self, participant: ParticipantId, _outbox: Outbox) {
        tracing::debug!("[MockSignaling] attach {}", participant);
        self.state.lock().unwrap().attached.insert(participant);
    }

    fn detach(&self, participant: &ParticipantId) {
        tracing::debug!("[MockSignaling] detach {}", participant);
        self.state.lock().unwrap().attached.remove(participant);
    }

    async fn deliver(&self, participant: &ParticipantId, signal: ServerSignal) -> bool {
        let mut state = self.state.lock().unwrap();
        if !state.attached.contains(participant) || state.unreachable.contains(participant) {
            tracing::debug!("[MockSignaling] refused {:?} for {}", signal, participant);
            return false;
        }

        state.deliveries.push(Delivery {
            to: participant.clone(),
            signal,
        });
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn test_mock_records_only_attached() {
        let signaling = MockSignalingOutput::new();
        let id = ParticipantId::new();
        let (tx, _rx) = mpsc::unbounded_channel();

        assert!(!signaling.send_waiting(&id).await);

        signaling.attach(id.clone(), tx);
        assert!(signaling.send_waiting(&id).await);
        assert_eq!(signaling.signals_for(&id), vec![ServerSignal::Waiting]);

        signaling.make_unreachable(&id);
        assert!(!signaling.send_waiting(&id).await);
        assert_eq!(signaling.signals_for(&id).len(), 1);
    }
}
