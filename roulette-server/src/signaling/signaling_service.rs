use crate::signaling::{Outbox, SignalingOutput};
use async_trait::async_trait;
use dashmap::DashMap;
use roulette_core::{ParticipantId, ServerSignal};
use std::sync::Arc;
use tracing::{error, warn};

struct SignalingInner {
    peers: DashMap<ParticipantId, Outbox>,
}

/// Routes frames to the WebSocket task of each connected participant.
#[derive(Clone)]
pub struct SignalingService {
    inner: Arc<SignalingInner>,
}

impl SignalingService {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(SignalingInner {
                peers: DashMap::new(),
            }),
        }
    }

    pub fn connection_count(&self) -> usize {
        self.inner.peers.len()
    }
}

impl Default for SignalingService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SignalingOutput for SignalingService {
    fn attach(&self, participant: ParticipantId, outbox: Outbox) {
        self.inner.peers.insert(participant, outbox);
    }

    fn detach(&self, participant: &ParticipantId) {
        self.inner.peers.remove(participant);
    }

    async fn deliver(&self, participant: &ParticipantId, signal: ServerSignal) -> bool {
        let Some(peer) = self.inner.peers.get(participant) else {
            warn!(
                "Attempted to send signal to disconnected participant {}",
                participant
            );
            return false;
        };

        // The receiving half lives in the socket task; a send error means
        // the socket is already gone and its disconnect is on the way.
        if let Err(e) = peer.send(signal) {
            error!("Failed to queue signal for {}: {}", participant, e);
            return false;
        }
        true
    }
}
