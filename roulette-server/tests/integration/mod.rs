
use roulette_core::ParticipantId;
use roulette_server::{LobbyConfig, LobbyHandle, LobbySnapshot};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::Level;

use crate::utils::MockSignalingOutput;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_test_writer()
        .try_init();
}

/// A running lobby wired to a recording signaling output.
pub struct TestLobby {
    pub handle: LobbyHandle,
    pub signaling: MockSignalingOutput,
}

impl TestLobby {
    pub async fn connect(&self) -> ParticipantId {
        // The mock never writes to the outbox.
        let (tx, _rx) = mpsc::unbounded_channel();
        self.handle.connect(tx).await.expect("Lobby closed")
    }

    pub async fn connect_many(&self, n: usize) -> Vec<ParticipantId> {
        let mut ids = Vec::with_capacity(n);
        for _ in 0..n {
            ids.push(self.connect().await);
        }
        ids
    }

    /// Every command sent before this call has been applied when it returns.
    pub async fn snapshot(&self) -> LobbySnapshot {
        let snapshot = self.handle.snapshot().await.expect("Lobby closed");
        assert!(
            snapshot.violations.is_empty(),
            "Lobby inconsistent: {:?}",
            snapshot.violations
        );
        snapshot
    }
}

pub fn create_test_lobby() -> TestLobby {
    create_test_lobby_with(LobbyConfig::default())
}

pub fn create_test_lobby_with(config: LobbyConfig) -> TestLobby {
    init_tracing();

    let signaling = MockSignalingOutput::new();
    let handle = LobbyHandle::spawn(config, Arc::new(signaling.clone()));

    TestLobby { handle, signaling }
}
