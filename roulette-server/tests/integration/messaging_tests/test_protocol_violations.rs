use roulette_core::{ErrorCode, ParticipantId, ServerSignal, SignalKind};
use serde_json::json;

use crate::integration::create_test_lobby;

#[tokio::test]
async fn test_signal_without_match_is_rejected() {
    let lobby = create_test_lobby();

    let a = lobby.connect().await;
    lobby
        .handle
        .signal(a.clone(), SignalKind::Offer, json!("sdp"), None)
        .await
        .unwrap();
    let snapshot = lobby.snapshot().await;

    assert_eq!(
        lobby.signaling.errors_for(&a),
        vec![ErrorCode::ProtocolViolation]
    );
    assert!(lobby.signaling.relayed_to(&a).is_empty());
    assert_eq!(snapshot.waiting, vec![a]);
}

#[tokio::test]
async fn test_signal_to_third_party_is_rejected() {
    let lobby = create_test_lobby();

    let a = lobby.connect().await;
    let b = lobby.connect().await;
    let c = lobby.connect().await;
    let d = lobby.connect().await;

    lobby
        .handle
        .signal(a.clone(), SignalKind::Offer, json!("sdp"), Some(c.clone()))
        .await
        .unwrap();
    let snapshot = lobby.snapshot().await;

    assert_eq!(
        lobby.signaling.errors_for(&a),
        vec![ErrorCode::ProtocolViolation]
    );
    for other in [&b, &c, &d] {
        assert!(lobby.signaling.relayed_to(other).is_empty());
    }
    // Rejection does not disturb either match.
    assert_eq!(snapshot.matches.len(), 2);
}

#[tokio::test]
async fn test_signal_addressed_to_self_is_rejected() {
    let lobby = create_test_lobby();

    let a = lobby.connect().await;
    let b = lobby.connect().await;

    lobby
        .handle
        .signal(a.clone(), SignalKind::Offer, json!("sdp"), Some(a.clone()))
        .await
        .unwrap();
    lobby.snapshot().await;

    assert!(lobby.signaling.relayed_to(&a).is_empty());
    assert!(lobby.signaling.relayed_to(&b).is_empty());
    assert_eq!(lobby.signaling.errors_for(&a).len(), 1);
}

#[tokio::test]
async fn test_signal_from_unknown_participant_is_ignored() {
    let lobby = create_test_lobby();

    let a = lobby.connect().await;
    let b = lobby.connect().await;
    let ghost = ParticipantId::new();

    lobby
        .handle
        .signal(ghost, SignalKind::Offer, json!("sdp"), Some(b.clone()))
        .await
        .unwrap();
    lobby.snapshot().await;

    for id in [&a, &b] {
        let relayed = lobby.signaling.relayed_to(id);
        assert!(
            relayed.is_empty(),
            "{} unexpectedly received {:?}",
            id,
            relayed
        );
        assert!(lobby.signaling.errors_for(id).is_empty());
    }
    assert!(
        !lobby
            .signaling
            .deliveries()
            .iter()
            .any(|d| matches!(d.signal, ServerSignal::Error { .. }))
    );
}
