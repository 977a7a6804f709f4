use roulette_core::{EndReason, ErrorCode, SignalKind};
use serde_json::json;

use crate::integration::create_test_lobby;

#[tokio::test]
async fn test_partner_disconnect_before_any_signal() {
    let lobby = create_test_lobby();

    let a = lobby.connect().await;
    let b = lobby.connect().await;

    lobby.handle.disconnect(a.clone()).await.unwrap();
    let snapshot = lobby.snapshot().await;

    assert_eq!(snapshot.connected, 1);
    assert_eq!(snapshot.waiting, vec![b.clone()]);
    assert!(snapshot.matches.is_empty());
    assert!(!lobby.signaling.is_attached(&a));
    assert_eq!(
        lobby.signaling.session_ended_for(&b),
        vec![EndReason::PartnerDisconnected]
    );

    // B's late answer for A must not go anywhere.
    lobby
        .handle
        .signal(b.clone(), SignalKind::Answer, json!({"sdp": "late"}), Some(a.clone()))
        .await
        .unwrap();
    lobby.snapshot().await;

    assert!(lobby.signaling.relayed_to(&a).is_empty());
    assert_eq!(
        lobby.signaling.errors_for(&b),
        vec![ErrorCode::ProtocolViolation]
    );
}

#[tokio::test]
async fn test_remaining_partner_is_rematched() {
    let lobby = create_test_lobby();

    let a = lobby.connect().await;
    let b = lobby.connect().await;
    let c = lobby.connect().await;

    lobby.handle.disconnect(b.clone()).await.unwrap();
    let snapshot = lobby.snapshot().await;

    // C had been waiting longer, so it initiates.
    assert_eq!(snapshot.matches.len(), 1);
    assert_eq!(snapshot.matches[0].initiator, c);
    assert_eq!(snapshot.matches[0].responder, a);
    assert_eq!(lobby.signaling.matched_for(&a).len(), 2);
    assert_eq!(lobby.signaling.matched_for(&c), vec![(a.clone(), true)]);
}

#[tokio::test]
async fn test_waiting_participant_disconnect() {
    let lobby = create_test_lobby();

    let a = lobby.connect().await;
    lobby.handle.disconnect(a.clone()).await.unwrap();
    let snapshot = lobby.snapshot().await;

    assert_eq!(snapshot.connected, 0);
    assert!(snapshot.waiting.is_empty());
    assert!(lobby.signaling.session_ended_for(&a).is_empty());

    // A newcomer must not be paired with the departed one.
    let b = lobby.connect().await;
    let snapshot = lobby.snapshot().await;
    assert_eq!(snapshot.waiting, vec![b]);
}
