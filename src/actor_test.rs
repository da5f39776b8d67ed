#![allow(clippy::float_cmp)]

use std::time::Duration;

use serde_json::json;

use super::*;
use crate::config::SessionConfig;

fn seer() -> ParticipantId {
    ParticipantId::from("seer")
}

fn p1() -> ParticipantId {
    ParticipantId::from("p1")
}

async fn spawned() -> SessionHandle {
    let handle = spawn_session(VttSession::new("seer", "p1", SessionConfig::default()));
    handle.load_map(GridMap::new(10, 10)).await.unwrap();
    handle
}

#[tokio::test]
async fn mutations_round_trip_through_handle() {
    let handle = spawned().await;
    let id = handle.add_token(seer(), Token::new(2.0, 1.0).with_controller("p1")).await.unwrap();

    let err = handle.move_token(ParticipantId::from("p2"), id, 3.0, 3.0).await.unwrap_err();
    assert!(err.is_denied());
    handle.move_token(p1(), id, 3.0, 3.0).await.unwrap();

    let state = handle.snapshot().await.unwrap();
    let token = state.token(&id).unwrap();
    assert_eq!((token.x, token.y), (3.0, 3.0));
}

#[tokio::test]
async fn event_stream_sees_accepted_mutations_only() {
    let handle = spawned().await;
    let mut events = handle.events().await.unwrap();

    handle.reveal_fog(p1(), FogRegion::rect(0.0, 0.0, 1.0, 1.0)).await.unwrap_err();
    handle.reveal_fog(seer(), FogRegion::rect(0.0, 0.0, 1.0, 1.0)).await.unwrap();
    handle.add_drawing(p1(), DrawingLayer::Drawings, json!({"line": [[0, 0], [1, 1]]})).await.unwrap();

    assert_eq!(events.recv().await.unwrap().kind(), "fog_revealed");
    assert_eq!(events.recv().await.unwrap().kind(), "drawing_added");
    assert!(events.try_recv().is_err());
}

#[tokio::test]
async fn undo_goes_through_local_history() {
    let handle = spawned().await;
    let id = handle.add_drawing(p1(), DrawingLayer::Drawings, json!({})).await.unwrap();
    assert_eq!(handle.undo_drawing().await.unwrap(), Some(id));
    assert_eq!(handle.undo_drawing().await.unwrap(), None);
    assert!(handle.snapshot().await.unwrap().drawings.is_empty());
}

#[tokio::test(start_paused = true)]
async fn actor_expires_pings_on_its_own() {
    let handle = spawned().await;
    let mut events = handle.events().await.unwrap();

    let id = handle.send_ping(p1(), 10.0, 10.0, None).await.unwrap();
    assert!(handle.snapshot().await.unwrap().ping(&id).is_some());

    tokio::time::sleep(Duration::from_millis(3001)).await;
    assert!(handle.snapshot().await.unwrap().pings.is_empty());

    assert_eq!(events.recv().await.unwrap().kind(), "ping_created");
    assert_eq!(events.recv().await.unwrap(), SessionEvent::PingExpired { ping_id: id });
}

#[tokio::test(start_paused = true)]
async fn removed_ping_does_not_expire_again() {
    let handle = spawned().await;
    let mut events = handle.events().await.unwrap();

    let id = handle.send_ping(p1(), 10.0, 10.0, None).await.unwrap();
    handle.remove_ping(p1(), id).await.unwrap();
    tokio::time::sleep(Duration::from_secs(10)).await;

    assert_eq!(events.recv().await.unwrap().kind(), "ping_created");
    assert_eq!(events.recv().await.unwrap().kind(), "ping_removed");
    assert!(events.try_recv().is_err());
}

#[tokio::test]
async fn run_reaches_viewport_and_queries() {
    let handle = spawned().await;
    handle.run(VttSession::zoom_in).await.unwrap();
    let scale = handle.run(|session| session.viewport().scale).await.unwrap();
    assert!(scale > 1.0);

    let cells = handle
        .run(|session| {
            session.start_measurement(0.0, 0.0)?;
            session.update_measurement(0.0, 120.0)?;
            session.measurement_in_cells()
        })
        .await
        .unwrap();
    assert_eq!(cells.unwrap(), Some(2.0));
}

#[tokio::test]
async fn closed_actor_reports_actor_closed() {
    let (tx, rx) = mpsc::channel(1);
    drop(rx);
    let handle = SessionHandle { tx };
    assert!(handle.is_closed());
    let err = handle.snapshot().await.unwrap_err();
    assert_eq!(err, SessionError::ActorClosed);
    assert!(crate::error::ErrorCode::retryable(&err));
}
