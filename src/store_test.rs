#![allow(clippy::float_cmp)]

use serde_json::json;
use uuid::Uuid;

use super::*;
use crate::model::ParticipantId;

fn seeded() -> (SessionMapState, TokenId) {
    let token = Token::new(2.0, 1.0).with_controller("p1");
    let id = token.id;
    (with_token_added(&SessionMapState::new(), token), id)
}

fn ping(id: PingId) -> Ping {
    Ping {
        id,
        x: 10.0,
        y: 10.0,
        color: "#fff".into(),
        created_by: ParticipantId::from("p1"),
        created_at: 0,
        expires_at: 3000,
    }
}

// --- tokens ---

#[test]
fn add_token_appends_in_order() {
    let (state, first) = seeded();
    let second = Token::new(0.0, 0.0);
    let second_id = second.id;
    let next = with_token_added(&state, second);
    let ids: Vec<_> = next.tokens.iter().map(|t| t.id).collect();
    assert_eq!(ids, vec![first, second_id]);
}

#[test]
fn add_token_with_existing_id_replaces_in_place() {
    let (state, id) = seeded();
    let extra = Token::new(5.0, 5.0);
    let state = with_token_added(&state, extra);
    let mut replacement = Token::new(9.0, 9.0);
    replacement.id = id;
    let next = with_token_added(&state, replacement);
    assert_eq!(next.tokens.len(), 2);
    assert_eq!(next.tokens[0].id, id);
    assert_eq!(next.tokens[0].x, 9.0);
}

#[test]
fn move_token_produces_new_snapshot_and_keeps_old() {
    let (state, id) = seeded();
    let next = with_token_moved(&state, id, 3.0, 3.0).unwrap();
    assert_eq!(next.token(&id).unwrap().x, 3.0);
    assert_eq!(state.token(&id).unwrap().x, 2.0);
    assert!(!Arc::ptr_eq(&state.tokens, &next.tokens));
}

#[test]
fn move_token_shares_untouched_collections() {
    let (state, id) = seeded();
    let next = with_token_moved(&state, id, 3.0, 3.0).unwrap();
    assert!(Arc::ptr_eq(&state.drawings, &next.drawings));
    assert!(Arc::ptr_eq(&state.fog, &next.fog));
    assert!(Arc::ptr_eq(&state.pings, &next.pings));
}

#[test]
fn move_unknown_token_is_not_found() {
    let (state, _) = seeded();
    let missing = Uuid::new_v4();
    assert_eq!(with_token_moved(&state, missing, 0.0, 0.0).unwrap_err(), SessionError::TokenNotFound(missing));
}

#[test]
fn patch_token_applies_fields() {
    let (state, id) = seeded();
    let patch = TokenPatch { name: Some("Orc".into()), width: Some(2.0), ..Default::default() };
    let next = with_token_patched(&state, id, &patch).unwrap();
    let token = next.token(&id).unwrap();
    assert_eq!(token.name, "Orc");
    assert_eq!(token.width, 2.0);
}

#[test]
fn remove_token_drops_it() {
    let (state, id) = seeded();
    let next = with_token_removed(&state, id).unwrap();
    assert!(next.tokens.is_empty());
    assert!(with_token_removed(&next, id).is_err());
}

// --- fog ---

#[test]
fn reveal_is_additive() {
    let state = with_fog_revealed(&SessionMapState::new(), FogRegion::rect(0.0, 0.0, 2.0, 2.0));
    let state = with_fog_revealed(&state, FogRegion::rect(4.0, 4.0, 1.0, 1.0));
    assert_eq!(state.fog.len(), 2);
}

#[test]
fn hide_selected_regions() {
    let a = FogRegion::rect(0.0, 0.0, 2.0, 2.0);
    let b = FogRegion::rect(4.0, 4.0, 1.0, 1.0);
    let a_id = a.id;
    let b_id = b.id;
    let state = with_fog_revealed(&with_fog_revealed(&SessionMapState::new(), a), b);
    let next = with_fog_hidden(&state, Some(&[a_id][..]));
    assert_eq!(next.fog.len(), 1);
    assert_eq!(next.fog[0].id, b_id);
}

#[test]
fn hide_all_and_reset_clear_fog() {
    let state = with_fog_revealed(&SessionMapState::new(), FogRegion::rect(0.0, 0.0, 2.0, 2.0));
    assert!(with_fog_hidden(&state, None).fog.is_empty());
    assert!(with_fog_reset(&state).fog.is_empty());
}

// --- drawings ---

#[test]
fn clear_drawings_only_touches_layer() {
    let p1 = ParticipantId::from("p1");
    let state = with_drawing_added(&SessionMapState::new(), Drawing::new(DrawingLayer::Gm, json!({}), p1.clone()));
    let state = with_drawing_added(&state, Drawing::new(DrawingLayer::Drawings, json!({}), p1));
    let next = with_drawings_cleared(&state, DrawingLayer::Gm);
    assert_eq!(next.drawings.len(), 1);
    assert_eq!(next.drawings[0].layer, DrawingLayer::Drawings);
}

#[test]
fn remove_drawing_not_found() {
    let id = Uuid::new_v4();
    assert_eq!(
        with_drawing_removed(&SessionMapState::new(), id).unwrap_err(),
        SessionError::DrawingNotFound(id)
    );
}

// --- pings ---

#[test]
fn ping_removed_once() {
    let id = Uuid::new_v4();
    let state = with_ping_added(&SessionMapState::new(), ping(id));
    let next = with_ping_removed(&state, id).unwrap();
    assert!(next.pings.is_empty());
    assert!(with_ping_removed(&next, id).is_none());
}

#[test]
fn ping_with_same_id_replaces() {
    let id = Uuid::new_v4();
    let state = with_ping_added(&SessionMapState::new(), ping(id));
    let state = with_ping_added(&state, ping(id));
    assert_eq!(state.pings.len(), 1);
}
