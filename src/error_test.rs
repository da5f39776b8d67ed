use super::*;

#[test]
fn denied_message_names_actor_and_action() {
    let err = SessionError::Denied { actor: ParticipantId::from("p2"), action: Action::MoveToken };
    assert_eq!(err.to_string(), "p2 is not allowed to move_token");
    assert!(err.is_denied());
}

#[test]
fn error_codes_are_stable() {
    assert_eq!(SessionError::MapNotLoaded.error_code(), "E_MAP_NOT_LOADED");
    assert_eq!(SessionError::TokenNotFound(Uuid::nil()).error_code(), "E_TOKEN_NOT_FOUND");
    assert_eq!(
        SessionError::InvalidCoordinate { field: "x", value: f64::NAN }.error_code(),
        "E_INVALID_COORDINATE"
    );
}

#[test]
fn only_actor_closed_is_retryable() {
    assert!(SessionError::ActorClosed.retryable());
    assert!(!SessionError::MapNotLoaded.retryable());
    assert!(!SessionError::Denied { actor: ParticipantId::from("p1"), action: Action::AddToken }.retryable());
}

#[test]
fn ensure_finite_accepts_regular_values() {
    assert_eq!(ensure_finite("x", 12.5), Ok(12.5));
    assert_eq!(ensure_finite("x", -3.0), Ok(-3.0));
}

#[test]
fn ensure_finite_rejects_nan_and_infinity() {
    assert!(matches!(ensure_finite("x", f64::NAN), Err(SessionError::InvalidCoordinate { field: "x", .. })));
    assert!(ensure_finite("y", f64::INFINITY).is_err());
    assert!(ensure_finite("y", f64::NEG_INFINITY).is_err());
}

#[test]
fn ensure_positive_rejects_zero_and_negative() {
    assert!(ensure_positive("width", 0.0).is_err());
    assert!(ensure_positive("width", -1.0).is_err());
    assert_eq!(ensure_positive("width", 2.0), Ok(2.0));
}
