use super::*;

#[test]
fn default_matches_constants() {
    let cfg = SessionConfig::default();
    assert_eq!(cfg.ping_ttl, Duration::from_millis(3000));
    assert_eq!(cfg.command_queue_capacity, 256);
    assert_eq!(cfg.event_queue_capacity, 1024);
}

#[test]
fn env_parse_missing_returns_default() {
    assert_eq!(env_parse("__TEST_VTT_MISSING__", 42_u64), 42);
}

#[test]
fn env_parse_valid_value() {
    unsafe { std::env::set_var("__TEST_VTT_VALID__", " 1500 ") };
    assert_eq!(env_parse("__TEST_VTT_VALID__", 0_u64), 1500);
    unsafe { std::env::remove_var("__TEST_VTT_VALID__") };
}

#[test]
fn env_parse_invalid_value_returns_default() {
    unsafe { std::env::set_var("__TEST_VTT_INVALID__", "soon") };
    assert_eq!(env_parse("__TEST_VTT_INVALID__", 7_usize), 7);
    unsafe { std::env::remove_var("__TEST_VTT_INVALID__") };
}

#[test]
fn from_env_reads_overrides() {
    unsafe {
        std::env::set_var("VTT_PING_TTL_MS", "500");
        std::env::set_var("VTT_COMMAND_QUEUE_CAPACITY", "0");
        std::env::set_var("VTT_EVENT_QUEUE_CAPACITY", "8");
    }

    let cfg = SessionConfig::from_env();
    assert_eq!(cfg.ping_ttl, Duration::from_millis(500));
    assert_eq!(cfg.command_queue_capacity, 1);
    assert_eq!(cfg.event_queue_capacity, 8);

    unsafe {
        std::env::remove_var("VTT_PING_TTL_MS");
        std::env::remove_var("VTT_COMMAND_QUEUE_CAPACITY");
        std::env::remove_var("VTT_EVENT_QUEUE_CAPACITY");
    }
}
