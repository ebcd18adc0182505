use super::*;

// =============================================================================
// env_parse
// =============================================================================

#[test]
fn env_parse_missing_returns_default() {
    let val: usize = env_parse("__VELLUM_TEST_MISSING__", 42);
    assert_eq!(val, 42);
}

#[test]
fn env_parse_present_valid() {
    unsafe { std::env::set_var("__VELLUM_TEST_VALID__", "99") };
    let val: u16 = env_parse("__VELLUM_TEST_VALID__", 0);
    assert_eq!(val, 99);
    unsafe { std::env::remove_var("__VELLUM_TEST_VALID__") };
}

#[test]
fn env_parse_present_invalid_returns_default() {
    unsafe { std::env::set_var("__VELLUM_TEST_INVALID__", "notanumber") };
    let val: u32 = env_parse("__VELLUM_TEST_INVALID__", 7);
    assert_eq!(val, 7);
    unsafe { std::env::remove_var("__VELLUM_TEST_INVALID__") };
}

// =============================================================================
// Config
// =============================================================================

#[test]
fn default_config_uses_memory_store() {
    let config = Config::default();
    assert_eq!(config.port, 3000);
    assert!(config.database_url.is_none());
    assert_eq!(config.save_body_limit_bytes, 8 * 1024 * 1024);
}
