use super::*;

#[test]
fn default_config_targets_same_origin() {
    let config = RemoteConfig::default();
    assert_eq!(config.documents_url(), "/api/documents");
    assert_eq!(config.document_url("abc"), "/api/documents/abc");
}

#[test]
fn base_url_trailing_slash_is_trimmed() {
    let config = RemoteConfig { base_url: "https://vellum.test/".into(), ..Default::default() };
    assert_eq!(config.document_url("x"), "https://vellum.test/api/documents/x");
}

#[test]
fn retry_delay_grows_linearly() {
    let config = RemoteConfig { retry_base_ms: 250, ..Default::default() };
    assert_eq!(config.retry_delay_ms(1), 250);
    assert_eq!(config.retry_delay_ms(3), 750);
}

#[test]
fn retry_delay_saturates() {
    let config = RemoteConfig { retry_base_ms: u32::MAX, ..Default::default() };
    assert_eq!(config.retry_delay_ms(2), u32::MAX);
}
