use super::*;

#[test]
fn config_request_failed_message_formats_status() {
    assert_eq!(config_request_failed_message(503), "widget config request failed: 503");
}

#[test]
fn widget_config_endpoint_is_under_api() {
    assert_eq!(WIDGET_CONFIG_ENDPOINT, "/api/widget-config");
}

#[cfg(not(feature = "hydrate"))]
#[test]
fn fetch_widget_config_is_unavailable_on_server() {
    let result = futures::executor::block_on(fetch_widget_config());
    assert_eq!(result, Err("not available on server".to_owned()));
}
