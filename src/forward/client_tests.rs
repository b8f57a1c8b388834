//! Tests for `ReqwestClient`.
//!
//! Requests against a live local listener are covered by the end-to-end
//! tests in the server module.

use super::*;

mod reqwest_client {
    use super::*;

    #[test]
    fn new_creates_client() {
        let client = ReqwestClient::new();
        let _ = format!("{client:?}");
    }

    #[test]
    fn for_relay_builds() {
        let client = ReqwestClient::for_relay().unwrap();

        assert!(format!("{client:?}").contains("ReqwestClient"));
    }

    #[test]
    fn from_client_accepts_custom_client() {
        let custom = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .unwrap();
        let client = ReqwestClient::from_client(custom);

        let _ = format!("{client:?}");
    }

    #[test]
    fn client_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ReqwestClient>();
    }

    #[tokio::test]
    async fn request_to_closed_port_returns_connection_error() {
        // Bind then drop to obtain a local port with nothing listening
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let client = ReqwestClient::for_relay().unwrap();
        let url = url::Url::parse(&format!("http://127.0.0.1:{port}/hooks")).unwrap();
        let result = client.request(HttpRequest::post(url).with_body("x")).await;

        match result {
            Err(HttpError::Connection(_)) => {}
            other => panic!("Expected connection error, got {other:?}"),
        }
    }
}

mod http_error {
    use super::*;

    #[test]
    fn timeout_reason_is_exact() {
        assert_eq!(HttpError::Timeout.reason(), "timeout");
    }

    #[test]
    fn connection_reason_uses_underlying_message() {
        let error = HttpError::Connection(Box::new(std::io::Error::new(
            std::io::ErrorKind::ConnectionRefused,
            "connection refused",
        )));

        assert_eq!(error.reason(), "connection refused");
        assert_eq!(error.to_string(), "Connection error: connection refused");
    }

    #[test]
    fn invalid_url_reason_includes_detail() {
        let error = HttpError::InvalidUrl("missing host".to_string());

        assert!(error.reason().contains("missing host"));
    }
}
