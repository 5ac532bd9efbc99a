//! # Integration Tests
//!
//! End-to-end tests against a mock collector.
//!
//! Covers:
//! - Config -> dispatcher -> HTTP wire format
//! - Failure isolation and bounded error history
//! - Worker restart after a cooperative stop
//! - Many producers, one consumer

#[cfg(test)]
mod contract_tests {
    #[test]
    fn test_default_config_is_valid() {
        let config = config_loader::ConfigLoader::load_or_default(None).unwrap();
        assert_eq!(config.version, contracts::ConfigVersion::V1);
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::collections::BTreeMap;
    use std::time::Duration;

    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::{DispatcherState, ErrorReport, LogRecord, TelemetryConfig};
    use dispatcher::{create_dispatcher, Dispatcher, HttpTransport, TelemetryClient};
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const WAIT: Duration = Duration::from_secs(10);

    fn config_for(server: &MockServer) -> TelemetryConfig {
        let content = format!(
            r#"
[endpoint]
base_url = "{}"
token = "tok"
request_timeout_ms = 2000

[dispatcher]
poll_interval_ms = 20
"#,
            server.uri()
        );
        ConfigLoader::load_from_str(&content, ConfigFormat::Toml).unwrap()
    }

    fn dispatcher_for(server: &MockServer) -> Dispatcher<HttpTransport> {
        create_dispatcher(&config_for(server)).unwrap()
    }

    async fn wait_for_state(dispatcher: &Dispatcher<HttpTransport>, state: DispatcherState) {
        tokio::time::timeout(WAIT, async {
            while dispatcher.state() != state {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap();
    }

    /// Errors are POSTed as JSON; everything else is a GET with a query string
    #[tokio::test]
    async fn test_e2e_wire_format() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/log/tok/error"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/log/tok/perf"))
            .and(query_param("t", "125"))
            .and(query_param("m", "load page"))
            .and(query_param("u", "u-7"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/log/tok/event"))
            .and(query_param("n", "signup"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/log/tok/info"))
            .and(query_param("m", "boot"))
            .and(query_param("d", "ready & waiting"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let client = TelemetryClient::new(dispatcher_for(&server));
        let details = BTreeMap::from([("screen".to_string(), "home".to_string())]);

        client.log(LogRecord::Error(ErrorReport {
            message: "disk \"full\"".into(),
            detail: Some("while saving".into()),
            details: details.clone(),
            ..ErrorReport::default()
        }));
        client.log_performance(125, "load page", Some("u-7"), None);
        client.log_event("signup", None, Some(&details));
        client.log_information("boot", "ready & waiting", None, None);

        assert!(client.dispatcher().wait_idle(WAIT).await);

        let stats = client.get_execution_stats();
        assert_eq!(stats.count, 4);
        assert!(stats.min <= stats.avg && stats.avg <= stats.max);
        assert!(client.get_queue_errors().is_empty());

        let requests = server.received_requests().await.unwrap();
        let error_request = requests
            .iter()
            .find(|r| r.method.as_str() == "POST")
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&error_request.body).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "message": "disk \"full\"",
                "stack": "",
                "details": "while saving",
                "screen": "home"
            })
        );

        client.dispatcher().shutdown().await;
        server.verify().await;
    }

    /// Failed items are dropped; only the last ten failures are kept
    #[tokio::test]
    async fn test_e2e_server_errors_fill_bounded_history() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = TelemetryClient::new(dispatcher_for(&server));
        for i in 0..15 {
            client.log_event(&format!("e{i}"), None, None);
        }

        assert!(client.dispatcher().wait_idle(WAIT).await);

        let metrics = client.dispatcher().metrics();
        assert_eq!(metrics.failed, 15);
        assert_eq!(metrics.delivered, 0);
        assert_eq!(client.get_queue_count(), 0);

        let stats = client.get_execution_stats();
        assert!(stats.is_empty());
        assert_eq!(stats.to_string(), "N/A");

        let errors = client.dispatcher().drain_errors();
        assert_eq!(errors.len(), 10);
        assert!(errors.iter().all(|e| e.error.contains("HTTP 500")));
        assert!(client.get_queue_errors().is_empty());

        client.dispatcher().shutdown().await;
    }

    /// A stopped worker is replaced by the next enqueue
    #[tokio::test]
    async fn test_e2e_restart_after_stop() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/log/tok/event"))
            .respond_with(ResponseTemplate::new(200))
            .expect(2)
            .mount(&server)
            .await;

        let client = TelemetryClient::new(dispatcher_for(&server));
        client.log_event("first", None, None);
        assert!(client.dispatcher().wait_idle(WAIT).await);

        client.stop_processing();
        wait_for_state(client.dispatcher(), DispatcherState::Stopped).await;
        assert!(client.get_execution_stats().is_empty());

        client.log_event("second", None, None);
        assert_eq!(client.dispatcher().state(), DispatcherState::Running);
        assert!(client.dispatcher().wait_idle(WAIT).await);

        assert_eq!(client.dispatcher().metrics().spawned, 2);
        assert_eq!(client.get_execution_stats().count, 1);

        client.dispatcher().shutdown().await;
        server.verify().await;
    }

    /// Producers on plain threads share one queue and one worker
    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_e2e_concurrent_producers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let client = TelemetryClient::new(dispatcher_for(&server));
        let producers: Vec<_> = (0..4)
            .map(|p| {
                let client = client.clone();
                std::thread::spawn(move || {
                    for i in 0..25 {
                        client.log_information("worker", &format!("{p}-{i}"), None, None);
                    }
                })
            })
            .collect();
        for producer in producers {
            producer.join().unwrap();
        }

        assert!(client.dispatcher().wait_idle(WAIT).await);

        let metrics = client.dispatcher().metrics();
        assert_eq!(metrics.enqueued, 100);
        assert_eq!(metrics.delivered, 100);
        assert_eq!(metrics.spawned, 1);
        assert_eq!(server.received_requests().await.unwrap().len(), 100);

        client.dispatcher().shutdown().await;
    }

    /// Without a token nothing is sent, but nothing is lost either
    #[tokio::test]
    async fn test_e2e_missing_token_keeps_items_queued() {
        let server = MockServer::start().await;
        let mut config = config_for(&server);
        config.endpoint.token = None;
        config.endpoint.token_env = "TESTS_TOKEN_VAR_THAT_IS_NEVER_SET".into();

        let client = TelemetryClient::new(create_dispatcher(&config).unwrap());
        client.log_event("queued", None, None);
        client.log_event("queued", None, None);

        assert_eq!(client.get_queue_count(), 2);
        assert_eq!(client.dispatcher().state(), DispatcherState::NotStarted);
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    /// Shutdown rejects further records but keeps counters readable
    #[tokio::test]
    async fn test_e2e_shutdown_rejects_new_records() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let client = TelemetryClient::new(dispatcher_for(&server));
        client.log_event("before", None, None);
        assert!(client.dispatcher().wait_idle(WAIT).await);
        client.dispatcher().shutdown().await;

        client.log_event("after", None, None);

        assert_eq!(client.dispatcher().state(), DispatcherState::Shutdown);
        assert_eq!(client.get_queue_count(), 0);
        let metrics = client.dispatcher().metrics();
        assert_eq!(metrics.rejected, 1);
        assert_eq!(metrics.delivered, 1);
    }
}
