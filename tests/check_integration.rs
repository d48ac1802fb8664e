//! Check 통합 테스트
//!
//! wiremock으로 WildFly management 인터페이스를 모킹한 전체 체크 테스트

use check_wildfly::check::{Action, CheckEngine, CheckRequest, Status, StatusFormatter};
use check_wildfly::config::{Config, EndpointConfig, Mode};
use check_wildfly::state::MemoryStateStore;
use digest_auth::{AuthorizationHeader, Qop};
use serde_json::{json, Value};
use std::time::Duration;
use wiremock::matchers::{body_json, header_exists, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config_for(server: &MockServer) -> Config {
    let address = server.address();
    Config {
        endpoint: EndpointConfig {
            host: address.ip().to_string(),
            port: address.port(),
            timeout_ms: 2000,
            ..Default::default()
        },
        state_dir: None,
    }
}

fn engine_for(server: &MockServer) -> CheckEngine {
    CheckEngine::new(&config_for(server)).unwrap()
}

fn memory(heap_used: i64) -> Value {
    json!({
        "heap-memory-usage": {"init": 268435456, "used": heap_used, "committed": 587726848, "max": 1037959168},
        "non-heap-memory-usage": {"init": 2555904, "used": 217580768, "committed": 236462080, "max": -1},
        "object-pending-finalization-count": 0
    })
}

async fn mount_server_state(server: &MockServer, state: &str) {
    Mock::given(method("POST"))
        .and(path("/management"))
        .and(body_json(json!({"operation": "read-attribute", "name": "server-state"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "outcome": "success",
            "result": state
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_server_status_running() {
    let server = MockServer::start().await;
    mount_server_state(&server, "running").await;

    let outcome = engine_for(&server)
        .run(&CheckRequest::new(Action::ServerStatus))
        .await;

    assert_eq!(outcome.status, Status::Ok);
    assert_eq!(outcome.exit_code(), 0);
    assert_eq!(
        StatusFormatter::new().format(&outcome),
        "OK - Server Status 'running'"
    );
}

#[tokio::test]
async fn test_server_status_restart_required() {
    let server = MockServer::start().await;
    mount_server_state(&server, "restart-required").await;

    let outcome = engine_for(&server)
        .run(&CheckRequest::new(Action::ServerStatus))
        .await;

    assert_eq!(outcome.status, Status::Warning);
    assert_eq!(outcome.exit_code(), 1);
}

#[tokio::test]
async fn test_server_status_stopped() {
    let server = MockServer::start().await;
    mount_server_state(&server, "stopped").await;

    let outcome = engine_for(&server)
        .run(&CheckRequest::new(Action::ServerStatus))
        .await;

    assert_eq!(outcome.status, Status::Critical);
    assert_eq!(outcome.exit_code(), 2);
}

#[tokio::test]
async fn test_domain_mode_prefix() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/management/host/master/server/server-one"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "outcome": "success",
            "result": "running"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = config_for(&server);
    config.endpoint.mode = Mode::Domain;
    config.endpoint.node = Some("master".to_string());
    config.endpoint.instance = Some("server-one".to_string());

    let outcome = CheckEngine::new(&config)
        .unwrap()
        .run(&CheckRequest::new(Action::ServerStatus))
        .await;

    assert_eq!(outcome.status, Status::Ok);
}

#[tokio::test]
async fn test_heap_usage_ok_with_perf_data() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/management/core-service/platform-mbean/type/memory"))
        .and(query_param("include-runtime", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(memory(439564992)))
        .mount(&server)
        .await;

    let outcome = engine_for(&server)
        .run(&CheckRequest::new(Action::HeapUsage))
        .await;

    assert_eq!(outcome.status, Status::Ok);
    let line = StatusFormatter::new().with_perf_data(true).format(&outcome);
    assert!(line.starts_with("OK - Heap Memory Utilization 419.20 MB"));
    assert!(line.ends_with("| heap_usage=42.35%;80;90;0;100"));
}

#[tokio::test]
async fn test_heap_usage_critical() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/management/core-service/platform-mbean/type/memory"))
        .respond_with(ResponseTemplate::new(200).set_body_json(memory(986061209)))
        .mount(&server)
        .await;

    let outcome = engine_for(&server)
        .run(&CheckRequest::new(Action::HeapUsage))
        .await;

    assert_eq!(outcome.status, Status::Critical);
    assert!(outcome.message.contains("(95.00%)"));
}

#[tokio::test]
async fn test_custom_thresholds() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/management/core-service/platform-mbean/type/memory"))
        .respond_with(ResponseTemplate::new(200).set_body_json(memory(439564992)))
        .mount(&server)
        .await;

    let request = CheckRequest {
        warning: Some("40".to_string()),
        critical: Some("60".to_string()),
        ..CheckRequest::new(Action::HeapUsage)
    };
    let outcome = engine_for(&server).run(&request).await;

    assert_eq!(outcome.status, Status::Warning);
}

#[tokio::test]
async fn test_http_404_is_unknown() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let outcome = engine_for(&server)
        .run(&CheckRequest::new(Action::HeapUsage))
        .await;

    assert_eq!(outcome.status, Status::Unknown);
    assert_eq!(outcome.exit_code(), 3);
    assert!(outcome.message.contains("404"));
}

#[tokio::test]
async fn test_failed_outcome_is_critical() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "outcome": "failed",
            "failure-description": "WFLYCTL0216: Management resource not found",
            "rolled-back": true
        })))
        .mount(&server)
        .await;

    let request = CheckRequest {
        queue_name: Some("missing".to_string()),
        ..CheckRequest::new(Action::QueueDepth)
    };
    let outcome = engine_for(&server).run(&request).await;

    assert_eq!(outcome.status, Status::Critical);
    assert!(outcome.message.starts_with("Unexpected value : "));
    assert!(outcome.message.contains("WFLYCTL0216"));
}

#[tokio::test]
async fn test_missing_memory_pool_is_critical() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/management/core-service/platform-mbean/type/memory-pool"))
        .and(query_param("recursive", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": {
                "G1_Old_Gen": {"usage": {"used": 1048576, "max": 10485760}}
            }
        })))
        .mount(&server)
        .await;

    let outcome = engine_for(&server)
        .run(&CheckRequest::new(Action::OldGenUsage))
        .await;
    assert_eq!(outcome.status, Status::Critical);
    assert!(outcome.message.contains("PS_Old_Gen"));

    let request = CheckRequest {
        memory_pool: Some("G1_Old_Gen".to_string()),
        ..CheckRequest::new(Action::OldGenUsage)
    };
    let outcome = engine_for(&server).run(&request).await;
    assert_eq!(outcome.status, Status::Ok);
    assert!(outcome.message.contains("(10.00%)"));
}

#[tokio::test]
async fn test_invalid_parameter_sends_no_request() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(0)
        .mount(&server)
        .await;

    let request = CheckRequest {
        thread_stat_type: Some("bogus".to_string()),
        ..CheckRequest::new(Action::Threading)
    };
    let outcome = engine_for(&server).run(&request).await;

    assert_eq!(outcome.status, Status::Critical);
    assert_eq!(
        outcome.message,
        "The thread statistics value type of 'bogus' is not valid"
    );
}

#[tokio::test]
async fn test_queue_name_with_fragment_sends_no_request() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message-count": 0})))
        .expect(0)
        .mount(&server)
        .await;

    let request = CheckRequest {
        queue_name: Some("orders#x".to_string()),
        ..CheckRequest::new(Action::QueueDepth)
    };
    let outcome = engine_for(&server).run(&request).await;

    assert_eq!(outcome.status, Status::Critical);
    assert_eq!(outcome.message, "The queue name 'orders#x' is not valid");
}

#[tokio::test]
async fn test_threading_statistic() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/management/core-service/platform-mbean/type/threading"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "thread-count": 142,
            "peak-thread-count": 160,
            "total-started-thread-count": 1200,
            "daemon-thread-count": 40
        })))
        .mount(&server)
        .await;

    let request = CheckRequest {
        thread_stat_type: Some("thread-count".to_string()),
        ..CheckRequest::new(Action::Threading)
    };
    let outcome = engine_for(&server).run(&request).await;

    assert_eq!(outcome.status, Status::Warning);
    assert_eq!(
        outcome.message,
        "Threading Statistics 'thread-count': 142"
    );
}

#[tokio::test]
async fn test_digest_authentication() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/management"))
        .and(header_exists("authorization"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "outcome": "success",
            "result": "running"
        })))
        .with_priority(1)
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/management"))
        .respond_with(ResponseTemplate::new(401).insert_header(
            "WWW-Authenticate",
            r#"Digest realm="ManagementRealm",domain="/management",nonce="dcd98b7102dd2f0e8b11d0f600bfb0c093",opaque="5ccc069c403ebaf9f0171e9517f40e41",algorithm=MD5,qop="auth""#,
        ))
        .with_priority(2)
        .expect(1)
        .mount(&server)
        .await;

    let mut config = config_for(&server);
    config.endpoint.username = Some("admin".to_string());
    config.endpoint.password = Some("secret".to_string());

    let outcome = CheckEngine::new(&config)
        .unwrap()
        .run(&CheckRequest::new(Action::ServerStatus))
        .await;

    assert_eq!(outcome.status, Status::Ok);

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 2);
    assert!(requests[0].headers.get("authorization").is_none());

    let authorization = requests[1]
        .headers
        .get("authorization")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(authorization.starts_with("Digest "));

    let answer = AuthorizationHeader::parse(&authorization).unwrap();
    assert_eq!(answer.username, "admin");
    assert_eq!(answer.realm, "ManagementRealm");
    assert_eq!(answer.nonce, "dcd98b7102dd2f0e8b11d0f600bfb0c093");
    assert_eq!(answer.opaque.as_deref(), Some("5ccc069c403ebaf9f0171e9517f40e41"));
    assert_eq!(answer.uri, "/management");
    assert!(matches!(answer.qop, Some(Qop::AUTH)));
    assert_eq!(requests[1].method.as_str(), "POST");
}

#[tokio::test]
async fn test_digest_authentication_get_uri_includes_query() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/management/core-service/platform-mbean/type/memory"))
        .and(header_exists("authorization"))
        .respond_with(ResponseTemplate::new(200).set_body_json(memory(439564992)))
        .with_priority(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401).insert_header(
            "WWW-Authenticate",
            r#"Digest realm="ManagementRealm",nonce="a1b2c3",algorithm=MD5,qop="auth""#,
        ))
        .with_priority(2)
        .mount(&server)
        .await;

    let mut config = config_for(&server);
    config.endpoint.username = Some("monitor".to_string());
    config.endpoint.password = Some("secret".to_string());

    let outcome = CheckEngine::new(&config)
        .unwrap()
        .run(&CheckRequest::new(Action::HeapUsage))
        .await;
    assert_eq!(outcome.status, Status::Ok);

    let requests = server.received_requests().await.unwrap();
    let authorization = requests[1]
        .headers
        .get("authorization")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    let answer = AuthorizationHeader::parse(&authorization).unwrap();
    assert_eq!(answer.username, "monitor");
    assert_eq!(
        answer.uri,
        "/management/core-service/platform-mbean/type/memory?include-runtime=true"
    );
}

#[tokio::test]
async fn test_unauthorized_without_credentials_is_unknown() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(401)
                .insert_header("WWW-Authenticate", r#"Digest realm="ManagementRealm",nonce="abc""#),
        )
        .mount(&server)
        .await;

    let outcome = engine_for(&server)
        .run(&CheckRequest::new(Action::ServerStatus))
        .await;

    assert_eq!(outcome.status, Status::Unknown);
}

#[tokio::test]
async fn test_timeout_is_unknown() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(memory(439564992))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let mut config = config_for(&server);
    config.endpoint.timeout_ms = 100;

    let outcome = CheckEngine::new(&config)
        .unwrap()
        .run(&CheckRequest::new(Action::HeapUsage))
        .await;

    assert_eq!(outcome.status, Status::Unknown);
}

#[tokio::test]
async fn test_deployment_status() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/management/deployment/*"))
        .and(query_param("operation", "attribute"))
        .and(query_param("name", "status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"address": [{"deployment": "shop.war"}], "outcome": "success", "result": "OK"},
            {"address": [{"deployment": "batch.ear"}], "outcome": "success", "result": "STOPPED"}
        ])))
        .mount(&server)
        .await;

    let outcome = engine_for(&server)
        .run(&CheckRequest::new(Action::DeploymentStatus))
        .await;

    assert_eq!(outcome.status, Status::Warning);
    assert_eq!(
        outcome.message,
        "Deployments: shop.war=OK, batch.ear=STOPPED"
    );
}

#[tokio::test]
async fn test_queue_depth_delta() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(
            "/management/subsystem/messaging/hornetq-server/default/jms-queue/orders",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message-count": 17,
            "delivering-count": 0
        })))
        .mount(&server)
        .await;

    let mut engine = engine_for(&server).with_state_store(Box::new(MemoryStateStore::new()));
    let request = CheckRequest {
        queue_name: Some("orders".to_string()),
        ..CheckRequest::new(Action::QueueDepth)
    };

    let first = engine.run(&request).await;
    assert_eq!(first.status, Status::Ok);
    assert_eq!(first.message, "Queue 'orders' message-count=17");
    assert_eq!(first.perf_data.len(), 1);

    let second = engine.run(&request).await;
    assert!(second.message.contains("(delta=+0 over"));
    assert_eq!(second.perf_data[1].label, "queue_depth_delta");
}
