use super::*;
use serde_json::json;
use wiremock::{
    matchers::{body_json, header_regex, method, path},
    Mock, MockServer, ResponseTemplate,
};

const SIGNED: &str = r"^EXO2-HMAC-SHA256 credential=EXOtest,expires=\d+,signature=[A-Za-z0-9+/=]+$";

async fn server() -> (MockServer, String) {
    let server = MockServer::start().await;
    let endpoint = format!("{}/v2", server.uri());
    (server, endpoint)
}

fn api(endpoint: &str) -> HttpApi {
    HttpApi::new(
        Credentials::new("EXOtest", "secret"),
        endpoint,
        Duration::from_secs(5),
    )
    .unwrap()
}

fn zone(endpoint: &str) -> Zone {
    Zone {
        name: "ch-gva-2".to_string(),
        endpoint: endpoint.to_string(),
    }
}

#[test]
fn urls_escape_segments() {
    let url = HttpApi::url("https://api-ch-gva-2.exoscale.com/v2/", &["dbaas-pg", "my db"]).unwrap();
    assert_eq!(
        url.as_str(),
        "https://api-ch-gva-2.exoscale.com/v2/dbaas-pg/my%20db"
    );

    assert!(HttpApi::url("not a url", &["zone"]).is_err());
}

#[tokio::test]
async fn lists_zones_with_a_signed_request() {
    let (server, endpoint) = server().await;
    Mock::given(method("GET"))
        .and(path("/v2/zone"))
        .and(header_regex("authorization", SIGNED))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "zones": [
                {"name": "ch-gva-2", "api-endpoint": "https://api-ch-gva-2.exoscale.com/v2"}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let zones = api(&endpoint).list_zones().await.unwrap();
    assert_eq!(
        zones,
        vec![Zone {
            name: "ch-gva-2".to_string(),
            endpoint: "https://api-ch-gva-2.exoscale.com/v2".to_string(),
        }]
    );
}

#[tokio::test]
async fn puts_the_filter() {
    let (server, endpoint) = server().await;
    Mock::given(method("PUT"))
        .and(path("/v2/dbaas-redis/cache"))
        .and(header_regex("authorization", SIGNED))
        .and(body_json(json!({
            "ip-filter": ["198.51.100.0/24", "203.0.113.5/32"]
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"id": "op-1", "state": "success"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let filter = vec!["198.51.100.0/24".to_string(), "203.0.113.5/32".to_string()];
    api(&endpoint)
        .put_target_config("redis", "cache", &zone(&endpoint), &filter)
        .await
        .unwrap();
}

#[tokio::test]
async fn not_found_is_reported() {
    let (server, endpoint) = server().await;
    Mock::given(method("GET"))
        .and(path("/v2/instance/i-1"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"message": "not found"})))
        .expect(1)
        .mount(&server)
        .await;

    let error = api(&endpoint)
        .get_instance("i-1", &zone(&endpoint))
        .await
        .unwrap_err();
    assert!(error.is_not_found(), "{error}");
}

#[tokio::test]
async fn unexpected_status_is_reported() {
    let (server, endpoint) = server().await;
    Mock::given(method("GET"))
        .and(path("/v2/dbaas-pg/db"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({"message": "denied"})))
        .expect(1)
        .mount(&server)
        .await;

    let error = api(&endpoint)
        .get_target_config("pg", "db", &zone(&endpoint))
        .await
        .unwrap_err();
    match error {
        Error::Status { status, message } => {
            assert_eq!(status, 403);
            assert!(message.contains("denied"), "{message}");
        }
        error => panic!("unexpected error: {error}"),
    }
}

#[tokio::test]
async fn decodes_cluster_detail() {
    let (server, endpoint) = server().await;
    Mock::given(method("GET"))
        .and(path("/v2/sks-cluster/c-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "c-1",
            "name": "prod",
            "nodepools": [{"name": "workers", "instance-pool": {"id": "ip-1"}}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let cluster = api(&endpoint)
        .get_cluster("c-1", &zone(&endpoint))
        .await
        .unwrap();
    assert_eq!(cluster.name, "prod");
    assert_eq!(
        cluster.nodepools[0].instance_pool.as_deref(),
        Some("ip-1")
    );
}
