use ec2_price::{
    config::{load_config, Config},
    handlers::AppState,
    pricing::PriceStore,
    server::{build_updater, run_server},
    signals::ShutdownSignal,
};
use metrics_exporter_prometheus::PrometheusBuilder;
use reqwest::StatusCode;
use serde_json::json;
use std::{net::SocketAddr, sync::Arc};
use tokio::{net::TcpListener, sync::broadcast, task::JoinHandle};
use wiremock::{matchers::method, Mock, MockServer, ResponseTemplate};

fn config_for(dir: &tempfile::TempDir, endpoint: &str) -> Config {
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        format!(
            r#"
[pricing]
endpoint = "{endpoint}"

[aws]
access_key_id = "AKIDEXAMPLE"
secret_access_key = "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY"
"#
        ),
    )
    .unwrap();
    load_config(&path).unwrap()
}

async fn launch(
    cfg: Config,
) -> (
    SocketAddr,
    broadcast::Sender<ShutdownSignal>,
    JoinHandle<anyhow::Result<()>>,
) {
    let store = Arc::new(PriceStore::new());
    let updater = Arc::new(build_updater(&cfg, store.clone()).unwrap());
    let state = AppState {
        store,
        metrics_handle: Arc::new(PrometheusBuilder::new().build_recorder().handle()),
    };

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (shutdown_tx, _) = broadcast::channel(4);

    let handle = tokio::spawn(run_server(
        listener,
        updater,
        state,
        cfg.server.clone(),
        shutdown_tx.clone(),
    ));
    (addr, shutdown_tx, handle)
}

#[tokio::test]
async fn test_failed_initial_fetch_still_serves_empty_table() {
    let pricing_api = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal failure"))
        .mount(&pricing_api)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let (addr, shutdown_tx, handle) = launch(config_for(&dir, &pricing_api.uri())).await;

    let all = reqwest::get(format!("http://{}/all", addr)).await.unwrap();
    assert_eq!(all.status(), StatusCode::NOT_FOUND);

    let region = reqwest::get(format!("http://{}/eu-west-1", addr)).await.unwrap();
    assert_eq!(region.status(), StatusCode::NOT_FOUND);

    let health = reqwest::get(format!("http://{}/health", addr)).await.unwrap();
    assert_eq!(health.status(), StatusCode::OK);
    let body: serde_json::Value = health.json().await.unwrap();
    assert_eq!(body["regions"], 0);

    assert_eq!(pricing_api.received_requests().await.unwrap().len(), 1);

    shutdown_tx.send(ShutdownSignal::Graceful).unwrap();
    handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_initial_fetch_completes_before_serving() {
    let pricing_api = MockServer::start().await;
    let entry = json!({
        "product": {"attributes": {"location": "EU (Ireland)", "instanceType": "t3.nano"}},
        "terms": {"OnDemand": {"T": {"priceDimensions": {"D": {"pricePerUnit": {"USD": "0.0057000000"}}}}}}
    })
    .to_string();
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"PriceList": [entry]})))
        .mount(&pricing_api)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let (addr, shutdown_tx, handle) = launch(config_for(&dir, &pricing_api.uri())).await;

    // The first request already sees the fetched table
    let price = reqwest::get(format!("http://{}/eu-west-1/t3.nano", addr))
        .await
        .unwrap();
    assert_eq!(price.status(), StatusCode::OK);
    assert_eq!(price.text().await.unwrap(), "0.0057000000\n");

    shutdown_tx.send(ShutdownSignal::Graceful).unwrap();
    handle.await.unwrap().unwrap();
}
