use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use cloudlens_ai::{SummarySource, SummaryTarget};
use cloudlens_cache::{ErrorKind, RefreshError, RefreshOutcome};
use cloudlens_client::{Inventory, ResourceKind};
use cloudlens_config::Config;
use cloudlens_storage::{KeyValueStore, MemoryStore};
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::{App, UnconfiguredProvider};

fn config(api_url: &str) -> Config {
    Config {
        api_url: api_url.to_string(),
        http_timeout: Duration::from_secs(5),
        client_id: None,
        tenant_id: "common".to_string(),
        redirect_port: 3737,
        api_scopes: Vec::new(),
        token_expiry_buffer: Duration::from_secs(30),
        data_dir: PathBuf::from("/tmp/cloudlens-test"),
        retention: Duration::from_secs(365 * 24 * 60 * 60),
        max_cache_entries: None,
        gemini_api_key: None,
        gemini_model: "gemini-3-flash-preview".to_string(),
    }
}

async fn app(api_url: &str, storage: Arc<MemoryStore>) -> App {
    App::assemble(config(api_url), Arc::new(UnconfiguredProvider::new()), storage)
        .await
        .unwrap()
}

#[tokio::test]
async fn test_refresh_then_restart_serves_snapshot() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/aws/ec2/amis"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"ImageId": "ami-1"}])))
        .expect(1)
        .mount(&server)
        .await;
    let storage = Arc::new(MemoryStore::new());

    let first = app(&server.uri(), storage.clone()).await;
    let outcome = first
        .inventory()
        .refresh(ResourceKind::Ec2Amis, &[])
        .await
        .unwrap();
    assert_eq!(outcome, RefreshOutcome::Updated);
    first.shutdown();

    let second = app(&server.uri(), storage.clone()).await;
    assert_eq!(second.inventory().entry(ResourceKind::Ec2Amis, &[]).payload, None);
    let report = second.rehydrate().await.unwrap();

    assert_eq!(report.restored, 1);
    assert_eq!(
        second.inventory().entry(ResourceKind::Ec2Amis, &[]).payload,
        Some(json!([{"ImageId": "ami-1"}]))
    );
}

#[tokio::test]
async fn test_azure_refresh_without_sign_in_records_error() {
    let server = MockServer::start().await;
    let storage = Arc::new(MemoryStore::new());
    let app = app(&server.uri(), storage.clone()).await;

    let outcome = app
        .inventory()
        .refresh(ResourceKind::AzureAccounts, &[])
        .await
        .unwrap();

    match outcome {
        RefreshOutcome::Failed(error) => assert_eq!(error.kind, ErrorKind::NoActiveIdentity),
        other => panic!("expected failure, got {:?}", other),
    }
    assert!(storage.is_empty().await);
    assert!(storage.entries_with_prefix("").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_login_without_client_id_names_the_setting() {
    let app = app("http://localhost:7071/api", Arc::new(MemoryStore::new())).await;

    let error = app.login().await.unwrap_err();

    assert!(error.to_string().contains("CLOUDLENS_CLIENT_ID"));
    assert_eq!(app.credentials().active_identity(), None);
}

#[tokio::test]
async fn test_bucket_summary_uses_bucket_advice_offline() {
    let app = app("http://localhost:7071/api", Arc::new(MemoryStore::new())).await;
    let params = vec!["logs".to_string()];
    let key = Inventory::key(ResourceKind::S3Details, &params);
    app.cache()
        .refresh(&key, || async {
            Ok::<_, RefreshError>(json!({
                "region": "eu-west-1",
                "public_access": {"BlockPublicAcls": true},
                "versioning": "Suspended"
            }))
        })
        .await;

    let (target, summary) = app
        .summarize(ResourceKind::S3Details, &params)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(target, SummaryTarget::S3Bucket);
    assert_eq!(summary.source, SummarySource::Fallback);
    assert_eq!(
        summary.insights,
        vec![
            "Bucket \"logs\" in eu-west-1 has strong security",
            "Enable versioning to protect against accidental deletions",
            "Consider enabling server-side encryption for enhanced security",
        ]
    );
}

#[tokio::test]
async fn test_summary_without_snapshot_is_none() {
    let app = app("http://localhost:7071/api", Arc::new(MemoryStore::new())).await;
    let params = vec!["prodstore".to_string(), "rg-prod".to_string()];

    let summary = app
        .summarize(ResourceKind::AzureDetails, &params)
        .await
        .unwrap();

    assert!(summary.is_none());
}

#[tokio::test]
async fn test_summary_rejects_listings() {
    let app = app("http://localhost:7071/api", Arc::new(MemoryStore::new())).await;

    let error = app
        .summarize(ResourceKind::Ec2Instances, &[])
        .await
        .unwrap_err();

    assert!(error.to_string().contains("s3-details"));
}
