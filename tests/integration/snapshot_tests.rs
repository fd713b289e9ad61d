//! Offline snapshot tests: batch output and loading over HTTP

use crate::support::{board_page, board_url, headline_page, test_config, FakeLauncher, FakeSite, BASE_URL};
use forum_sift::api;
use forum_sift::crawler::Coordinator;
use forum_sift::output::{load_snapshot, write_snapshot};
use forum_sift::storage::{self, open_store};
use forum_sift::StateStatus;
use reqwest::StatusCode;
use std::sync::Arc;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn batch_snapshot_json(tmp: &TempDir) -> String {
    let config = Arc::new(test_config(&["60076"], tmp.path()));
    let site = FakeSite::new().page(BASE_URL, headline_page()).page(
        board_url("60076"),
        board_page(
            "場外休憩區",
            &[(1, "新文", "剛剛"), (2, "曬卡大會", "5分前"), (3, "舊聞", "10分前")],
        ),
    );
    let (launcher, _) = FakeLauncher::new(site);

    let result = Coordinator::for_snapshot(config, Box::new(launcher))
        .run()
        .await
        .unwrap();

    let out = tmp.path().join("public").join("daily-news.json");
    write_snapshot(&result, &out).unwrap();
    std::fs::read_to_string(out).unwrap()
}

#[tokio::test]
async fn test_batch_job_applies_extra_ban_list() {
    let tmp = TempDir::new().unwrap();
    let json = batch_snapshot_json(&tmp).await;

    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    let posts = value["boards"][0]["posts"].as_array().unwrap();
    let titles: Vec<_> = posts.iter().map(|p| p["title"].as_str().unwrap()).collect();
    assert_eq!(titles, vec!["新文", "舊聞"]);
    assert!(value["generatedAt"].is_string());
}

#[tokio::test]
async fn test_load_snapshot_over_http() {
    let tmp = TempDir::new().unwrap();
    let json = batch_snapshot_json(&tmp).await;

    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/daily-news.json"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(json, "application/json"))
        .mount(&mock_server)
        .await;

    let url = format!("{}/daily-news.json", mock_server.uri());
    let result = load_snapshot(&url).await.unwrap();

    assert_eq!(result.boards.len(), 1);
    assert_eq!(result.headlines[0].title, "頭條一");
}

#[tokio::test]
async fn test_offline_load_reconciles_against_store() {
    let tmp = TempDir::new().unwrap();
    let json = batch_snapshot_json(&tmp).await;

    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/daily-news.json"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(json, "application/json"))
        .mount(&mock_server)
        .await;

    let config = test_config(&["60076"], tmp.path());
    let store = open_store(&config.state).unwrap();
    storage::put(&store, "C.php?bsn=1&snA=1", StateStatus::Deleted).unwrap();
    storage::put(&store, "C.php?bsn=1&snA=3", StateStatus::Read).unwrap();

    let url = format!("{}/daily-news.json", mock_server.uri());
    let reply = api::load_offline(&store, &url).await;

    assert_eq!(reply.status, StatusCode::OK);
    let data = reply.body.data.unwrap();
    let posts = &data.boards[0].posts;
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].url, "C.php?bsn=1&snA=3");
    assert!(posts[0].is_read);
}

#[tokio::test]
async fn test_offline_load_http_error() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/daily-news.json"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let tmp = TempDir::new().unwrap();
    let config = test_config(&["60076"], tmp.path());
    let store = open_store(&config.state).unwrap();

    let url = format!("{}/daily-news.json", mock_server.uri());
    let reply = api::load_offline(&store, &url).await;

    assert_eq!(reply.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(!reply.is_success());
}
