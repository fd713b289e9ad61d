//! Request handler tests: envelopes, status codes and store side effects

use crate::support::{
    board_page, board_page_with, board_url, headline_page, test_config, FakeLauncher, FakeSite,
    Row, BASE_URL,
};
use forum_sift::api::{self, MarkRequest, SERVER_ERROR, URL_REQUIRED};
use forum_sift::config::StateBackend;
use forum_sift::crawler::Coordinator;
use forum_sift::storage::{self, open_store};
use chrono::Utc;
use reqwest::StatusCode;
use std::sync::Arc;
use tempfile::TempDir;

#[tokio::test]
async fn test_trigger_crawl_success_envelope() {
    let tmp = TempDir::new().unwrap();
    let config = Arc::new(test_config(&["60076", "404"], tmp.path()));
    let store = open_store(&config.state).unwrap();
    let site = FakeSite::new()
        .page(BASE_URL, headline_page())
        .page(board_url("60076"), board_page("場外休憩區", &[(1, "新文", "剛剛")]));
    let (launcher, _) = FakeLauncher::new(site);
    let coordinator = Coordinator::new(config, Box::new(launcher), store);

    let reply = api::trigger_crawl(&coordinator).await;

    assert_eq!(reply.status, StatusCode::OK);
    assert!(reply.is_success());

    let json: serde_json::Value = serde_json::from_str(&reply.to_json()).unwrap();
    assert_eq!(json["success"], true);
    assert!(json.get("error").is_none());
    assert_eq!(json["data"]["boards"][0]["posts"][0]["isRead"], false);
    assert_eq!(json["data"]["boards"][1]["name"], "Board 404 (Error)");
    assert!(json["data"]["generatedAt"].is_string());
}

#[tokio::test]
async fn test_trigger_crawl_failure_envelope() {
    let tmp = TempDir::new().unwrap();
    let config = Arc::new(test_config(&["60076"], tmp.path()));
    let store = open_store(&config.state).unwrap();
    let (launcher, _) = FakeLauncher::failing();
    let coordinator = Coordinator::new(config, Box::new(launcher), store);

    let reply = api::trigger_crawl(&coordinator).await;

    assert!(reply.status.is_server_error());
    assert!(!reply.is_success());
    assert!(reply.body.data.is_none());
    assert!(reply.body.error.unwrap().contains("no browser binary"));
}

#[tokio::test]
async fn test_mark_state_on_both_backends() {
    let tmp = TempDir::new().unwrap();

    for backend in [StateBackend::File, StateBackend::Sqlite] {
        let mut config = test_config(&["60076"], tmp.path());
        config.state.backend = backend;
        config.state.database_path = tmp.path().join("state.db");
        let store = open_store(&config.state).unwrap();

        let reply = api::mark_state(
            &store,
            &MarkRequest {
                url: Some("C.php?bsn=1&snA=7".to_string()),
                action: Some("delete".to_string()),
            },
        );
        assert_eq!(reply.status, StatusCode::OK);
        assert_eq!(reply.to_json(), r#"{"success":true}"#);

        let reply = api::mark_state(
            &store,
            &MarkRequest {
                url: Some("C.php?bsn=1&snA=8".to_string()),
                action: None,
            },
        );
        assert_eq!(reply.status, StatusCode::OK);

        let snapshot = storage::snapshot(&store, Utc::now()).unwrap();
        assert!(snapshot.is_deleted("C.php?bsn=1&snA=7"));
        assert!(snapshot.is_read("C.php?bsn=1&snA=8"));
    }
}

#[test]
fn test_mark_state_without_url() {
    let tmp = TempDir::new().unwrap();
    let config = test_config(&["60076"], tmp.path());
    let store = open_store(&config.state).unwrap();

    let reply = api::mark_state_json(&store, r#"{"action":"read"}"#);

    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.to_json(), r#"{"success":false,"error":"URL required"}"#);
    assert_eq!(reply.body.error.as_deref(), Some(URL_REQUIRED));
    assert!(storage::snapshot(&store, Utc::now()).unwrap().read_urls.is_empty());
}

#[test]
fn test_mark_state_unreadable_body() {
    let tmp = TempDir::new().unwrap();
    let config = test_config(&["60076"], tmp.path());
    let store = open_store(&config.state).unwrap();

    let reply = api::mark_state_json(&store, "{url:");

    assert_eq!(reply.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(reply.body.error.as_deref(), Some(SERVER_ERROR));
}

#[tokio::test]
async fn test_mark_untrimmed_scraped_url() {
    let tmp = TempDir::new().unwrap();
    let config = Arc::new(test_config(&["60076"], tmp.path()));
    let store = open_store(&config.state).unwrap();
    let site = FakeSite::new().page(BASE_URL, headline_page()).page(
        board_url("60076"),
        board_page_with(
            "場外休憩區",
            &[
                Row::new(9, "新文", "剛剛").href(" C.php?bsn=1&amp;snA=9 "),
                Row::new(10, "攻略", "剛剛"),
            ],
        ),
    );
    let (launcher, _) = FakeLauncher::new(site);
    let coordinator = Coordinator::new(config, Box::new(launcher), store.clone());

    let first = coordinator.run().await.unwrap();
    let scraped = first.boards[0].posts[0].url.clone();
    assert_eq!(scraped, " C.php?bsn=1&snA=9 ");

    let reply = api::mark_state(
        &store,
        &MarkRequest {
            url: Some(scraped),
            action: Some("delete".to_string()),
        },
    );
    assert_eq!(reply.status, StatusCode::OK);

    let second = coordinator.run().await.unwrap();
    let urls: Vec<_> = second.boards[0]
        .posts
        .iter()
        .map(|p| p.url.as_str())
        .collect();
    assert_eq!(urls, vec!["C.php?bsn=1&snA=10"]);
}

#[test]
fn test_mark_state_sqlite_write_failure() {
    let tmp = TempDir::new().unwrap();
    let mut config = test_config(&["60076"], tmp.path());
    config.state.backend = StateBackend::Sqlite;
    config.state.database_path = tmp.path().join("state.db");
    let store = open_store(&config.state).unwrap();

    rusqlite::Connection::open(&config.state.database_path)
        .unwrap()
        .execute_batch("DROP TABLE url_states")
        .unwrap();

    let reply = api::mark_state(
        &store,
        &MarkRequest {
            url: Some("C.php?bsn=1&snA=7".to_string()),
            action: Some("read".to_string()),
        },
    );

    assert_eq!(reply.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(reply.to_json(), r#"{"success":false,"error":"Server Error"}"#);
}
