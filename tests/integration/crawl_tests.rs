//! End-to-end crawl tests over an in-memory browser

use crate::support::{
    board_page, board_page_with, board_url, challenge_page, headline_page, test_config,
    FakeLauncher, FakePage, FakeSite, Row, BASE_URL,
};
use forum_sift::crawler::{
    BoardScraper, ChallengePageStrategy, Coordinator, ExtractRules, ObstacleHandler, RateLimiter,
    RunPhase,
};
use forum_sift::storage::{self, open_store};
use forum_sift::StateStatus;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

fn two_board_site() -> FakeSite {
    FakeSite::new()
        .page(BASE_URL, headline_page())
        .page(
            board_url("60076"),
            board_page(
                "場外休憩區",
                &[
                    (1, "新角色心得", "剛剛"),
                    (2, "【集中】抽卡串", "1分前"),
                    (3, "上個月的文", "2024/05/01"),
                    (4, "攻略分享", "3小時前"),
                ],
            ),
        )
        .page(
            board_url("36730"),
            board_page("原神", &[(10, "版本前瞻", "昨天 20:15")]),
        )
}

#[tokio::test]
async fn test_full_crawl_two_boards() {
    let tmp = TempDir::new().unwrap();
    let config = Arc::new(test_config(&["60076", "36730"], tmp.path()));
    let store = open_store(&config.state).unwrap();
    let (launcher, counters) = FakeLauncher::new(two_board_site());

    let coordinator = Coordinator::new(config, Box::new(launcher), store);
    let result = coordinator.run().await.unwrap();

    assert_eq!(result.headlines.len(), 1);
    assert_eq!(result.headlines[0].url, "https://www.gamer.com.tw/news/1");

    assert_eq!(result.boards.len(), 2);
    assert_eq!(result.boards[0].name, "場外休憩區");
    let titles: Vec<_> = result.boards[0]
        .posts
        .iter()
        .map(|p| p.title.as_str())
        .collect();
    assert_eq!(titles, vec!["新角色心得", "攻略分享"]);
    assert_eq!(result.boards[1].name, "原神");
    assert_eq!(result.boards[1].posts.len(), 1);
    assert_eq!(result.boards[1].posts[0].brief, "brief 10");

    assert!(!result.generated_at.is_empty());
    assert_eq!(counters.acquired(), 1);
    assert_eq!(counters.released(), 1);
    assert_eq!(coordinator.phase(), RunPhase::Released);
}

#[tokio::test]
async fn test_failed_board_keeps_sibling_intact() {
    let tmp = TempDir::new().unwrap();
    let config = Arc::new(test_config(&["60076", "99999"], tmp.path()));
    let store = open_store(&config.state).unwrap();
    let (launcher, counters) = FakeLauncher::new(two_board_site());

    let coordinator = Coordinator::new(config, Box::new(launcher), store);
    let result = coordinator.run().await.unwrap();

    assert_eq!(result.boards.len(), 2);
    assert_eq!(result.boards[0].name, "場外休憩區");
    assert_eq!(result.boards[0].posts.len(), 2);
    assert_eq!(result.boards[1].name, "Board 99999 (Error)");
    assert!(result.boards[1].posts.is_empty());
    assert_eq!(counters.released(), 1);
}

#[tokio::test]
async fn test_navigation_failure_and_missing_headlines_degrade() {
    let tmp = TempDir::new().unwrap();
    let config = Arc::new(test_config(&["60076", "36730"], tmp.path()));
    let store = open_store(&config.state).unwrap();
    let site = FakeSite::new()
        .broken(BASE_URL)
        .broken(board_url("60076"))
        .page(
            board_url("36730"),
            board_page("原神", &[(10, "版本前瞻", "剛剛")]),
        );
    let (launcher, counters) = FakeLauncher::new(site);

    let result = Coordinator::new(config, Box::new(launcher), store)
        .run()
        .await
        .unwrap();

    assert!(result.headlines.is_empty());
    assert_eq!(result.boards[0].name, "Board 60076 (Error)");
    assert_eq!(result.boards[1].posts.len(), 1);
    assert_eq!(counters.released(), 1);
}

#[tokio::test]
async fn test_acquire_failure_is_fatal() {
    let tmp = TempDir::new().unwrap();
    let config = Arc::new(test_config(&["60076"], tmp.path()));
    let store = open_store(&config.state).unwrap();
    let (launcher, counters) = FakeLauncher::failing();

    let coordinator = Coordinator::new(config, Box::new(launcher), store);
    assert_eq!(coordinator.phase(), RunPhase::Idle);
    let err = coordinator.run().await.unwrap_err();

    assert!(err.to_string().contains("no browser binary"));
    assert_eq!(coordinator.phase(), RunPhase::Failed);
    assert_eq!(counters.acquired(), 0);
    assert_eq!(counters.released(), 0);
}

#[tokio::test]
async fn test_delay_between_boards_only() {
    let tmp = TempDir::new().unwrap();
    let config = Arc::new(test_config(&["60076", "36730", "99999"], tmp.path()));
    let store = open_store(&config.state).unwrap();
    let (launcher, _) = FakeLauncher::new(two_board_site());

    let coordinator = Coordinator::new(config, Box::new(launcher), store)
        .with_rate_limiter(RateLimiter::fixed(Duration::ZERO));
    coordinator.run().await.unwrap();

    assert_eq!(coordinator.rate_limiter().waits(), 2);
}

#[tokio::test]
async fn test_single_board_never_waits() {
    let tmp = TempDir::new().unwrap();
    let config = Arc::new(test_config(&["60076"], tmp.path()));
    let store = open_store(&config.state).unwrap();
    let (launcher, _) = FakeLauncher::new(two_board_site());

    let coordinator = Coordinator::new(config, Box::new(launcher), store);
    coordinator.run().await.unwrap();

    assert_eq!(coordinator.rate_limiter().waits(), 0);
}

#[tokio::test]
async fn test_crawl_reconciles_stored_markers() {
    let tmp = TempDir::new().unwrap();
    let config = Arc::new(test_config(&["60076"], tmp.path()));
    let store = open_store(&config.state).unwrap();
    storage::put(&store, "C.php?bsn=1&snA=1", StateStatus::Read).unwrap();
    storage::put(&store, "C.php?bsn=1&snA=4", StateStatus::Deleted).unwrap();
    let (launcher, _) = FakeLauncher::new(two_board_site());

    let result = Coordinator::new(config, Box::new(launcher), store.clone())
        .run()
        .await
        .unwrap();

    let posts = &result.boards[0].posts;
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].url, "C.php?bsn=1&snA=1");
    assert!(posts[0].is_read);
}

#[tokio::test]
async fn test_challenge_page_fails_board() {
    let tmp = TempDir::new().unwrap();
    let config = Arc::new(test_config(&["60076"], tmp.path()));
    let site = FakeSite::new().page(
        board_url("60076"),
        "<html><head><title>Just a moment...</title></head><body></body></html>",
    );
    let page = FakePage::new(Arc::new(site));

    let rules = ExtractRules::live(&config);
    let obstacles = ObstacleHandler::empty()
        .with_strategy(ChallengePageStrategy::new(vec!["Just a moment".to_string()]));
    let scraper = BoardScraper::new(&config, &rules, &obstacles).unwrap();

    let board = scraper.scrape_board(&page, "60076").await;

    assert_eq!(board.name, "Board 60076 (Error)");
    assert_eq!(page.visits(), vec![board_url("60076")]);
}

#[tokio::test]
async fn test_snapshot_coordinator_skips_reconciliation() {
    let tmp = TempDir::new().unwrap();
    let config = Arc::new(test_config(&["60076"], tmp.path()));
    let store = open_store(&config.state).unwrap();
    storage::put(&store, "C.php?bsn=1&snA=4", StateStatus::Deleted).unwrap();
    let (launcher, counters) = FakeLauncher::new(two_board_site());

    let result = Coordinator::for_snapshot(config, Box::new(launcher))
        .run()
        .await
        .unwrap();

    let urls: Vec<_> = result.boards[0]
        .posts
        .iter()
        .map(|p| p.url.as_str())
        .collect();
    assert_eq!(urls, vec!["C.php?bsn=1&snA=1", "C.php?bsn=1&snA=4"]);
    assert!(result.boards[0].posts.iter().all(|p| !p.is_read));
    assert_eq!(counters.released(), 1);
}

#[tokio::test]
async fn test_scrape_board_five_row_listing() {
    let tmp = TempDir::new().unwrap();
    let config = test_config(&["60076"], tmp.path());
    let site = FakeSite::new().page(
        board_url("60076"),
        board_page_with(
            "場外休憩區",
            &[
                Row::new(1, "版規與置頂", "剛剛").sticky(),
                Row::new(2, "新手發問區", "3分前"),
                Row::new(3, "去年的心得", "2025/03/02"),
                Row::new(4, "今日抽卡結果", "5分前"),
                Row::new(5, "活動攻略", "1小時前"),
            ],
        ),
    );
    let page = FakePage::new(Arc::new(site));

    let rules = ExtractRules::live(&config);
    let obstacles = ObstacleHandler::from_config(&config);
    let scraper = BoardScraper::new(&config, &rules, &obstacles).unwrap();

    let board = scraper.scrape_board(&page, "60076").await;

    assert_eq!(board.name, "場外休憩區");
    assert!(!board.failed);
    let urls: Vec<_> = board.posts.iter().map(|p| p.url.as_str()).collect();
    assert_eq!(urls, vec!["C.php?bsn=1&snA=4", "C.php?bsn=1&snA=5"]);
}

#[tokio::test]
async fn test_persistent_challenge_retries_then_fails() {
    let tmp = TempDir::new().unwrap();
    let mut config = test_config(&["60076"], tmp.path());
    config.obstacles.challenge_retries = 1;
    let site = FakeSite::new().page(board_url("60076"), challenge_page("Just a moment..."));
    let page = FakePage::new(Arc::new(site));

    let rules = ExtractRules::live(&config);
    let obstacles = ObstacleHandler::from_config(&config);
    let scraper = BoardScraper::new(&config, &rules, &obstacles).unwrap();

    let board = scraper.scrape_board(&page, "60076").await;

    assert_eq!(board.name, "Board 60076 (Error)");
    assert!(board.failed);
    assert_eq!(page.visits(), vec![board_url("60076"), board_url("60076")]);
}

#[tokio::test]
async fn test_challenge_cleared_on_second_visit() {
    let tmp = TempDir::new().unwrap();
    let mut config = test_config(&["60076"], tmp.path());
    config.obstacles.challenge_retries = 1;
    let site = FakeSite::new().page_sequence(
        board_url("60076"),
        vec![
            challenge_page("Just a moment..."),
            board_page("場外休憩區", &[(1, "新文", "剛剛"), (2, "攻略", "2分前")]),
        ],
    );
    let page = FakePage::new(Arc::new(site));

    let rules = ExtractRules::live(&config);
    let obstacles = ObstacleHandler::from_config(&config);
    let scraper = BoardScraper::new(&config, &rules, &obstacles).unwrap();

    let board = scraper.scrape_board(&page, "60076").await;

    assert_eq!(board.name, "場外休憩區");
    assert_eq!(board.posts.len(), 2);
    assert_eq!(page.visits().len(), 2);
}

#[tokio::test]
async fn test_coordinator_uses_custom_obstacle_handler() {
    let tmp = TempDir::new().unwrap();
    let mut config = test_config(&["60076", "36730"], tmp.path());
    config.obstacles.challenge_retries = 1;
    let config = Arc::new(config);
    let store = open_store(&config.state).unwrap();
    let site = FakeSite::new()
        .page(BASE_URL, headline_page())
        .page_sequence(
            board_url("60076"),
            vec![
                challenge_page("Checking your browser"),
                board_page("場外休憩區", &[(1, "新文", "剛剛")]),
            ],
        )
        .page(board_url("36730"), challenge_page("Checking your browser"));
    let (launcher, counters) = FakeLauncher::new(site);

    let obstacles = ObstacleHandler::empty()
        .with_strategy(ChallengePageStrategy::new(vec!["Checking your browser".to_string()]));
    let coordinator =
        Coordinator::new(config, Box::new(launcher), store).with_obstacles(obstacles);
    let result = coordinator.run().await.unwrap();

    assert_eq!(result.boards[0].name, "場外休憩區");
    assert_eq!(result.boards[0].posts.len(), 1);
    assert_eq!(result.boards[1].name, "Board 36730 (Error)");
    assert!(result.boards[1].failed);
    assert_eq!(counters.released(), 1);
    assert_eq!(coordinator.phase(), RunPhase::Released);
}

#[tokio::test]
async fn test_unreadable_state_leaves_boards_unfiltered() {
    let tmp = TempDir::new().unwrap();
    let config = Arc::new(test_config(&["60076"], tmp.path()));
    let store = open_store(&config.state).unwrap();
    storage::put(&store, "C.php?bsn=1&snA=4", StateStatus::Deleted).unwrap();
    std::fs::create_dir(tmp.path().join("read-history.json")).unwrap();
    assert!(storage::snapshot(&store, chrono::Utc::now()).is_err());
    let (launcher, counters) = FakeLauncher::new(two_board_site());

    let result = Coordinator::new(config, Box::new(launcher), store)
        .run()
        .await
        .unwrap();

    let urls: Vec<_> = result.boards[0]
        .posts
        .iter()
        .map(|p| p.url.as_str())
        .collect();
    assert_eq!(urls, vec!["C.php?bsn=1&snA=1", "C.php?bsn=1&snA=4"]);
    assert!(result.boards[0].posts.iter().all(|p| !p.is_read));
    assert_eq!(counters.released(), 1);
}
