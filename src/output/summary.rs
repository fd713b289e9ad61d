//! Statistics over a finished crawl result

use crate::model::CrawlResult;

/// Crawl statistics summary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlStatistics {
    pub headlines: usize,
    pub boards: usize,

    /// Boards that fell back to a placeholder result
    pub failed_boards: Vec<String>,

    pub total_posts: usize,
    pub read_posts: usize,

    /// Post count per board, in crawl order
    pub posts_per_board: Vec<(String, usize)>,

    pub generated_at: String,
}

impl CrawlStatistics {
    pub fn unread_posts(&self) -> usize {
        self.total_posts - self.read_posts
    }
}

/// Computes statistics for a crawl result
pub fn summarize(result: &CrawlResult) -> CrawlStatistics {
    let posts_per_board = result
        .boards
        .iter()
        .map(|b| (b.name.clone(), b.posts.len()))
        .collect::<Vec<_>>();

    let failed_boards = result
        .boards
        .iter()
        .filter(|b| b.failed)
        .map(|b| b.name.clone())
        .collect();

    let all_posts = result.boards.iter().flat_map(|b| b.posts.iter());

    CrawlStatistics {
        headlines: result.headlines.len(),
        boards: result.boards.len(),
        failed_boards,
        total_posts: all_posts.clone().count(),
        read_posts: all_posts.filter(|p| p.is_read).count(),
        posts_per_board,
        generated_at: result.generated_at.clone(),
    }
}

/// Prints statistics in a human-readable format
pub fn print_statistics(stats: &CrawlStatistics) {
    println!("=== Crawl Statistics ===\n");

    println!("Overview:");
    println!("  Generated at: {}", stats.generated_at);
    println!("  Headlines: {}", stats.headlines);
    println!("  Boards: {}", stats.boards);
    println!(
        "  Posts: {} ({} unread, {} read)",
        stats.total_posts,
        stats.unread_posts(),
        stats.read_posts
    );
    println!();

    println!("Posts by Board:");
    for (name, count) in &stats.posts_per_board {
        println!("  {}: {}", name, count);
    }
    println!();

    if !stats.failed_boards.is_empty() {
        println!("Failed Boards ({}):", stats.failed_boards.len());
        for name in &stats.failed_boards {
            println!("  - {}", name);
        }
        println!();
    }
}
