//! Merges scraped boards with the user-action snapshot

use crate::model::BoardResult;
use crate::state::StateSnapshot;

/// What happens to one scraped post
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Hidden from the output
    Drop,
    /// Kept, flagged read or unread
    Keep { is_read: bool },
}

/// Decides the fate of a post URL
///
/// A deletion outranks a read marker: a URL both read and deleted is dropped.
pub fn disposition(url: &str, snapshot: &StateSnapshot) -> Disposition {
    if snapshot.is_deleted(url) {
        Disposition::Drop
    } else {
        Disposition::Keep {
            is_read: snapshot.is_read(url),
        }
    }
}

/// Drops deleted posts and flags read ones, preserving board and post order
pub fn reconcile(boards: Vec<BoardResult>, snapshot: &StateSnapshot) -> Vec<BoardResult> {
    boards
        .into_iter()
        .map(|mut board| {
            board.posts = board
                .posts
                .into_iter()
                .filter_map(|mut post| match disposition(&post.url, snapshot) {
                    Disposition::Drop => None,
                    Disposition::Keep { is_read } => {
                        post.is_read = is_read;
                        Some(post)
                    }
                })
                .collect();
            board
        })
        .collect()
}
