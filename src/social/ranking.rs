use std::cmp::Reverse;

use itertools::Itertools;

use crate::evaluation::models::{Post, PostId, UserId};
use crate::prelude::*;

/// Users with the most posts, ties broken by the lower ID.
pub fn top_users(post_counts: &AHashMap<UserId, usize>, limit: usize) -> Vec<UserId> {
    post_counts
        .iter()
        .sorted_unstable_by_key(|(user_id, n_posts)| (Reverse(**n_posts), **user_id))
        .take(limit)
        .map(|(user_id, _)| *user_id)
        .collect()
}

/// All the posts tied for the highest comment count, in their original order.
///
/// Posts missing from `comment_counts` are considered to have no comments.
pub fn most_commented(posts: Vec<Post>, comment_counts: &AHashMap<PostId, usize>) -> Vec<Post> {
    let n_comments = |post: &Post| comment_counts.get(&post.id).copied().unwrap_or_default();
    let max_comments = match posts.iter().map(n_comments).max() {
        Some(max_comments) => max_comments,
        None => return Vec::new(),
    };
    posts
        .into_iter()
        .filter(|post| n_comments(post) == max_comments)
        .collect()
}

/// Posts with the highest IDs, newest first.
pub fn latest(posts: Vec<Post>, limit: usize) -> Vec<Post> {
    posts
        .into_iter()
        .sorted_by_key(|post| Reverse(post.id))
        .take(limit)
        .collect()
}
