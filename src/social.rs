//! Social analytics: top users by post count, most commented and latest posts.

use futures::future::join_all;
use poem::http::{header, StatusCode};
use poem::middleware::{CatchPanic, Tracing};
use poem::web::{Data, Json, Path, Query};
use poem::{get, handler, Endpoint, EndpointExt, IntoResponse, Request, Response, Route};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::evaluation::models::{CommentsResponse, Post, PostId, PostsResponse, UserId};
use crate::evaluation::{EvaluationApi, SocialSource};
use crate::opts::SocialOpts;
use crate::prelude::*;
use crate::web;
use crate::web::middleware::{ErrorMiddleware, TimeItMiddleware};
use crate::web::responses;

pub mod ranking;

const N_TOP_USERS: usize = 5;
const N_LATEST_POSTS: usize = 5;

pub async fn run(opts: SocialOpts) -> Result {
    sentry::configure_scope(|scope| scope.set_tag("app", "social"));

    let api = EvaluationApi::new(opts.evaluation.base_url, opts.evaluation.timeout)?;
    let app = create_app(Arc::new(api), Arc::new(PostCounts::default()));
    web::serve(&opts.host, opts.port, app).await
}

pub fn create_app(
    source: Arc<dyn SocialSource>,
    post_counts: Arc<PostCounts>,
) -> impl Endpoint<Output = Response> {
    Route::new()
        .at("/users", get(get_top_users))
        .at("/:user_id/posts", get(get_user_posts))
        .at("/posts", get(get_posts))
        .at("/posts/:post_id/comments", get(get_post_comments))
        .data(source)
        .data(post_counts)
        .with(Tracing)
        .with(CatchPanic::new())
        .with(TimeItMiddleware)
        .with(ErrorMiddleware)
}

/// Post counts per user, accumulated over the process lifetime.
///
/// A later fetch overwrites the counts of the users it has seen and keeps the rest.
#[derive(Default)]
pub struct PostCounts(Mutex<AHashMap<UserId, usize>>);

impl PostCounts {
    pub async fn update_and_rank(
        &self,
        fetched: impl IntoIterator<Item = (UserId, usize)>,
        limit: usize,
    ) -> Vec<UserId> {
        let mut post_counts = self.0.lock().await;
        post_counts.extend(fetched);
        ranking::top_users(&post_counts, limit)
    }
}

#[derive(Deserialize)]
struct PostsQuery {
    #[serde(rename = "type")]
    type_: Option<String>,
}

#[derive(Serialize)]
struct TopUsersResponse {
    top_users: Vec<UserId>,
}

#[derive(Serialize)]
struct PopularPostsResponse {
    popular_posts: Vec<Post>,
}

#[derive(Serialize)]
struct LatestPostsResponse {
    latest_posts: Vec<Post>,
}

fn authorization(request: &Request) -> Option<&str> {
    request.header(header::AUTHORIZATION)
}

#[handler]
#[instrument(skip_all, level = "info")]
async fn get_top_users(
    request: &Request,
    source: Data<&Arc<dyn SocialSource>>,
    post_counts: Data<&Arc<PostCounts>>,
) -> Result<Response> {
    let authorization = match authorization(request) {
        Some(authorization) => authorization,
        None => {
            return Ok(responses::error(
                StatusCode::UNAUTHORIZED,
                "Authorization header is required",
            ));
        }
    };
    let source: &dyn SocialSource = source.0.as_ref();

    let user_ids = source.users(Some(authorization)).await;
    let fetched = join_all(user_ids.iter().map(|&user_id| async move {
        let n_posts = source.user_posts(user_id, Some(authorization)).await.len();
        (user_id, n_posts)
    }))
    .await;
    let top_users = post_counts.update_and_rank(fetched, N_TOP_USERS).await;

    debug!(n_users = user_ids.len(), ?top_users);
    Ok(Json(TopUsersResponse { top_users }).into_response())
}

#[handler]
#[instrument(skip_all, level = "info")]
async fn get_user_posts(
    request: &Request,
    Path(user_id): Path<UserId>,
    source: Data<&Arc<dyn SocialSource>>,
) -> Result<Response> {
    let posts = source.user_posts(user_id, authorization(request)).await;
    debug!(user_id, n_posts = posts.len());
    Ok(Json(PostsResponse { posts }).into_response())
}

#[handler]
#[instrument(skip_all, level = "info")]
async fn get_posts(
    request: &Request,
    Query(query): Query<PostsQuery>,
    source: Data<&Arc<dyn SocialSource>>,
) -> Result<Response> {
    let authorization = authorization(request);
    let source: &dyn SocialSource = source.0.as_ref();

    match query.type_.as_deref() {
        Some("popular") => {
            let posts = fetch_all_posts(source, authorization).await;
            let comment_counts: AHashMap<PostId, usize> = join_all(posts.iter().map(|post| {
                async move {
                    let n_comments = source.post_comments(post.id, authorization).await.len();
                    (post.id, n_comments)
                }
            }))
            .await
            .into_iter()
            .collect();
            let popular_posts = ranking::most_commented(posts, &comment_counts);
            debug!(n_popular_posts = popular_posts.len());
            Ok(Json(PopularPostsResponse { popular_posts }).into_response())
        }
        Some("latest") => {
            let posts = fetch_all_posts(source, authorization).await;
            let latest_posts = ranking::latest(posts, N_LATEST_POSTS);
            Ok(Json(LatestPostsResponse { latest_posts }).into_response())
        }
        type_ => {
            info!(?type_, "invalid type");
            Ok(responses::error(StatusCode::BAD_REQUEST, "Invalid type parameter"))
        }
    }
}

#[handler]
#[instrument(skip_all, level = "info")]
async fn get_post_comments(
    request: &Request,
    Path(post_id): Path<PostId>,
    source: Data<&Arc<dyn SocialSource>>,
) -> Result<Response> {
    let comments = source.post_comments(post_id, authorization(request)).await;
    debug!(post_id, n_comments = comments.len());
    Ok(Json(CommentsResponse { comments }).into_response())
}

/// Fetches the posts of every user, in the user order.
async fn fetch_all_posts(source: &dyn SocialSource, authorization: Option<&str>) -> Vec<Post> {
    let user_ids = source.users(authorization).await;
    join_all(
        user_ids
            .into_iter()
            .map(|user_id| source.user_posts(user_id, authorization)),
    )
    .await
    .into_iter()
    .flatten()
    .collect()
}
