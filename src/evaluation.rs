//! Evaluation service client.
//!
//! Every call is bounded by the client timeout and is never retried.
//! The [`NumberSource`] and [`SocialSource`] seams turn any failure into an empty list.

use async_trait::async_trait;
use clap::{crate_name, crate_version};
use reqwest::header::AUTHORIZATION;
use serde::de::DeserializeOwned;

use self::models::*;
use crate::prelude::*;
use crate::window::Number;

pub mod models;

#[async_trait]
pub trait NumberSource: Send + Sync {
    /// Fetches the next batch of the category, or an empty batch on any failure.
    async fn fetch_numbers(&self, category: Category) -> Vec<Number>;
}

#[async_trait]
pub trait SocialSource: Send + Sync {
    async fn users(&self, authorization: Option<&str>) -> Vec<UserId>;

    async fn user_posts(&self, user_id: UserId, authorization: Option<&str>) -> Vec<Post>;

    async fn post_comments(&self, post_id: PostId, authorization: Option<&str>) -> Vec<Comment>;
}

#[derive(Clone)]
pub struct EvaluationApi {
    client: reqwest::Client,
    base_url: Arc<String>,

    /// Sent along with the number requests.
    authorization: Option<Arc<String>>,
}

impl EvaluationApi {
    pub fn new(base_url: impl Into<String>, timeout: StdDuration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!(crate_name!(), "/", crate_version!()))
            .timeout(timeout)
            .build()
            .context("failed to build the HTTP client")?;
        Ok(Self {
            client,
            base_url: Arc::new(base_url.into()),
            authorization: None,
        })
    }

    #[must_use]
    pub fn with_access_token(mut self, access_token: Option<&str>) -> Self {
        self.authorization =
            access_token.map(|access_token| Arc::new(format!("Bearer {}", access_token)));
        self
    }

    #[instrument(skip_all, fields(category = %category))]
    pub async fn get_numbers(&self, category: Category) -> Result<Vec<Number>> {
        let response: NumbersResponse = self
            .call(category.path(), self.authorization.as_deref().map(String::as_str))
            .await?;
        Ok(response.numbers)
    }

    #[instrument(skip_all)]
    pub async fn get_users(&self, authorization: Option<&str>) -> Result<Vec<UserId>> {
        Ok(self
            .call::<UsersResponse>("users", authorization)
            .await?
            .into_ids())
    }

    #[instrument(skip_all, fields(user_id = user_id))]
    pub async fn get_user_posts(
        &self,
        user_id: UserId,
        authorization: Option<&str>,
    ) -> Result<Vec<Post>> {
        let path = format!("users/{}/posts", user_id);
        Ok(self.call::<PostsResponse>(&path, authorization).await?.posts)
    }

    #[instrument(skip_all, fields(post_id = post_id))]
    pub async fn get_post_comments(
        &self,
        post_id: PostId,
        authorization: Option<&str>,
    ) -> Result<Vec<Comment>> {
        let path = format!("posts/{}/comments", post_id);
        Ok(self
            .call::<CommentsResponse>(&path, authorization)
            .await?
            .comments)
    }

    async fn call<T: DeserializeOwned>(
        &self,
        path: &str,
        authorization: Option<&str>,
    ) -> Result<T> {
        let start_instant = Instant::now();
        let url = format!("{}/{}", self.base_url, path);

        let mut request = self.client.get(&url);
        if let Some(authorization) = authorization {
            request = request.header(AUTHORIZATION, authorization);
        }
        let response = request
            .send()
            .await
            .with_context(|| format!("`{}` has failed", url))?
            .error_for_status()?;
        let body = response
            .json::<T>()
            .await
            .with_context(|| format!("could not parse JSON from `{}`", url))?;

        debug!(%url, elapsed = ?start_instant.elapsed(), "fetched");
        Ok(body)
    }
}

#[async_trait]
impl NumberSource for EvaluationApi {
    async fn fetch_numbers(&self, category: Category) -> Vec<Number> {
        self.get_numbers(category).await.unwrap_or_else(|error| {
            warn!(%category, "falling back to an empty batch: {:#}", error);
            Vec::new()
        })
    }
}

#[async_trait]
impl SocialSource for EvaluationApi {
    async fn users(&self, authorization: Option<&str>) -> Vec<UserId> {
        self.get_users(authorization).await.unwrap_or_else(|error| {
            warn!("failed to fetch the users: {:#}", error);
            Vec::new()
        })
    }

    async fn user_posts(&self, user_id: UserId, authorization: Option<&str>) -> Vec<Post> {
        self.get_user_posts(user_id, authorization)
            .await
            .unwrap_or_else(|error| {
                warn!(user_id, "failed to fetch the posts: {:#}", error);
                Vec::new()
            })
    }

    async fn post_comments(&self, post_id: PostId, authorization: Option<&str>) -> Vec<Comment> {
        self.get_post_comments(post_id, authorization)
            .await
            .unwrap_or_else(|error| {
                warn!(post_id, "failed to fetch the comments: {:#}", error);
                Vec::new()
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unreachable_upstream_degrades_to_empty_batch() -> crate::Result {
        let api = EvaluationApi::new("http://127.0.0.1:9", StdDuration::from_millis(500))?;
        assert!(api.get_numbers(Category::Primes).await.is_err());
        assert!(api.fetch_numbers(Category::Primes).await.is_empty());
        assert!(api.users(Some("Bearer token")).await.is_empty());
        Ok(())
    }
}
