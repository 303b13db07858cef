//! Social feed API client.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use rugradar_common::error::AppError;
use rugradar_common::types::{Post, TrendTopic};

use crate::{SocialDataSource, base_url, http_client, read_json};

#[derive(Debug, Clone, Deserialize)]
pub struct WireUser {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub screen_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WireHashtag {
    pub text: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WireMention {
    pub screen_name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WireEntities {
    #[serde(default)]
    pub hashtags: Vec<WireHashtag>,
    #[serde(default)]
    pub user_mentions: Vec<WireMention>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WireStatus {
    pub id_str: String,
    pub user: WireUser,
    #[serde(default)]
    pub full_text: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub favorite_count: u64,
    #[serde(default)]
    pub retweet_count: u64,
    #[serde(default)]
    pub entities: WireEntities,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WireSearch {
    #[serde(default)]
    pub statuses: Vec<WireStatus>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WireTrendPlace {
    #[serde(default)]
    pub trends: Vec<TrendTopic>,
}

impl From<WireStatus> for Post {
    fn from(status: WireStatus) -> Self {
        Post {
            id: status.id_str,
            author: status.user.name,
            author_handle: status.user.screen_name,
            content: status.full_text,
            timestamp: status.created_at,
            likes: status.favorite_count,
            reposts: status.retweet_count,
            hashtags: status.entities.hashtags.into_iter().map(|h| h.text).collect(),
            mentions: status
                .entities
                .user_mentions
                .into_iter()
                .map(|m| m.screen_name)
                .collect(),
        }
    }
}

/// Trends for the first place in a trends response; an empty response has none.
pub fn trends_from_wire(places: Vec<WireTrendPlace>) -> Vec<TrendTopic> {
    places.into_iter().next().map(|p| p.trends).unwrap_or_default()
}

/// HTTP client for the social feed API.
pub struct SocialClient {
    http: reqwest::Client,
    base_url: String,
    bearer_token: Option<String>,
}

impl SocialClient {
    pub fn new(base: &str, bearer_token: Option<String>, timeout: Duration) -> Result<Self, AppError> {
        Ok(Self {
            http: http_client(timeout)?,
            base_url: base_url(base),
            bearer_token,
        })
    }

    fn request(&self, path: &str) -> reqwest::RequestBuilder {
        let builder = self.http.get(format!("{}{}", self.base_url, path));
        match &self.bearer_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }
}

#[async_trait]
impl SocialDataSource for SocialClient {
    async fn search_posts(&self, query: &str, count: usize) -> Result<Vec<Post>, AppError> {
        let response = self
            .request("/1.1/search/tweets.json")
            .query(&[
                ("q", query.to_string()),
                ("count", count.to_string()),
                ("result_type", "recent".to_string()),
                ("tweet_mode", "extended".to_string()),
            ])
            .send()
            .await?;
        let search: WireSearch = read_json(response, "post search").await?;
        Ok(search.statuses.into_iter().map(Post::from).collect())
    }

    async fn trending_topics(&self, woeid: u32) -> Result<Vec<TrendTopic>, AppError> {
        let response = self
            .request("/1.1/trends/place.json")
            .query(&[("id", woeid)])
            .send()
            .await?;
        let places: Vec<WireTrendPlace> = read_json(response, "trending topics").await?;
        Ok(trends_from_wire(places))
    }
}
