//! News feed client (GNews-style top-headlines API).

use crate::gateway::BroadcastSource;
use async_trait::async_trait;
use chrono::{Duration, Utc};
use iris_channels::line::template;
use iris_core::{
    config::NewsConfig,
    error::IrisError,
    message::{Headline, Payload},
};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration as StdDuration;
use tracing::debug;

/// Cap on headlines per fetch.
const MAX_HEADLINES: usize = 5;
/// Bound on every feed call.
const REQUEST_TIMEOUT: StdDuration = StdDuration::from_secs(10);

/// Client for the news feed collaborator.
pub struct NewsClient {
    client: reqwest::Client,
    config: NewsConfig,
}

#[derive(Deserialize)]
struct FeedResponse {
    #[serde(default)]
    articles: Vec<FeedArticle>,
}

#[derive(Deserialize)]
struct FeedArticle {
    title: String,
    url: String,
    image: Option<String>,
}

impl NewsClient {
    pub fn new(config: NewsConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    /// Fetch up to five headlines from the last day, optionally filtered by
    /// category or free-text query.
    pub async fn top_headlines(
        &self,
        category: Option<&str>,
        query: Option<&str>,
    ) -> Result<Vec<Headline>, IrisError> {
        let to = Utc::now();
        let from = to - Duration::days(1);
        let from_param = from.format("%Y-%m-%dT%H:%M:%SZ").to_string();
        let to_param = to.format("%Y-%m-%dT%H:%M:%SZ").to_string();
        let url = format!(
            "{}/top-headlines",
            self.config.base_url.trim_end_matches('/')
        );
        debug!("feed: GET {url} category={category:?} query={query:?}");

        let mut request = self
            .client
            .get(&url)
            .timeout(REQUEST_TIMEOUT)
            .query(&[
                ("apikey", self.config.api_key.as_str()),
                ("lang", self.config.language.as_str()),
                ("max", "5"),
                ("from", from_param.as_str()),
                ("to", to_param.as_str()),
            ]);
        if let Some(category) = category {
            request = request.query(&[("category", category)]);
        }
        if let Some(query) = query {
            request = request.query(&[("q", query)]);
        }

        let resp = request
            .send()
            .await
            .map_err(|e| IrisError::Feed(format!("feed request failed: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            return Err(IrisError::Feed(format!("feed returned {status}")));
        }

        let parsed: FeedResponse = resp
            .json()
            .await
            .map_err(|e| IrisError::Feed(format!("feed parse failed: {e}")))?;

        Ok(parsed
            .articles
            .into_iter()
            .take(MAX_HEADLINES)
            .map(|a| Headline {
                title: a.title,
                url: a.url,
                image_url: a.image,
            })
            .collect())
    }
}

/// Daily news digest broadcast source.
pub struct NewsDigest {
    client: Arc<NewsClient>,
    category: Option<String>,
}

impl NewsDigest {
    pub fn new(client: Arc<NewsClient>, category: Option<String>) -> Self {
        Self { client, category }
    }
}

#[async_trait]
impl BroadcastSource for NewsDigest {
    async fn produce(&self) -> Result<Payload, IrisError> {
        let headlines = self
            .client
            .top_headlines(self.category.as_deref(), None)
            .await?;
        if headlines.is_empty() {
            return Err(IrisError::Feed("no headlines for digest".into()));
        }
        Ok(template::news_carousel("今日新聞精選", &headlines)
            .unwrap_or_else(|| Payload::Text(template::news_text(&headlines))))
    }
}
