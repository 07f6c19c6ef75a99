use crate::error::{AppError, AppResult};
use crate::external::{GnewsClient, NEWS_TOPICS, NewsArticle};
use crate::models::NewsResponse;
use chrono::{DateTime, Utc};
use futures_util::future::join_all;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;

pub const MAX_ARTICLES: usize = 20;

fn published(article: &NewsArticle) -> Option<DateTime<Utc>> {
    article
        .published_at
        .as_deref()
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|d| d.with_timezone(&Utc))
}

/// First occurrence of a title wins; newest first, undated last; capped.
pub fn aggregate_articles(articles: Vec<NewsArticle>) -> Vec<NewsArticle> {
    let mut seen = HashSet::new();
    let mut unique: Vec<NewsArticle> = articles
        .into_iter()
        .filter(|a| seen.insert(a.title.trim().to_lowercase()))
        .collect();
    unique.sort_by(|a, b| published(b).cmp(&published(a)));
    unique.truncate(MAX_ARTICLES);
    unique
}

#[derive(Clone)]
pub struct NewsService {
    client: GnewsClient,
    cache: Arc<RwLock<Option<(Instant, NewsResponse)>>>,
}

impl NewsService {
    pub fn new(client: GnewsClient) -> Self {
        Self {
            client,
            cache: Arc::new(RwLock::new(None)),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.client.api_key_configured()
    }

    pub async fn latest(&self) -> AppResult<NewsResponse> {
        if !self.client.api_key_configured() {
            return Err(AppError::ConfigError("Missing GNEWS_API_KEY".to_string()));
        }

        if let Some((fetched, cached)) = self.cache.read().await.as_ref() {
            if fetched.elapsed() < self.client.cache_ttl() {
                return Ok(cached.clone());
            }
        }

        let results = join_all(NEWS_TOPICS.iter().map(|topic| self.client.search(topic))).await;
        let mut articles = Vec::new();
        for (topic, result) in NEWS_TOPICS.iter().zip(results) {
            match result {
                Ok(found) => articles.extend(found),
                Err(e) => log::warn!("Skipping news topic {topic}: {e}"),
            }
        }

        let response = NewsResponse {
            articles: aggregate_articles(articles),
            fetched_at: Utc::now(),
        };
        *self.cache.write().await = Some((Instant::now(), response.clone()));
        log::info!("News refreshed: {} articles", response.articles.len());
        Ok(response)
    }
}
