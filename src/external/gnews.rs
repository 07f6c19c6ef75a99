use crate::config::NewsConfig;
use crate::error::{AppError, AppResult};
use crate::utils::{RetryPolicy, fetch_json_with_retry};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use utoipa::ToSchema;

pub const NEWS_TOPICS: [&str; 11] = [
    "Premier League",
    "La Liga",
    "Serie A",
    "Bundesliga",
    "Ligue 1",
    "Champions League",
    "Europa League",
    "UEFA",
    "World Cup",
    "Euro 2024",
    "FIFA",
];

pub const ARTICLES_PER_TOPIC: u32 = 5;

#[derive(Debug, Default, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub articles: Vec<GnewsArticle>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GnewsArticle {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub published_at: Option<String>,
    #[serde(default)]
    pub source: Option<GnewsSource>,
}

#[derive(Debug, Deserialize)]
pub struct GnewsSource {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewsArticle {
    pub title: String,
    pub description: Option<String>,
    pub url: String,
    pub url_to_image: Option<String>,
    pub published_at: Option<String>,
    pub source: Option<String>,
}

impl From<GnewsArticle> for NewsArticle {
    fn from(a: GnewsArticle) -> Self {
        Self {
            title: a.title,
            description: a.description,
            url: a.url,
            url_to_image: a.image,
            published_at: a.published_at,
            source: a.source.and_then(|s| s.name),
        }
    }
}

#[derive(Clone)]
pub struct GnewsClient {
    client: Client,
    config: NewsConfig,
    policy: RetryPolicy,
}

impl GnewsClient {
    pub fn new(config: NewsConfig) -> Self {
        Self {
            client: Client::new(),
            config,
            // one shot per topic; a failing topic is skipped, not retried
            policy: RetryPolicy {
                attempts: 1,
                timeout: Duration::from_secs(10),
                backoff_step: Duration::ZERO,
            },
        }
    }

    pub fn api_key_configured(&self) -> bool {
        !self.config.api_key.trim().is_empty()
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.config.cache_ttl_secs)
    }

    pub async fn search(&self, topic: &str) -> AppResult<Vec<NewsArticle>> {
        if !self.api_key_configured() {
            return Err(AppError::ConfigError("Missing GNEWS_API_KEY".to_string()));
        }

        let max = ARTICLES_PER_TOPIC.to_string();
        let response: SearchResponse =
            fetch_json_with_retry(&self.client, "GNews", self.policy, |c| {
                c.get(&self.config.base_url).query(&[
                    ("q", topic),
                    ("lang", "en"),
                    ("max", max.as_str()),
                    ("apikey", self.config.api_key.as_str()),
                ])
            })
            .await?;

        Ok(response.articles.into_iter().map(NewsArticle::from).collect())
    }
}
