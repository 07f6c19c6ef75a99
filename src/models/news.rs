use crate::external::NewsArticle;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NewsResponse {
    pub articles: Vec<NewsArticle>,
    pub fetched_at: DateTime<Utc>,
}
