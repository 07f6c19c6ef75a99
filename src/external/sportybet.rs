use crate::config::BookingConfig;
use crate::entities::{Match, MatchStatus, games::ODDS_NOT_AVAILABLE};
use crate::error::AppResult;
use crate::utils::{RetryPolicy, fetch_json_with_retry, parse_booking_code};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Default, Deserialize)]
pub struct ShareResponse {
    #[serde(default)]
    pub data: Option<ShareData>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ShareData {
    #[serde(default)]
    pub outcomes: Vec<ShareOutcome>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareOutcome {
    #[serde(default)]
    pub event_id: Option<String>,
    #[serde(default)]
    pub home_team_name: String,
    #[serde(default)]
    pub away_team_name: String,
    #[serde(default)]
    pub match_status: Option<String>,
    #[serde(default)]
    pub markets: Vec<ShareMarket>,
    #[serde(default)]
    pub sport: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub struct ShareMarket {
    #[serde(default)]
    pub desc: Option<String>,
    #[serde(default)]
    pub outcomes: Vec<ShareMarketOutcome>,
}

#[derive(Debug, Deserialize)]
pub struct ShareMarketOutcome {
    #[serde(default)]
    pub odds: Option<String>,
}

/// A slip selection normalised for the upload form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookingMatch {
    pub event_id: Option<String>,
    pub home_team: String,
    pub away_team: String,
    pub status: String,
    pub odds: String,
    pub market_desc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub league: Option<String>,
}

impl BookingMatch {
    /// Imported selections always start out pending, whatever the bookmaker's match state.
    pub fn into_match(self) -> Match {
        Match {
            event_id: self.event_id,
            home_team: self.home_team,
            away_team: self.away_team,
            league: self.league,
            status: MatchStatus::Pending,
            odds: self.odds,
            market_desc: Some(self.market_desc).filter(|d| !d.is_empty()),
        }
    }
}

impl From<ShareOutcome> for BookingMatch {
    fn from(o: ShareOutcome) -> Self {
        let first_market = o.markets.first();
        let odds = first_market
            .and_then(|m| m.outcomes.first())
            .and_then(|out| out.odds.clone())
            .filter(|odds| !odds.trim().is_empty())
            .unwrap_or_else(|| ODDS_NOT_AVAILABLE.to_string());
        let market_desc = first_market
            .and_then(|m| m.desc.clone())
            .unwrap_or_default();
        let league = o
            .sport
            .as_ref()
            .and_then(|s| s.pointer("/category/tournament/name"))
            .and_then(|n| n.as_str())
            .map(str::to_string);

        Self {
            event_id: o.event_id,
            home_team: o.home_team_name,
            away_team: o.away_team_name,
            status: o.match_status.unwrap_or_default(),
            odds,
            market_desc,
            league,
        }
    }
}

pub fn normalize_share(response: ShareResponse) -> Vec<BookingMatch> {
    response
        .data
        .map(|d| d.outcomes.into_iter().map(BookingMatch::from).collect())
        .unwrap_or_default()
}

#[derive(Clone)]
pub struct SportyBetClient {
    client: Client,
    config: BookingConfig,
    policy: RetryPolicy,
}

impl SportyBetClient {
    pub fn new(config: BookingConfig) -> Self {
        Self {
            client: Client::new(),
            config,
            policy: RetryPolicy::default(),
        }
    }

    /// Looks up a shared slip by booking code.
    pub async fn fetch_booking(&self, code: &str) -> AppResult<Vec<BookingMatch>> {
        let code = parse_booking_code(code)?;
        let url = format!("{}/{}", self.config.base_url.trim_end_matches('/'), code);
        let response: ShareResponse =
            fetch_json_with_retry(&self.client, "SportyBet", self.policy, |c| {
                c.get(&url).header("User-Agent", "Mozilla/5.0")
            })
            .await?;

        let matches = normalize_share(response);
        log::info!("Booking {code} resolved to {} selections", matches.len());
        Ok(matches)
    }
}
