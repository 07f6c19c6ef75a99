use crate::error::AppResult;
use crate::external::SportyBetClient;
use crate::models::BookingResponse;
use crate::utils::lifecycle::aggregate_odds;
use crate::utils::normalize_booking_code;

#[derive(Clone)]
pub struct BookingService {
    client: SportyBetClient,
}

impl BookingService {
    pub fn new(client: SportyBetClient) -> Self {
        Self { client }
    }

    /// Resolves a share code into the selections the upload form pre-fills.
    pub async fn lookup(&self, code: &str) -> AppResult<BookingResponse> {
        let selections = self.client.fetch_booking(code).await?;
        let matches: Vec<_> = selections
            .iter()
            .cloned()
            .map(|s| s.into_match())
            .collect();

        Ok(BookingResponse {
            booking_code: normalize_booking_code(code),
            total_odds: aggregate_odds(&matches),
            matches: selections,
        })
    }
}
