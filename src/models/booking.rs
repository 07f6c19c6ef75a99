use crate::external::BookingMatch;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BookingResponse {
    pub booking_code: String,
    pub matches: Vec<BookingMatch>,
    /// Suggested total for the upload form.
    pub total_odds: f64,
}
