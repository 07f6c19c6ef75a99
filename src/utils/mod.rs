pub mod booking_code;
pub mod day_range;
pub mod jwt;
pub mod lifecycle;
pub mod retry;

pub use booking_code::{normalize_booking_code, parse_booking_code};
pub use day_range::{DayFilter, DayRange, resolve_range};
pub use jwt::*;
pub use retry::{RetryPolicy, fetch_json_with_retry};
