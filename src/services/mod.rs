pub mod access_service;
pub mod booking_service;
pub mod dashboard_service;
pub mod game_service;
pub mod lifecycle_service;
pub mod news_service;
pub mod profile_service;
pub mod purchase_service;
pub mod recovery_service;

pub use access_service::*;
pub use booking_service::*;
pub use dashboard_service::*;
pub use game_service::*;
pub use lifecycle_service::*;
pub use news_service::*;
pub use profile_service::*;
pub use purchase_service::*;
pub use recovery_service::*;
