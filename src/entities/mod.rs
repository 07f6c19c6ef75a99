pub mod games;
pub mod profiles;
pub mod purchases;

pub use games::{GameStatus, GameType, Match, MatchList, MatchStatus};
pub use profiles::Role;
pub use purchases::PurchaseStatus;

pub use games as game_entity;
pub use profiles as profile_entity;
pub use purchases as purchase_entity;
