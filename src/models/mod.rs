pub mod booking;
pub mod common;
pub mod game;
pub mod news;
pub mod pagination;
pub mod profile;
pub mod purchase;
pub mod recovery;

pub use booking::*;
pub use common::*;
pub use game::*;
pub use news::*;
pub use pagination::*;
pub use profile::*;
pub use purchase::*;
pub use recovery::*;
