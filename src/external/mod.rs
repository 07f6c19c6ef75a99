pub mod gnews;
pub mod paystack;
pub mod sportybet;

pub use gnews::*;
pub use paystack::*;
pub use sportybet::*;
