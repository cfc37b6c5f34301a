// HTTP routes
pub mod conversations;
pub mod health;

pub use conversations::*;
pub use health::*;
