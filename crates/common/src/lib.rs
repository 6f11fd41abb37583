pub mod types;

pub use types::{PostId, UserId};
