pub mod booking;
pub mod error;
pub mod memory;
pub mod postgres;
pub mod store;

pub use booking::{Availability, Booking};
pub use common::{PostId, UserId};
pub use error::{Result, TicketError};
pub use memory::InMemoryTicketStore;
pub use postgres::PostgresTicketStore;
pub use store::{TicketStore, TicketStoreExt};
