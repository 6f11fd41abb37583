//! Booking engine: the single write path for ticket reservations and the
//! read-only availability queries derived from the booking ledger.

pub mod availability;
pub mod manager;

pub use availability::AvailabilityService;
pub use common::{PostId, UserId};
pub use ledger::{Availability, Booking, Result, TicketError, TicketStore};
pub use manager::BookingManager;
