//! Booking transaction manager: the sole mutator of booking state.

use common::{PostId, UserId};
use ledger::{Booking, Result, TicketError, TicketStore};

/// Service for reserving and cancelling tickets.
///
/// Wraps a [`TicketStore`] and is the only component that may create or
/// delete booking records. The store performs the check-then-insert sequence
/// under per-post serialization; the manager adds instrumentation and keeps
/// the write path in one place.
pub struct BookingManager<S: TicketStore> {
    store: S,
}

impl<S: TicketStore> BookingManager<S> {
    /// Creates a new booking manager over the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Returns a reference to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Reserves one ticket for the user on the post.
    ///
    /// Exactly one of these outcomes occurs, atomically:
    /// a booking is created and returned, or no state changes and the
    /// precondition failure is returned (`PostNotFound`, `AlreadyBooked`
    /// or `SoldOut`).
    #[tracing::instrument(skip(self))]
    pub async fn reserve(&self, user_id: UserId, post_id: PostId) -> Result<Booking> {
        match self.store.reserve(user_id, post_id).await {
            Ok(booking) => {
                metrics::counter!("tickets_reserved_total").increment(1);
                tracing::info!(%user_id, %post_id, "ticket reserved");
                Ok(booking)
            }
            Err(err) => {
                match &err {
                    TicketError::SoldOut { .. } => {
                        metrics::counter!("tickets_reserve_sold_out_total").increment(1);
                    }
                    TicketError::AlreadyBooked { .. } => {
                        metrics::counter!("tickets_reserve_duplicate_total").increment(1);
                    }
                    _ => {}
                }
                Err(err)
            }
        }
    }

    /// Cancels the user's ticket for the post, freeing one unit of capacity.
    ///
    /// A cancel of a booking that does not exist returns `NotBooked` and
    /// changes nothing; callers should treat that as "nothing to do".
    #[tracing::instrument(skip(self))]
    pub async fn cancel(&self, user_id: UserId, post_id: PostId) -> Result<()> {
        self.store.cancel(user_id, post_id).await?;
        metrics::counter!("tickets_cancelled_total").increment(1);
        tracing::info!(%user_id, %post_id, "ticket cancelled");
        Ok(())
    }
}
