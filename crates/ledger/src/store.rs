use std::collections::HashMap;

use async_trait::async_trait;

use crate::{Availability, Booking, PostId, Result, UserId};

/// Core trait for ticket store implementations.
///
/// A ticket store owns the booking records for all posts and is the only
/// component allowed to create or delete them. Booked counts are always
/// derived from the booking set, never from a separately-mutable counter
/// that could drift from reality.
///
/// All implementations must be thread-safe (Send + Sync) and must serialize
/// the capacity check and insert in [`reserve`](TicketStore::reserve) per
/// post: two concurrent reservations for the last remaining ticket must
/// resolve to exactly one winner. Operations on different posts must not
/// contend with each other.
#[async_trait]
pub trait TicketStore: Send + Sync {
    /// Reserves one ticket for `user_id` on `post_id`.
    ///
    /// Atomically checks, in one unit of work scoped to the post:
    /// 1. the post exists, else [`PostNotFound`](crate::TicketError::PostNotFound);
    /// 2. the user holds no active ticket, else
    ///    [`AlreadyBooked`](crate::TicketError::AlreadyBooked);
    /// 3. capacity remains, else [`SoldOut`](crate::TicketError::SoldOut).
    ///
    /// On success the created booking is durably recorded and returned.
    /// On failure no state changes.
    async fn reserve(&self, user_id: UserId, post_id: PostId) -> Result<Booking>;

    /// Cancels the user's ticket for `post_id`, freeing one unit of capacity.
    ///
    /// Fails with [`NotBooked`](crate::TicketError::NotBooked) if no active
    /// booking exists; a second cancel deterministically returns `NotBooked`
    /// and leaves state untouched.
    async fn cancel(&self, user_id: UserId, post_id: PostId) -> Result<()>;

    /// Returns the configured ticket limit for a post.
    ///
    /// Returns None if the post doesn't exist.
    async fn tickets_limit(&self, post_id: PostId) -> Result<Option<u32>>;

    /// Counts active bookings for a post.
    ///
    /// A post with no bookings (or no record at all) counts as zero.
    async fn booked_count(&self, post_id: PostId) -> Result<u32>;

    /// Returns true if the user holds an active ticket for the post.
    async fn has_booking(&self, user_id: UserId, post_id: PostId) -> Result<bool>;

    /// Returns the availability snapshot for a post.
    ///
    /// The snapshot is computed from a single consistent read; its fields
    /// always agree even if a concurrent booking lands immediately after.
    async fn availability(&self, post_id: PostId) -> Result<Availability>;

    /// Returns availability snapshots for a batch of posts, for list views.
    ///
    /// Unknown post IDs are omitted from the result rather than failing the
    /// whole batch.
    async fn availability_of_many(
        &self,
        post_ids: &[PostId],
    ) -> Result<HashMap<PostId, Availability>>;

    /// Returns the posts the user currently holds a ticket for.
    ///
    /// Unordered set semantics; used for "my tickets" views.
    async fn user_tickets(&self, user_id: UserId) -> Result<Vec<PostId>>;
}

/// Extension trait providing convenience methods for ticket stores.
#[async_trait]
pub trait TicketStoreExt: TicketStore {
    /// Checks whether a post exists.
    async fn post_exists(&self, post_id: PostId) -> Result<bool> {
        Ok(self.tickets_limit(post_id).await?.is_some())
    }

    /// Returns the remaining capacity for a post.
    async fn available(&self, post_id: PostId) -> Result<u32> {
        Ok(self.availability(post_id).await?.available)
    }
}

// Blanket implementation for all TicketStore implementations
impl<T: TicketStore + ?Sized> TicketStoreExt for T {}
