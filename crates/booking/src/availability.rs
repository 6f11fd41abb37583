//! Read-only availability queries over the booking ledger.

use std::collections::HashMap;

use common::{PostId, UserId};
use ledger::{Availability, Result, TicketStore};

/// Read-only reporting built purely from the booking ledger.
///
/// Never creates, deletes or locks booking records; it reads snapshots the
/// store derives from the booking set.
pub struct AvailabilityService<S: TicketStore> {
    store: S,
}

impl<S: TicketStore> AvailabilityService<S> {
    /// Creates a new availability service over the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Returns the availability snapshot for a post.
    #[tracing::instrument(skip(self))]
    pub async fn availability_of(&self, post_id: PostId) -> Result<Availability> {
        self.store.availability(post_id).await
    }

    /// Returns availability snapshots for a batch of posts.
    ///
    /// Unknown posts are omitted; each snapshot comes from a single
    /// consistent read per post.
    #[tracing::instrument(skip(self, post_ids))]
    pub async fn availability_of_many(
        &self,
        post_ids: &[PostId],
    ) -> Result<HashMap<PostId, Availability>> {
        self.store.availability_of_many(post_ids).await
    }

    /// Returns the posts the user currently holds a ticket for.
    #[tracing::instrument(skip(self))]
    pub async fn tickets_of(&self, user_id: UserId) -> Result<Vec<PostId>> {
        self.store.user_tickets(user_id).await
    }
}
