use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock};

use crate::{
    Availability, Booking, PostId, Result, TicketError, UserId,
    store::TicketStore,
};

/// Booking state for a single post.
///
/// The mutex is the per-post exclusive region: reserve and cancel for the
/// same post lock it for the whole check-then-write sequence, so two
/// concurrent reservations can never both pass the capacity check.
struct PostInventory {
    limit: u32,
    bookings: Mutex<HashMap<UserId, Booking>>,
}

/// In-memory ticket store implementation.
///
/// Provides the same interface and atomicity guarantees as the PostgreSQL
/// implementation. Each post carries its own lock, so operations on
/// different posts run independently.
#[derive(Clone, Default)]
pub struct InMemoryTicketStore {
    posts: Arc<RwLock<HashMap<PostId, Arc<PostInventory>>>>,
}

impl InMemoryTicketStore {
    /// Creates a new empty in-memory ticket store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a post with its ticket capacity.
    ///
    /// Posts are owned by the content-management collaborator; this mirrors
    /// that seeding for tests and single-process deployments. Re-registering
    /// an existing post is ignored (the limit is immutable here).
    pub async fn put_post(&self, post_id: PostId, limit: u32) {
        let mut posts = self.posts.write().await;
        posts.entry(post_id).or_insert_with(|| {
            Arc::new(PostInventory {
                limit,
                bookings: Mutex::new(HashMap::new()),
            })
        });
    }

    /// Returns the number of registered posts.
    pub async fn post_count(&self) -> usize {
        self.posts.read().await.len()
    }

    async fn inventory(&self, post_id: PostId) -> Option<Arc<PostInventory>> {
        self.posts.read().await.get(&post_id).cloned()
    }
}

#[async_trait]
impl TicketStore for InMemoryTicketStore {
    async fn reserve(&self, user_id: UserId, post_id: PostId) -> Result<Booking> {
        let inventory = self
            .inventory(post_id)
            .await
            .ok_or(TicketError::PostNotFound(post_id))?;

        // Exclusive region: holds the post lock across check and insert.
        let mut bookings = inventory.bookings.lock().await;

        if bookings.contains_key(&user_id) {
            return Err(TicketError::AlreadyBooked { user_id, post_id });
        }
        if bookings.len() as u32 >= inventory.limit {
            return Err(TicketError::SoldOut {
                post_id,
                limit: inventory.limit,
            });
        }

        let booking = Booking::new(user_id, post_id);
        bookings.insert(user_id, booking.clone());
        Ok(booking)
    }

    async fn cancel(&self, user_id: UserId, post_id: PostId) -> Result<()> {
        let inventory = self
            .inventory(post_id)
            .await
            .ok_or(TicketError::NotBooked { user_id, post_id })?;

        let mut bookings = inventory.bookings.lock().await;
        match bookings.remove(&user_id) {
            Some(_) => Ok(()),
            None => Err(TicketError::NotBooked { user_id, post_id }),
        }
    }

    async fn tickets_limit(&self, post_id: PostId) -> Result<Option<u32>> {
        Ok(self.inventory(post_id).await.map(|inv| inv.limit))
    }

    async fn booked_count(&self, post_id: PostId) -> Result<u32> {
        match self.inventory(post_id).await {
            Some(inventory) => Ok(inventory.bookings.lock().await.len() as u32),
            None => Ok(0),
        }
    }

    async fn has_booking(&self, user_id: UserId, post_id: PostId) -> Result<bool> {
        match self.inventory(post_id).await {
            Some(inventory) => Ok(inventory.bookings.lock().await.contains_key(&user_id)),
            None => Ok(false),
        }
    }

    async fn availability(&self, post_id: PostId) -> Result<Availability> {
        let inventory = self
            .inventory(post_id)
            .await
            .ok_or(TicketError::PostNotFound(post_id))?;

        let booked = inventory.bookings.lock().await.len() as u32;
        Ok(Availability::new(inventory.limit, booked))
    }

    async fn availability_of_many(
        &self,
        post_ids: &[PostId],
    ) -> Result<HashMap<PostId, Availability>> {
        let mut snapshots = HashMap::with_capacity(post_ids.len());
        for &post_id in post_ids {
            if let Some(inventory) = self.inventory(post_id).await {
                let booked = inventory.bookings.lock().await.len() as u32;
                snapshots.insert(post_id, Availability::new(inventory.limit, booked));
            }
        }
        Ok(snapshots)
    }

    async fn user_tickets(&self, user_id: UserId) -> Result<Vec<PostId>> {
        let posts: Vec<_> = {
            let posts = self.posts.read().await;
            posts.iter().map(|(id, inv)| (*id, inv.clone())).collect()
        };

        let mut tickets = Vec::new();
        for (post_id, inventory) in posts {
            if inventory.bookings.lock().await.contains_key(&user_id) {
                tickets.push(post_id);
            }
        }
        Ok(tickets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::TicketStoreExt;

    async fn store_with_post(limit: u32) -> (InMemoryTicketStore, PostId) {
        let store = InMemoryTicketStore::new();
        let post_id = PostId::new();
        store.put_post(post_id, limit).await;
        (store, post_id)
    }

    #[tokio::test]
    async fn reserve_creates_booking() {
        let (store, post_id) = store_with_post(3).await;
        let user_id = UserId::new();

        let booking = store.reserve(user_id, post_id).await.unwrap();
        assert_eq!(booking.user_id, user_id);
        assert_eq!(booking.post_id, post_id);
        assert_eq!(store.booked_count(post_id).await.unwrap(), 1);
        assert!(store.has_booking(user_id, post_id).await.unwrap());
    }

    #[tokio::test]
    async fn reserve_unknown_post_fails() {
        let store = InMemoryTicketStore::new();
        let result = store.reserve(UserId::new(), PostId::new()).await;
        assert!(matches!(result, Err(TicketError::PostNotFound(_))));
    }

    #[tokio::test]
    async fn duplicate_reserve_is_rejected() {
        let (store, post_id) = store_with_post(3).await;
        let user_id = UserId::new();

        store.reserve(user_id, post_id).await.unwrap();
        let result = store.reserve(user_id, post_id).await;

        assert!(matches!(result, Err(TicketError::AlreadyBooked { .. })));
        assert_eq!(store.booked_count(post_id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn reserve_past_capacity_is_sold_out() {
        let (store, post_id) = store_with_post(1).await;

        store.reserve(UserId::new(), post_id).await.unwrap();
        let result = store.reserve(UserId::new(), post_id).await;

        assert!(matches!(result, Err(TicketError::SoldOut { limit: 1, .. })));
        assert_eq!(store.booked_count(post_id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn zero_limit_post_is_immediately_sold_out() {
        let (store, post_id) = store_with_post(0).await;
        let result = store.reserve(UserId::new(), post_id).await;
        assert!(matches!(result, Err(TicketError::SoldOut { .. })));
    }

    #[tokio::test]
    async fn cancel_frees_capacity() {
        let (store, post_id) = store_with_post(1).await;
        let user_a = UserId::new();
        let user_b = UserId::new();

        store.reserve(user_a, post_id).await.unwrap();
        assert!(matches!(
            store.reserve(user_b, post_id).await,
            Err(TicketError::SoldOut { .. })
        ));

        store.cancel(user_a, post_id).await.unwrap();
        assert_eq!(store.available(post_id).await.unwrap(), 1);

        store.reserve(user_b, post_id).await.unwrap();
        assert_eq!(store.booked_count(post_id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn second_cancel_returns_not_booked() {
        let (store, post_id) = store_with_post(2).await;
        let user_id = UserId::new();

        store.reserve(user_id, post_id).await.unwrap();
        store.cancel(user_id, post_id).await.unwrap();

        let result = store.cancel(user_id, post_id).await;
        assert!(matches!(result, Err(TicketError::NotBooked { .. })));
        assert_eq!(store.booked_count(post_id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn reserve_after_cancel_succeeds_for_same_user() {
        let (store, post_id) = store_with_post(2).await;
        let user_id = UserId::new();

        store.reserve(user_id, post_id).await.unwrap();
        store.cancel(user_id, post_id).await.unwrap();
        let result = store.reserve(user_id, post_id).await;

        assert!(result.is_ok());
        assert_eq!(store.booked_count(post_id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn availability_tracks_bookings() {
        let (store, post_id) = store_with_post(2).await;
        let user_a = UserId::new();
        let user_b = UserId::new();

        store.reserve(user_a, post_id).await.unwrap();
        let availability = store.availability(post_id).await.unwrap();
        assert_eq!(availability.available, 1);
        assert!(availability.is_available);

        store.reserve(user_b, post_id).await.unwrap();
        let availability = store.availability(post_id).await.unwrap();
        assert_eq!(availability.booked, 2);
        assert_eq!(availability.available, 0);
        assert!(!availability.is_available);

        // Third user is turned away
        assert!(matches!(
            store.reserve(UserId::new(), post_id).await,
            Err(TicketError::SoldOut { .. })
        ));
    }

    #[tokio::test]
    async fn availability_of_many_skips_unknown_posts() {
        let (store, post_id) = store_with_post(5).await;
        let unknown = PostId::new();

        let snapshots = store
            .availability_of_many(&[post_id, unknown])
            .await
            .unwrap();

        assert_eq!(snapshots.len(), 1);
        assert_eq!(snapshots[&post_id].limit, 5);
        assert!(!snapshots.contains_key(&unknown));
    }

    #[tokio::test]
    async fn user_tickets_lists_posts_across_inventory() {
        let store = InMemoryTicketStore::new();
        let post_a = PostId::new();
        let post_b = PostId::new();
        let post_c = PostId::new();
        store.put_post(post_a, 1).await;
        store.put_post(post_b, 1).await;
        store.put_post(post_c, 1).await;

        let user_id = UserId::new();
        store.reserve(user_id, post_a).await.unwrap();
        store.reserve(user_id, post_c).await.unwrap();

        let mut tickets = store.user_tickets(user_id).await.unwrap();
        tickets.sort_by_key(|id| id.as_uuid());
        let mut expected = vec![post_a, post_c];
        expected.sort_by_key(|id| id.as_uuid());
        assert_eq!(tickets, expected);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn concurrent_reserves_for_last_ticket_pick_one_winner() {
        let (store, post_id) = store_with_post(1).await;
        let user_a = UserId::new();
        let user_b = UserId::new();

        let store_a = store.clone();
        let store_b = store.clone();
        let handle_a = tokio::spawn(async move { store_a.reserve(user_a, post_id).await });
        let handle_b = tokio::spawn(async move { store_b.reserve(user_b, post_id).await });

        let result_a = handle_a.await.unwrap();
        let result_b = handle_b.await.unwrap();

        let winners = [&result_a, &result_b]
            .iter()
            .filter(|r| r.is_ok())
            .count();
        assert_eq!(winners, 1);

        let loser = if result_a.is_ok() { result_b } else { result_a };
        assert!(matches!(loser, Err(TicketError::SoldOut { .. })));
        assert_eq!(store.booked_count(post_id).await.unwrap(), 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn concurrent_reserves_never_oversell() {
        let (store, post_id) = store_with_post(3).await;

        let mut handles = Vec::new();
        for _ in 0..10 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.reserve(UserId::new(), post_id).await
            }));
        }

        let mut succeeded = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                succeeded += 1;
            }
        }

        assert_eq!(succeeded, 3);
        assert_eq!(store.booked_count(post_id).await.unwrap(), 3);
    }
}
