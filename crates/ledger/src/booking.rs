use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use common::{PostId, UserId};

/// One user's active reservation for one post.
///
/// A booking exists if and only if the user currently holds a ticket;
/// cancellation deletes the record rather than marking it inactive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    /// The post the ticket is for.
    pub post_id: PostId,
    /// The user holding the ticket.
    pub user_id: UserId,
    /// When the reservation was made.
    pub created_at: DateTime<Utc>,
}

impl Booking {
    /// Creates a new booking timestamped at the current instant.
    pub fn new(user_id: UserId, post_id: PostId) -> Self {
        Self {
            post_id,
            user_id,
            created_at: Utc::now(),
        }
    }
}

/// Point-in-time availability snapshot for a post.
///
/// Computed from a single consistent read of the booking set so the fields
/// can never disagree with each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Availability {
    /// Configured ticket capacity of the post.
    pub limit: u32,
    /// Number of active bookings.
    pub booked: u32,
    /// Remaining capacity, `limit - booked`.
    pub available: u32,
    /// True if at least one ticket remains.
    pub is_available: bool,
}

impl Availability {
    /// Builds a snapshot from a capacity limit and a booked count.
    pub fn new(limit: u32, booked: u32) -> Self {
        let available = limit.saturating_sub(booked);
        Self {
            limit,
            booked,
            available,
            is_available: available > 0,
        }
    }
}
