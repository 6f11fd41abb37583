use thiserror::Error;

use common::{PostId, UserId};

/// Errors that can occur when booking or cancelling tickets.
///
/// The first four variants are expected, user-facing outcomes of the booking
/// protocol. `Database` is a storage-layer fault and is surfaced to the
/// caller without retry.
#[derive(Debug, Error)]
pub enum TicketError {
    /// The referenced post does not exist.
    #[error("Post not found: {0}")]
    PostNotFound(PostId),

    /// The user already holds an active ticket for this post.
    #[error("User {user_id} already holds a ticket for post {post_id}")]
    AlreadyBooked { user_id: UserId, post_id: PostId },

    /// The post's ticket capacity is exhausted.
    #[error("Post {post_id} is sold out (limit {limit})")]
    SoldOut { post_id: PostId, limit: u32 },

    /// No active ticket exists for this (user, post) pair.
    #[error("User {user_id} has no ticket for post {post_id}")]
    NotBooked { user_id: UserId, post_id: PostId },

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Result type for ledger operations.
pub type Result<T> = std::result::Result<T, TicketError>;
