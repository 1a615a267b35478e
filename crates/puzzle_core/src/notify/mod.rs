//! Rank-invalidation notifications.
//!
//! # Responsibility
//! - Build the "rank update needed" event after a best-record mutation.
//! - Hand it to the message-queue collaborator without waiting on it.
//!
//! # Invariants
//! - Emission never fails the caller; publish errors are logged and dropped.
//! - No local retry. Delivery guarantees belong to the transport.

pub mod rank_update;
