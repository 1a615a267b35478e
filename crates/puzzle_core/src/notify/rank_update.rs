//! Rank-update event, publisher contract and emitter.

use crate::model::best_record::BestCategory;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;

/// Topic consumed by the rank recomputation subsystem.
pub const RANK_UPDATE_TOPIC: &str = "rank-update";

const RANK_UPDATE_MESSAGE: &str = "rank update";

/// Which leaderboard slice needs recomputation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankUpdate {
    pub dimension: u32,
    pub category: BestCategory,
}

/// Wire envelope published on [`RANK_UPDATE_TOPIC`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankUpdateMessage {
    pub rank_update: RankUpdate,
    pub message: String,
}

impl RankUpdateMessage {
    pub fn new(rank_update: RankUpdate) -> Self {
        Self {
            rank_update,
            message: RANK_UPDATE_MESSAGE.to_string(),
        }
    }
}

/// Failure reported by a message-queue publisher.
#[derive(Debug)]
pub enum PublishError {
    Encode(serde_json::Error),
    /// The queue is gone or refused the message.
    Transport(String),
}

impl Display for PublishError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Encode(err) => write!(f, "failed to encode rank update: {err}"),
            Self::Transport(message) => write!(f, "rank update transport failed: {message}"),
        }
    }
}

impl Error for PublishError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Encode(err) => Some(err),
            Self::Transport(_) => None,
        }
    }
}

impl From<serde_json::Error> for PublishError {
    fn from(value: serde_json::Error) -> Self {
        Self::Encode(value)
    }
}

/// Message-queue collaborator.
///
/// Implementations must return promptly; they hand off and never wait for
/// consumers.
pub trait RankUpdatePublisher: Send + Sync {
    fn publish(&self, topic: &str, payload: &[u8]) -> Result<(), PublishError>;
}

/// One message handed to [`QueuePublisher`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuedMessage {
    pub topic: String,
    pub payload: Vec<u8>,
}

impl QueuedMessage {
    /// Decodes the payload as a rank-update envelope.
    pub fn decode(&self) -> Result<RankUpdateMessage, serde_json::Error> {
        serde_json::from_slice(&self.payload)
    }
}

/// In-process publisher over an unbounded channel.
///
/// Sends never block. The paired receiver belongs to the rank consumer; once
/// it is dropped, publishes fail with `PublishError::Transport`.
pub struct QueuePublisher {
    sender: Sender<QueuedMessage>,
}

impl QueuePublisher {
    pub fn channel() -> (Self, Receiver<QueuedMessage>) {
        let (sender, receiver) = mpsc::channel();
        (Self { sender }, receiver)
    }
}

impl RankUpdatePublisher for QueuePublisher {
    fn publish(&self, topic: &str, payload: &[u8]) -> Result<(), PublishError> {
        self.sender
            .send(QueuedMessage {
                topic: topic.to_string(),
                payload: payload.to_vec(),
            })
            .map_err(|_| PublishError::Transport("rank update receiver disconnected".to_string()))
    }
}

/// Fire-and-forget emitter for rank invalidation.
#[derive(Clone)]
pub struct RankUpdateEmitter {
    publisher: Arc<dyn RankUpdatePublisher>,
}

impl RankUpdateEmitter {
    pub fn new(publisher: Arc<dyn RankUpdatePublisher>) -> Self {
        Self { publisher }
    }

    /// Publishes a rank update for `(dimension, category)`.
    ///
    /// Failures are logged at `warn` and swallowed.
    pub fn emit(&self, dimension: u32, category: BestCategory) {
        if let Err(err) = self.try_emit(dimension, category) {
            warn!(
                "event=rank_update_publish module=notify status=error dimension={} category={} error={}",
                dimension, category, err
            );
        }
    }

    fn try_emit(&self, dimension: u32, category: BestCategory) -> Result<(), PublishError> {
        let message = RankUpdateMessage::new(RankUpdate {
            dimension,
            category,
        });
        let payload = serde_json::to_vec(&message)?;
        self.publisher.publish(RANK_UPDATE_TOPIC, &payload)?;
        debug!(
            "event=rank_update_publish module=notify status=ok dimension={} category={}",
            dimension, category
        );
        Ok(())
    }
}
