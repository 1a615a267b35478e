//! Per-user scramble assignment status.
//!
//! A user is assigned a scramble per dimension; the assignment stays
//! `Pending` until a competitive attempt against it is recorded.

use crate::model::attempt::UserId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type ScrambleStatusId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScrambleStatusCode {
    Pending,
    Completed,
}

impl ScrambleStatusCode {
    pub(crate) fn to_db(self) -> i64 {
        match self {
            Self::Pending => 1,
            Self::Completed => 2,
        }
    }

    pub(crate) fn from_db(value: i64) -> Option<Self> {
        match value {
            1 => Some(Self::Pending),
            2 => Some(Self::Completed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrambleStatus {
    pub id: ScrambleStatusId,
    pub user_id: UserId,
    pub dimension: u32,
    /// External scramble identifier the user was assigned.
    pub scramble_id: i64,
    pub status: ScrambleStatusCode,
    pub created_at: i64,
    pub updated_at: i64,
}
