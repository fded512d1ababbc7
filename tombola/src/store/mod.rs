mod entries;

pub use entries::{EntryStore, NewEntry, StoreStats};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::entry::Winner;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] lmdb::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Referral code already taken: {0}")]
    ReferralCodeExists(String),
}

/// Outcome of the most recent drawing.
///
/// Replaced wholesale on every draw; no history is kept.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DrawRecord {
    /// Winner snapshots captured at draw time
    pub winners: Vec<Winner>,
    /// When the draw ran
    pub draw_time: DateTime<Utc>,
}
