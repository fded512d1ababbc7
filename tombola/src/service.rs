// Copyright (c) 2025 Tombola Project

//! Boundary operations consumed by the outer HTTP/admin layers.
//!
//! Every operation takes the store handle explicitly; there is no
//! process-wide storage singleton. Mutating operations also take the
//! caller's random source, bounded to `RngCore + CryptoRng` so drawings
//! stay unpredictable in production while tests can substitute a
//! controllable CSPRNG.
//!
//! Admin authorization happens before these functions are called; none
//! of them check credentials.

use rand_core::{CryptoRng, RngCore};
use thiserror::Error;
use tracing::{debug, info};

use tombola_draw::{draw_winners, Candidate};

use crate::entry::{referral_code, Winner};
use crate::store::{DrawRecord, EntryStore, NewEntry, StoreError};

/// Attempts at generating an unclaimed referral code before giving up.
const REFERRAL_CODE_RETRIES: usize = 5;

#[derive(Debug, Error)]
pub enum ServiceError {
    /// Rejected request; the caller surfaces it and does not retry.
    #[error("Validation failed: {0}")]
    Validation(&'static str),

    /// Referral-code generation kept colliding.
    #[error("Could not allocate a unique referral code after {0} attempts")]
    ReferralCodeSpace(usize),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
}

/// A signup as received from the outer layer, untrimmed.
#[derive(Debug, Clone, Default)]
pub struct SignupRequest {
    pub name: String,
    pub phone: String,
    pub instagram: String,
    /// Referrer's code, from a share link or form field
    pub referred_by: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SignupResponse {
    /// The new entrant's own code, ready to share
    pub referral_code: String,
}

/// Campaign counters for the status endpoint.
#[derive(Debug, Clone)]
pub struct Status {
    pub entry_count: u64,
    pub total_tickets: u64,
    pub end_time: Option<String>,
}

/// Winners selected by one `run_draw` invocation.
#[derive(Debug, Clone)]
pub struct DrawOutcome {
    pub winners: Vec<Winner>,
}

/// Create an entry, then credit the referrer if the token matches one.
///
/// `phone` and `instagram` must be non-empty after trimming. The new
/// entry always starts at one ticket; only the referrer's count moves.
pub fn signup<R: RngCore + CryptoRng>(
    store: &EntryStore,
    rng: &mut R,
    request: SignupRequest,
) -> Result<SignupResponse, ServiceError> {
    let name = request.name.trim().to_string();
    let phone = request.phone.trim().to_string();
    let instagram = request.instagram.trim().to_string();

    if phone.is_empty() {
        return Err(ServiceError::Validation("phone is required"));
    }
    if instagram.is_empty() {
        return Err(ServiceError::Validation("instagram is required"));
    }

    let referred_by = request
        .referred_by
        .as_deref()
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string);

    let mut created = None;
    for _ in 0..REFERRAL_CODE_RETRIES {
        let new = NewEntry {
            name: name.clone(),
            phone: phone.clone(),
            instagram: instagram.clone(),
            referral_code: referral_code(rng),
            referred_by: referred_by.clone(),
        };
        match store.create_entry(new) {
            Ok(entry) => {
                created = Some(entry);
                break;
            }
            Err(StoreError::ReferralCodeExists(code)) => {
                debug!(%code, "Referral code collision, regenerating");
            }
            Err(e) => return Err(e.into()),
        }
    }
    let entry = created.ok_or(ServiceError::ReferralCodeSpace(REFERRAL_CODE_RETRIES))?;

    // Credit the referrer, if any. An unknown token is not an error.
    if let Some(token) = &entry.referred_by {
        match store.find_by_referral_code(token)? {
            Some(referrer) => store.increment_tickets(referrer.id)?,
            None => debug!(%token, "Referral token matched no entry"),
        }
    }

    info!(id = entry.id, "New signup");
    Ok(SignupResponse {
        referral_code: entry.referral_code,
    })
}

/// Campaign counters plus the configured end time.
pub fn status(store: &EntryStore) -> Result<Status, ServiceError> {
    let stats = store.stats()?;
    Ok(Status {
        entry_count: stats.entry_count,
        total_tickets: stats.total_tickets,
        end_time: store.end_time()?,
    })
}

/// Draw `k` winners over a snapshot of all entries and persist the
/// outcome, replacing any previous draw record.
///
/// The snapshot is taken once; signups landing while the draw runs join
/// the next draw.
pub fn run_draw<R: RngCore + CryptoRng>(
    store: &EntryStore,
    rng: &mut R,
    k: usize,
) -> Result<DrawOutcome, ServiceError> {
    let entries = store.list_entries()?;
    let candidates: Vec<Candidate> = entries
        .iter()
        .map(|e| Candidate::new(e.id, e.tickets))
        .collect();

    let winner_ids = draw_winners(&candidates, k, rng);
    let winners: Vec<Winner> = entries
        .iter()
        .filter(|e| winner_ids.contains(&e.id))
        .map(Winner::from)
        .collect();

    store.record_draw(&winners)?;
    info!(
        winners = winners.len(),
        entries = entries.len(),
        "Draw complete"
    );
    Ok(DrawOutcome { winners })
}

/// The last recorded draw, or `None` before any draw has run.
pub fn winners(store: &EntryStore) -> Result<Option<DrawRecord>, ServiceError> {
    Ok(store.get_draw()?)
}

/// Overwrite the campaign end time. The value passes through opaquely;
/// format and chronology are the operator's business.
pub fn set_end_time(store: &EntryStore, value: &str) -> Result<(), ServiceError> {
    store.set_end_time(value)?;
    Ok(())
}
