use chrono::{DateTime, Utc};
use rand_core::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};

/// Random payload length of a referral code; hex encoding doubles it.
const REFERRAL_CODE_BYTES: usize = 4;

/// One raffle participant's record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    /// Unique identifier assigned at creation, never reused
    pub id: u64,
    pub name: String,
    pub phone: String,
    pub instagram: String,
    /// Share token later entrants can submit to credit this entry
    pub referral_code: String,
    /// Referrer token captured verbatim at signup; not validated to exist
    pub referred_by: Option<String>,
    /// Draw weight; starts at 1 and only ever grows
    pub tickets: u64,
    pub created_at: DateTime<Utc>,
}

/// Winner snapshot persisted by a draw and returned to the caller.
///
/// Carries the contact fields an operator needs to reach a winner, but
/// not the referral chain or creation time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Winner {
    pub id: u64,
    pub name: String,
    pub phone: String,
    pub instagram: String,
    pub referral_code: String,
    pub tickets: u64,
}

impl From<&Entry> for Winner {
    fn from(entry: &Entry) -> Self {
        Self {
            id: entry.id,
            name: entry.name.clone(),
            phone: entry.phone.clone(),
            instagram: entry.instagram.clone(),
            referral_code: entry.referral_code.clone(),
            tickets: entry.tickets,
        }
    }
}

/// Generate a fresh referral code: 4 CSPRNG bytes, hex-encoded.
///
/// Codes are short enough to share by hand, so collisions are possible;
/// the store rejects a duplicate and the caller regenerates.
pub fn referral_code<R: RngCore + CryptoRng>(rng: &mut R) -> String {
    let mut bytes = [0u8; REFERRAL_CODE_BYTES];
    rng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand_chacha::ChaCha20Rng;
    use rand_core::SeedableRng;

    #[test]
    fn test_referral_code_shape() {
        let mut rng = ChaCha20Rng::seed_from_u64(11);
        let code = referral_code(&mut rng);

        assert_eq!(code.len(), 8);
        assert!(code.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_referral_codes_vary() {
        let mut rng = ChaCha20Rng::seed_from_u64(12);
        let a = referral_code(&mut rng);
        let b = referral_code(&mut rng);
        assert_ne!(a, b);
    }

    #[test]
    fn test_winner_snapshot_from_entry() {
        let entry = Entry {
            id: 7,
            name: "Ada".to_string(),
            phone: "+1 555 0100".to_string(),
            instagram: "@ada".to_string(),
            referral_code: "deadbeef".to_string(),
            referred_by: Some("cafef00d".to_string()),
            tickets: 4,
            created_at: Utc::now(),
        };

        let winner = Winner::from(&entry);
        assert_eq!(winner.id, 7);
        assert_eq!(winner.tickets, 4);
        assert_eq!(winner.referral_code, "deadbeef");
    }
}
