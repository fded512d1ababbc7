//! Weighted winner selection for raffle drawings.
//!
//! Entries participate with a weight equal to their ticket count. A
//! drawing picks up to `k` distinct winners without replacement at the
//! entry level: every pick is resolved against the cumulative weights of
//! the candidates still in play, and a winner leaves the pool wholesale
//! before the next pick. The result is equivalent to drawing uniformly
//! from a population holding one copy of each id per ticket and then
//! discarding every remaining copy of the winner, without ever
//! materializing that population.
//!
//! ## Randomness
//!
//! Callers supply the random source. Production entry points are expected
//! to pass an OS-backed CSPRNG such as `rand::rngs::OsRng`; the
//! `RngCore + CryptoRng` bound keeps seeded non-cryptographic generators
//! out of release code paths while letting tests drive the drawing with a
//! controllable CSPRNG for statistical assertions.

use rand::Rng;
use rand_core::{CryptoRng, RngCore};

/// Default number of winners per drawing.
pub const DEFAULT_WINNERS: usize = 3;

/// An entry eligible for a drawing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Candidate {
    /// Entry identifier
    pub id: u64,
    /// Ticket count backing this entry's draw weight
    pub tickets: u64,
}

impl Candidate {
    /// Create a new candidate.
    pub fn new(id: u64, tickets: u64) -> Self {
        Self { id, tickets }
    }

    /// Effective draw weight. Stored ticket counts are floored to 1 so a
    /// zero in storage can never exclude an entry from the drawing.
    pub fn weight(&self) -> u64 {
        self.tickets.max(1)
    }
}

/// Select up to `k` distinct winners, weighted by tickets.
///
/// Each pick draws a point uniformly in `[0, remaining_weight)` and
/// resolves it against the prefix sums of the remaining candidates with a
/// binary search. The winner is then removed from the pool, so an id can
/// win at most once while unpicked candidates keep their full weight
/// relative to each other.
///
/// Returns `min(k, candidates.len())` ids in no meaningful order. An
/// empty candidate list yields an empty result.
pub fn draw_winners<R: RngCore + CryptoRng>(
    candidates: &[Candidate],
    k: usize,
    rng: &mut R,
) -> Vec<u64> {
    let mut pool: Vec<Candidate> = candidates.to_vec();
    let count = k.min(pool.len());
    let mut winners = Vec::with_capacity(count);

    while winners.len() < count {
        let mut prefix = Vec::with_capacity(pool.len());
        let mut total = 0u64;
        for candidate in &pool {
            total += candidate.weight();
            prefix.push(total);
        }

        let roll = rng.gen_range(0..total);
        let chosen = prefix.partition_point(|&cumulative| cumulative <= roll);

        let winner = pool.swap_remove(chosen);
        winners.push(winner.id);
    }

    winners
}
