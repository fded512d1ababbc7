use chrono::{DateTime, Duration, Utc};
use lmdb::{Cursor, Database, Environment, EnvironmentFlags, Transaction, WriteFlags};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

use super::{DrawRecord, StoreError};
use crate::entry::{Entry, Winner};

/// LMDB-backed raffle storage
pub struct EntryStore {
    env: Environment,
    /// entries: id (8 bytes LE) -> Entry
    entries_db: Database,
    /// referral_codes: code (utf-8) -> id (8 bytes LE)
    /// Enforces code uniqueness and backs referrer lookups
    referral_db: Database,
    /// metadata: key -> value (counters and draw state)
    meta_db: Database,
}

// Metadata keys (fixed size for LMDB compatibility)
const META_NEXT_ID: &[u8; 7] = b"next_id";
const META_END_TIME: &[u8; 8] = b"end_time";
const META_WINNERS: &[u8; 7] = b"winners";
const META_DRAW_TIME: &[u8; 9] = b"draw_time";

/// Hours until the default campaign end time seeded on first open.
const DEFAULT_CAMPAIGN_HOURS: i64 = 24;

/// Fields supplied at signup; everything else is assigned by the store.
#[derive(Debug, Clone)]
pub struct NewEntry {
    pub name: String,
    pub phone: String,
    pub instagram: String,
    pub referral_code: String,
    pub referred_by: Option<String>,
}

/// Aggregate counts for status reporting.
#[derive(Debug, Clone, Copy, Default)]
pub struct StoreStats {
    pub entry_count: u64,
    pub total_tickets: u64,
}

impl EntryStore {
    /// Open or create a store at the given path.
    ///
    /// A fresh store gets a default campaign end time of now + 24h,
    /// which the operator can overwrite at any point.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        fs::create_dir_all(path).map_err(|e| {
            StoreError::Database(lmdb::Error::Other(e.raw_os_error().unwrap_or(0)))
        })?;

        let env = Environment::new()
            .set_flags(EnvironmentFlags::NO_SUB_DIR)
            .set_max_dbs(3)
            .set_map_size(64 * 1024 * 1024) // single-campaign scale
            .open(path.join("raffle.mdb").as_ref())?;

        let entries_db = env.create_db(Some("entries"), lmdb::DatabaseFlags::empty())?;
        let referral_db = env.create_db(Some("referral_codes"), lmdb::DatabaseFlags::empty())?;
        let meta_db = env.create_db(Some("meta"), lmdb::DatabaseFlags::empty())?;

        let store = Self {
            env,
            entries_db,
            referral_db,
            meta_db,
        };

        if store.end_time()?.is_none() {
            let default_end = (Utc::now() + Duration::hours(DEFAULT_CAMPAIGN_HOURS)).to_rfc3339();
            info!(end_time = %default_end, "Initializing store with default end time");
            store.set_end_time(&default_end)?;
        }

        Ok(store)
    }

    /// Create an entry, claiming its referral code.
    ///
    /// Id allocation, the code index write, and the record write happen
    /// in one write transaction. A code that is already taken fails with
    /// [`StoreError::ReferralCodeExists`]; the caller regenerates and
    /// retries.
    pub fn create_entry(&self, new: NewEntry) -> Result<Entry, StoreError> {
        let mut txn = self.env.begin_rw_txn()?;

        let id = match txn.get(self.meta_db, META_NEXT_ID) {
            Ok(bytes) => u64::from_le_bytes(bytes.try_into().unwrap_or([0; 8])),
            Err(lmdb::Error::NotFound) => 1,
            Err(e) => return Err(e.into()),
        };

        txn.put(
            self.referral_db,
            &new.referral_code,
            &id.to_le_bytes(),
            WriteFlags::NO_OVERWRITE, // fail on duplicate code
        )
        .map_err(|e| {
            if matches!(e, lmdb::Error::KeyExist) {
                StoreError::ReferralCodeExists(new.referral_code.clone())
            } else {
                e.into()
            }
        })?;

        let entry = Entry {
            id,
            name: new.name,
            phone: new.phone,
            instagram: new.instagram,
            referral_code: new.referral_code,
            referred_by: new.referred_by,
            tickets: 1,
            created_at: Utc::now(),
        };

        let entry_bytes =
            bincode::serialize(&entry).map_err(|e| StoreError::Serialization(e.to_string()))?;
        txn.put(
            self.entries_db,
            &id.to_le_bytes(),
            &entry_bytes,
            WriteFlags::empty(),
        )?;
        txn.put(
            self.meta_db,
            META_NEXT_ID,
            &(id + 1).to_le_bytes(),
            WriteFlags::empty(),
        )?;

        txn.commit()?;

        debug!(id = entry.id, code = %entry.referral_code, "Created entry");
        Ok(entry)
    }

    /// Get an entry by id.
    pub fn get_entry(&self, id: u64) -> Result<Option<Entry>, StoreError> {
        let txn = self.env.begin_ro_txn()?;

        match txn.get(self.entries_db, &id.to_le_bytes()) {
            Ok(bytes) => {
                let entry = bincode::deserialize(bytes)
                    .map_err(|e| StoreError::Serialization(e.to_string()))?;
                Ok(Some(entry))
            }
            Err(lmdb::Error::NotFound) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Look up the entry owning a referral code.
    pub fn find_by_referral_code(&self, code: &str) -> Result<Option<Entry>, StoreError> {
        let txn = self.env.begin_ro_txn()?;

        let id = match txn.get(self.referral_db, &code) {
            Ok(bytes) => u64::from_le_bytes(bytes.try_into().unwrap_or([0; 8])),
            Err(lmdb::Error::NotFound) => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        match txn.get(self.entries_db, &id.to_le_bytes()) {
            Ok(bytes) => {
                let entry = bincode::deserialize(bytes)
                    .map_err(|e| StoreError::Serialization(e.to_string()))?;
                Ok(Some(entry))
            }
            Err(lmdb::Error::NotFound) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Atomically add one ticket to the entry with this id.
    ///
    /// The read-modify-write runs inside a single write transaction, so
    /// concurrent increments against the same referrer serialize instead
    /// of clobbering each other. An unknown id is a no-op; the referral
    /// path looks the entry up first, but the two operations tolerate
    /// being called independently.
    pub fn increment_tickets(&self, id: u64) -> Result<(), StoreError> {
        let mut txn = self.env.begin_rw_txn()?;

        let mut entry: Entry = match txn.get(self.entries_db, &id.to_le_bytes()) {
            Ok(bytes) => bincode::deserialize(bytes)
                .map_err(|e| StoreError::Serialization(e.to_string()))?,
            Err(lmdb::Error::NotFound) => return Ok(()),
            Err(e) => return Err(e.into()),
        };

        entry.tickets += 1;

        let entry_bytes =
            bincode::serialize(&entry).map_err(|e| StoreError::Serialization(e.to_string()))?;
        txn.put(
            self.entries_db,
            &id.to_le_bytes(),
            &entry_bytes,
            WriteFlags::empty(),
        )?;
        txn.commit()?;

        debug!(id, tickets = entry.tickets, "Credited referral ticket");
        Ok(())
    }

    /// All entries, in no guaranteed order.
    pub fn list_entries(&self) -> Result<Vec<Entry>, StoreError> {
        let txn = self.env.begin_ro_txn()?;
        let mut entries = Vec::new();

        let mut cursor = txn.open_ro_cursor(self.entries_db)?;
        for item in cursor.iter() {
            let (_, value) = item?;
            let entry = bincode::deserialize(value)
                .map_err(|e| StoreError::Serialization(e.to_string()))?;
            entries.push(entry);
        }

        Ok(entries)
    }

    /// Entry count and total ticket weight.
    pub fn stats(&self) -> Result<StoreStats, StoreError> {
        let entries = self.list_entries()?;
        Ok(StoreStats {
            entry_count: entries.len() as u64,
            total_tickets: entries.iter().map(|e| e.tickets).sum(),
        })
    }

    /// Overwrite the persisted draw outcome with this winner set,
    /// stamped with the current time.
    pub fn record_draw(&self, winners: &[Winner]) -> Result<DrawRecord, StoreError> {
        let draw_time = Utc::now();
        let winners_json =
            serde_json::to_vec(winners).map_err(|e| StoreError::Serialization(e.to_string()))?;

        let mut txn = self.env.begin_rw_txn()?;
        txn.put(self.meta_db, META_WINNERS, &winners_json, WriteFlags::empty())?;
        txn.put(
            self.meta_db,
            META_DRAW_TIME,
            &draw_time.to_rfc3339(),
            WriteFlags::empty(),
        )?;
        txn.commit()?;

        info!(winners = winners.len(), "Recorded draw");
        Ok(DrawRecord {
            winners: winners.to_vec(),
            draw_time,
        })
    }

    /// The most recently recorded draw, or `None` before any draw.
    pub fn get_draw(&self) -> Result<Option<DrawRecord>, StoreError> {
        let txn = self.env.begin_ro_txn()?;

        let winners_bytes = match txn.get(self.meta_db, META_WINNERS) {
            Ok(bytes) => bytes,
            Err(lmdb::Error::NotFound) => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let draw_time_bytes = match txn.get(self.meta_db, META_DRAW_TIME) {
            Ok(bytes) => bytes,
            Err(lmdb::Error::NotFound) => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let winners: Vec<Winner> = serde_json::from_slice(winners_bytes)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        let draw_time = std::str::from_utf8(draw_time_bytes)
            .ok()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|t| t.with_timezone(&Utc))
            .ok_or_else(|| StoreError::Serialization("invalid draw_time".to_string()))?;

        Ok(Some(DrawRecord { winners, draw_time }))
    }

    /// Overwrite the campaign end time. The value is opaque to the store.
    pub fn set_end_time(&self, value: &str) -> Result<(), StoreError> {
        let mut txn = self.env.begin_rw_txn()?;
        txn.put(self.meta_db, META_END_TIME, &value, WriteFlags::empty())?;
        txn.commit()?;
        Ok(())
    }

    /// The campaign end time, if one has been set.
    pub fn end_time(&self) -> Result<Option<String>, StoreError> {
        let txn = self.env.begin_ro_txn()?;

        match txn.get(self.meta_db, META_END_TIME) {
            Ok(bytes) => Ok(Some(String::from_utf8_lossy(bytes).into_owned())),
            Err(lmdb::Error::NotFound) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn new_entry(code: &str, referred_by: Option<&str>) -> NewEntry {
        NewEntry {
            name: "Test".to_string(),
            phone: "+1 555 0100".to_string(),
            instagram: "@test".to_string(),
            referral_code: code.to_string(),
            referred_by: referred_by.map(str::to_string),
        }
    }

    #[test]
    fn test_open_seeds_default_end_time() {
        let dir = tempdir().unwrap();
        let store = EntryStore::open(dir.path()).unwrap();

        let end_time = store.end_time().unwrap();
        assert!(end_time.is_some());

        // Reopening must not overwrite the seeded value
        let seeded = end_time.unwrap();
        drop(store);
        let store = EntryStore::open(dir.path()).unwrap();
        assert_eq!(store.end_time().unwrap().unwrap(), seeded);
    }

    #[test]
    fn test_create_and_get_entry() {
        let dir = tempdir().unwrap();
        let store = EntryStore::open(dir.path()).unwrap();

        let entry = store.create_entry(new_entry("aabbccdd", None)).unwrap();
        assert_eq!(entry.id, 1);
        assert_eq!(entry.tickets, 1);

        let fetched = store.get_entry(entry.id).unwrap().unwrap();
        assert_eq!(fetched, entry);

        assert!(store.get_entry(99).unwrap().is_none());
    }

    #[test]
    fn test_ids_are_sequential() {
        let dir = tempdir().unwrap();
        let store = EntryStore::open(dir.path()).unwrap();

        let a = store.create_entry(new_entry("00000001", None)).unwrap();
        let b = store.create_entry(new_entry("00000002", None)).unwrap();
        assert_eq!(a.id, 1);
        assert_eq!(b.id, 2);
    }

    #[test]
    fn test_duplicate_referral_code_rejected() {
        let dir = tempdir().unwrap();
        let store = EntryStore::open(dir.path()).unwrap();

        store.create_entry(new_entry("aabbccdd", None)).unwrap();
        let result = store.create_entry(new_entry("aabbccdd", None));

        assert!(matches!(
            result,
            Err(StoreError::ReferralCodeExists(code)) if code == "aabbccdd"
        ));

        // The failed attempt must not have consumed an id or written a record
        assert_eq!(store.list_entries().unwrap().len(), 1);
        let next = store.create_entry(new_entry("11223344", None)).unwrap();
        assert_eq!(next.id, 2);
    }

    #[test]
    fn test_find_by_referral_code() {
        let dir = tempdir().unwrap();
        let store = EntryStore::open(dir.path()).unwrap();

        let entry = store.create_entry(new_entry("cafef00d", None)).unwrap();

        let found = store.find_by_referral_code("cafef00d").unwrap().unwrap();
        assert_eq!(found.id, entry.id);

        assert!(store.find_by_referral_code("deadbeef").unwrap().is_none());
    }

    #[test]
    fn test_increment_tickets_twice() {
        let dir = tempdir().unwrap();
        let store = EntryStore::open(dir.path()).unwrap();

        let entry = store.create_entry(new_entry("aabbccdd", None)).unwrap();
        store.increment_tickets(entry.id).unwrap();
        store.increment_tickets(entry.id).unwrap();

        let fetched = store.get_entry(entry.id).unwrap().unwrap();
        assert_eq!(fetched.tickets, 3);
    }

    #[test]
    fn test_increment_tickets_unknown_id_is_noop() {
        let dir = tempdir().unwrap();
        let store = EntryStore::open(dir.path()).unwrap();

        store.increment_tickets(12345).unwrap();
        assert!(store.list_entries().unwrap().is_empty());
    }

    #[test]
    fn test_stats() {
        let dir = tempdir().unwrap();
        let store = EntryStore::open(dir.path()).unwrap();

        let a = store.create_entry(new_entry("00000001", None)).unwrap();
        store.create_entry(new_entry("00000002", None)).unwrap();
        store.increment_tickets(a.id).unwrap();

        let stats = store.stats().unwrap();
        assert_eq!(stats.entry_count, 2);
        assert_eq!(stats.total_tickets, 3);
    }

    #[test]
    fn test_draw_record_roundtrip() {
        let dir = tempdir().unwrap();
        let store = EntryStore::open(dir.path()).unwrap();

        assert!(store.get_draw().unwrap().is_none());

        let entry = store.create_entry(new_entry("aabbccdd", None)).unwrap();
        let winners = vec![Winner::from(&entry)];

        let recorded = store.record_draw(&winners).unwrap();
        let fetched = store.get_draw().unwrap().unwrap();

        assert_eq!(fetched.winners, winners);
        assert_eq!(fetched.draw_time, recorded.draw_time);
    }

    #[test]
    fn test_draw_record_overwritten() {
        let dir = tempdir().unwrap();
        let store = EntryStore::open(dir.path()).unwrap();

        let a = store.create_entry(new_entry("00000001", None)).unwrap();
        let b = store.create_entry(new_entry("00000002", None)).unwrap();

        store.record_draw(&[Winner::from(&a)]).unwrap();
        store.record_draw(&[Winner::from(&b)]).unwrap();

        let fetched = store.get_draw().unwrap().unwrap();
        assert_eq!(fetched.winners.len(), 1);
        assert_eq!(fetched.winners[0].id, b.id);
    }

    #[test]
    fn test_set_end_time_overwrites() {
        let dir = tempdir().unwrap();
        let store = EntryStore::open(dir.path()).unwrap();

        store.set_end_time("2025-12-31T23:59:59+00:00").unwrap();
        assert_eq!(
            store.end_time().unwrap().as_deref(),
            Some("2025-12-31T23:59:59+00:00")
        );
    }
}
