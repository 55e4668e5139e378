use lockstake_core::config::GlobalConfig;
use lockstake_core::error::StakeError;
use lockstake_core::record::StakeRecord;
use lockstake_core::types::RecordId;
use sled::transaction::{ConflictableTransactionError, TransactionError};
use sled::Transactional;
use std::collections::BTreeSet;
use std::path::Path;

const META_CONFIG: &str = "config";
const META_NEXT_ID: &str = "next_id";

/// Persistent engine snapshot backed by sled (pure-Rust, no C dependencies).
///
/// Named trees:
///   records: RecordId BE bytes → bincode(StakeRecord)
///   meta:    utf8 key bytes    → bincode(value)
pub struct StakeDb {
    _db: sled::Db,
    records: sled::Tree,
    meta: sled::Tree,
}

impl StakeDb {
    /// Open or create the database at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StakeError> {
        let db = sled::open(path).map_err(|e| StakeError::Storage(e.to_string()))?;
        let records = db.open_tree("records").map_err(|e| StakeError::Storage(e.to_string()))?;
        let meta    = db.open_tree("meta").map_err(|e| StakeError::Storage(e.to_string()))?;
        Ok(Self { _db: db, records, meta })
    }

    // ── Records ──────────────────────────────────────────────────────────────

    pub fn get_record(&self, id: RecordId) -> Result<Option<StakeRecord>, StakeError> {
        match self.records.get(id.to_be_bytes()).map_err(|e| StakeError::Storage(e.to_string()))? {
            Some(bytes) => {
                let record = bincode::deserialize(&bytes)
                    .map_err(|e| StakeError::Serialization(e.to_string()))?;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    pub fn put_record(&self, record: &StakeRecord) -> Result<(), StakeError> {
        let bytes = bincode::serialize(record)
            .map_err(|e| StakeError::Serialization(e.to_string()))?;
        self.records
            .insert(record.id.to_be_bytes(), bytes)
            .map_err(|e| StakeError::Storage(e.to_string()))?;
        Ok(())
    }

    /// All records in id order.
    pub fn records(&self) -> Result<Vec<StakeRecord>, StakeError> {
        let mut out = Vec::new();
        for item in self.records.iter() {
            let (_, bytes) = item.map_err(|e| StakeError::Storage(e.to_string()))?;
            let record = bincode::deserialize(&bytes)
                .map_err(|e| StakeError::Serialization(e.to_string()))?;
            out.push(record);
        }
        Ok(out)
    }

    // ── Meta ─────────────────────────────────────────────────────────────────

    pub fn get_config(&self) -> Result<Option<GlobalConfig>, StakeError> {
        match self.get_meta(META_CONFIG)? {
            Some(bytes) => bincode::deserialize(&bytes)
                .map(Some)
                .map_err(|e| StakeError::Serialization(e.to_string())),
            None => Ok(None),
        }
    }

    pub fn get_next_id(&self) -> Result<Option<u64>, StakeError> {
        match self.get_meta(META_NEXT_ID)? {
            Some(bytes) => {
                let arr: [u8; 8] = bytes
                    .as_slice()
                    .try_into()
                    .map_err(|_| StakeError::Serialization("next_id must be 8 bytes".into()))?;
                Ok(Some(u64::from_be_bytes(arr)))
            }
            None => Ok(None),
        }
    }

    // ── Snapshot ─────────────────────────────────────────────────────────────

    /// Replace the stored snapshot with `config`, `records` and `next_id`.
    ///
    /// Both trees are written in one sled transaction: a reader sees either
    /// the previous snapshot or this one. Records absent from `records` are
    /// removed, so the stored set always equals the snapshot's set.
    pub fn write_snapshot(
        &self,
        config: &GlobalConfig,
        records: &[StakeRecord],
        next_id: u64,
    ) -> Result<(), StakeError> {
        let config_bytes = bincode::serialize(config)
            .map_err(|e| StakeError::Serialization(e.to_string()))?;
        let mut encoded = Vec::with_capacity(records.len());
        for record in records {
            let bytes = bincode::serialize(record)
                .map_err(|e| StakeError::Serialization(e.to_string()))?;
            encoded.push((record.id.to_be_bytes(), bytes));
        }

        let keep: BTreeSet<[u8; 8]> = encoded.iter().map(|(k, _)| *k).collect();
        let mut stale = Vec::new();
        for key in self.records.iter().keys() {
            let key = key.map_err(|e| StakeError::Storage(e.to_string()))?;
            if !keep.contains(&key[..]) {
                stale.push(key);
            }
        }

        (&self.records, &self.meta)
            .transaction(|(records_tx, meta_tx)| {
                for key in &stale {
                    records_tx.remove(key.clone())?;
                }
                for (key, bytes) in &encoded {
                    records_tx.insert(&key[..], bytes.clone())?;
                }
                meta_tx.insert(META_CONFIG.as_bytes(), config_bytes.clone())?;
                meta_tx.insert(META_NEXT_ID.as_bytes(), &next_id.to_be_bytes()[..])?;
                Ok::<(), ConflictableTransactionError<()>>(())
            })
            .map_err(|e: TransactionError<()>| StakeError::Storage(format!("{e:?}")))?;

        self.flush()
    }

    fn get_meta(&self, key: &str) -> Result<Option<Vec<u8>>, StakeError> {
        self.meta
            .get(key.as_bytes())
            .map(|v| v.map(|iv| iv.to_vec()))
            .map_err(|e| StakeError::Storage(e.to_string()))
    }

    /// Flush all pending writes to disk.
    pub fn flush(&self) -> Result<(), StakeError> {
        self._db.flush().map_err(|e| StakeError::Storage(e.to_string()))?;
        Ok(())
    }
}
