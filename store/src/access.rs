use crate::cache::Cache;
use crate::db::DB;
use crate::errors::{StoreError, StoreResult};
use crate::key::DbKey;
use crate::writer::DbWriter;
use rocksdb::{Direction, IteratorMode, ReadOptions};
use serde::{de::DeserializeOwned, Serialize};
use std::{collections::hash_map::RandomState, hash::BuildHasher, sync::Arc};

/// A concurrent DB store access with typed caching.
#[derive(Clone)]
pub struct CachedDbAccess<TKey, TData, S = RandomState>
where
    TKey: Clone + std::hash::Hash + Eq + Send + Sync,
    TData: Clone + Send + Sync,
{
    db: Arc<DB>,

    // Cache
    cache: Cache<TKey, TData, S>,

    // DB bucket/path
    prefix: Vec<u8>,
}

impl<TKey, TData, S> CachedDbAccess<TKey, TData, S>
where
    TKey: Clone + std::hash::Hash + Eq + Send + Sync,
    TData: Clone + Send + Sync,
    S: BuildHasher + Default,
{
    pub fn new(db: Arc<DB>, cache_size: u64, prefix: Vec<u8>) -> Self {
        Self { db, cache: Cache::new(cache_size), prefix }
    }

    pub fn read_from_cache(&self, key: &TKey) -> Option<TData> {
        self.cache.get(key)
    }

    pub fn has(&self, key: TKey) -> StoreResult<bool>
    where
        TKey: AsRef<[u8]>,
    {
        Ok(self.cache.contains_key(&key) || self.db.get_pinned(DbKey::new(&self.prefix, key))?.is_some())
    }

    pub fn read(&self, key: TKey) -> StoreResult<TData>
    where
        TKey: AsRef<[u8]>,
        TData: DeserializeOwned, // We need `DeserializeOwned` since the slice coming from `db.get_pinned` has short lifetime
    {
        if let Some(data) = self.cache.get(&key) {
            Ok(data)
        } else {
            let db_key = DbKey::new(&self.prefix, key.clone());
            if let Some(slice) = self.db.get_pinned(&db_key)? {
                let data: TData = bincode::deserialize(&slice)?;
                self.cache.insert(key, data.clone());
                Ok(data)
            } else {
                Err(StoreError::KeyNotFound(db_key))
            }
        }
    }

    pub fn write(&self, mut writer: impl DbWriter, key: TKey, data: TData) -> StoreResult<()>
    where
        TKey: AsRef<[u8]>,
        TData: Serialize,
    {
        let bin_data = bincode::serialize(&data)?;
        self.cache.insert(key.clone(), data);
        writer.put(DbKey::new(&self.prefix, key), bin_data)?;
        Ok(())
    }

    pub fn delete(&self, mut writer: impl DbWriter, key: TKey) -> StoreResult<()>
    where
        TKey: AsRef<[u8]>,
    {
        self.cache.remove(&key);
        writer.delete(DbKey::new(&self.prefix, key))?;
        Ok(())
    }

    /// Writes without touching the cache. Atomic flows stage their batch
    /// through this and publish cache state only after the batch commits,
    /// so a failed commit leaves no trace.
    pub fn write_uncached(&self, mut writer: impl DbWriter, key: TKey, data: TData) -> StoreResult<()>
    where
        TKey: AsRef<[u8]>,
        TData: Serialize,
    {
        let bin_data = bincode::serialize(&data)?;
        writer.put(DbKey::new(&self.prefix, key), bin_data)?;
        Ok(())
    }

    /// Deletes without touching the cache. See [`Self::write_uncached`].
    pub fn delete_uncached(&self, mut writer: impl DbWriter, key: TKey) -> StoreResult<()>
    where
        TKey: AsRef<[u8]>,
    {
        writer.delete(DbKey::new(&self.prefix, key))?;
        Ok(())
    }

    pub fn cache_insert(&self, key: TKey, data: TData) {
        self.cache.insert(key, data);
    }

    pub fn cache_remove(&self, key: &TKey) {
        self.cache.remove(key);
    }

    pub fn clear_cache(&self) {
        self.cache.remove_all();
    }

    /// Iterates the whole bucket, ascending by key bytes. Yielded keys are
    /// stripped of the store prefix.
    pub fn iterator(&self) -> impl Iterator<Item = StoreResult<(Box<[u8]>, TData)>> + '_
    where
        TData: DeserializeOwned,
    {
        self.prefix_iterator([])
    }

    /// Iterates the sub-range of the bucket whose keys start with `bucket`,
    /// ascending by key bytes.
    pub fn prefix_iterator(&self, bucket: impl AsRef<[u8]>) -> impl Iterator<Item = StoreResult<(Box<[u8]>, TData)>> + '_
    where
        TData: DeserializeOwned,
    {
        let mut db_key = DbKey::prefix_only(&self.prefix);
        db_key.add_bucket(bucket);
        let mut read_opts = ReadOptions::default();
        read_opts.set_iterate_range(rocksdb::PrefixRange(db_key.as_ref()));
        let strip = self.prefix.len();
        self.db.iterator_opt(IteratorMode::From(db_key.as_ref(), Direction::Forward), read_opts).map(move |item| match item {
            Ok((key_bytes, data_bytes)) => match bincode::deserialize(&data_bytes) {
                Ok(data) => Ok((key_bytes[strip..].into(), data)),
                Err(err) => Err(err.into()),
            },
            Err(err) => Err(err.into()),
        })
    }

    pub fn prefix(&self) -> &[u8] {
        &self.prefix
    }
}
