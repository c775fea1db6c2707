use crate::db::DB;
use crate::errors::StoreResult;
use rocksdb::WriteBatch;

/// Abstraction over direct/batched DB writing
pub trait DbWriter {
    fn put<K, V>(&mut self, key: K, value: V) -> StoreResult<()>
    where
        K: AsRef<[u8]>,
        V: AsRef<[u8]>;
    fn delete<K: AsRef<[u8]>>(&mut self, key: K) -> StoreResult<()>;
}

pub struct DirectDbWriter<'a> {
    db: &'a DB,
}

impl<'a> DirectDbWriter<'a> {
    pub fn new(db: &'a DB) -> Self {
        Self { db }
    }
}

impl DbWriter for DirectDbWriter<'_> {
    fn put<K, V>(&mut self, key: K, value: V) -> StoreResult<()>
    where
        K: AsRef<[u8]>,
        V: AsRef<[u8]>,
    {
        Ok(self.db.put(key, value)?)
    }

    fn delete<K: AsRef<[u8]>>(&mut self, key: K) -> StoreResult<()> {
        Ok(self.db.delete(key)?)
    }
}

pub struct BatchDbWriter<'a> {
    batch: &'a mut WriteBatch,
}

impl<'a> BatchDbWriter<'a> {
    pub fn new(batch: &'a mut WriteBatch) -> Self {
        Self { batch }
    }
}

impl DbWriter for BatchDbWriter<'_> {
    fn put<K, V>(&mut self, key: K, value: V) -> StoreResult<()>
    where
        K: AsRef<[u8]>,
        V: AsRef<[u8]>,
    {
        self.batch.put(key, value);
        Ok(())
    }

    fn delete<K: AsRef<[u8]>>(&mut self, key: K) -> StoreResult<()> {
        self.batch.delete(key);
        Ok(())
    }
}

impl<T: DbWriter> DbWriter for &mut T {
    #[inline]
    fn put<K, V>(&mut self, key: K, value: V) -> StoreResult<()>
    where
        K: AsRef<[u8]>,
        V: AsRef<[u8]>,
    {
        (*self).put(key, value)
    }

    #[inline]
    fn delete<K: AsRef<[u8]>>(&mut self, key: K) -> StoreResult<()> {
        (*self).delete(key)
    }
}

/// A batch writer that starts failing after a set number of operations.
/// Used to exercise the all-or-nothing guarantees of batched flows.
#[cfg(test)]
pub(crate) struct FailingDbWriter<'a> {
    batch: &'a mut WriteBatch,
    remaining: usize,
}

#[cfg(test)]
impl<'a> FailingDbWriter<'a> {
    pub(crate) fn new(batch: &'a mut WriteBatch, remaining: usize) -> Self {
        Self { batch, remaining }
    }

    fn consume(&mut self) -> StoreResult<()> {
        if self.remaining == 0 {
            return Err(crate::errors::StoreError::DataInconsistency("injected write failure".into()));
        }
        self.remaining -= 1;
        Ok(())
    }
}

#[cfg(test)]
impl DbWriter for FailingDbWriter<'_> {
    fn put<K, V>(&mut self, key: K, value: V) -> StoreResult<()>
    where
        K: AsRef<[u8]>,
        V: AsRef<[u8]>,
    {
        self.consume()?;
        self.batch.put(key, value);
        Ok(())
    }

    fn delete<K: AsRef<[u8]>>(&mut self, key: K) -> StoreResult<()> {
        self.consume()?;
        self.batch.delete(key);
        Ok(())
    }
}
