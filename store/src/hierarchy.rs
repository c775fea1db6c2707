use crate::access::CachedDbAccess;
use crate::db::DB;
use crate::errors::{StoreError, StoreResult};
use crate::key::DbKey;
use crate::registry::StorePrefixes;
use crate::writer::{BatchDbWriter, DbWriter};
use log::debug;
use parking_lot::RwLock;
use rocksdb::WriteBatch;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use treepath_encoding::{NodeId, NodePath};

/// Big-endian key form of a node id, so point-lookup keys are byte-ordered
/// consistently with id order.
#[derive(PartialEq, Eq, Clone, Copy, Hash)]
pub struct IdKey([u8; 8]);

impl From<NodeId> for IdKey {
    fn from(id: NodeId) -> Self {
        Self(id.value().to_be_bytes())
    }
}

impl From<IdKey> for NodeId {
    fn from(key: IdKey) -> Self {
        NodeId::new(u64::from_be_bytes(key.0))
    }
}

impl AsRef<[u8]> for IdKey {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Read API for a hierarchy store.
pub trait HierarchyStoreReader {
    fn get_path(&self, id: NodeId) -> StoreResult<NodePath>;
    fn has(&self, id: NodeId) -> StoreResult<bool>;
    /// All stored rows whose path extends `prefix`, ascending by path bytes,
    /// which is pre-order. The row whose path equals `prefix` is included.
    /// Pass the empty path for a full ordered scan.
    fn descendants<'a>(&'a self, prefix: &NodePath) -> StoreResult<Box<dyn Iterator<Item = StoreResult<(NodeId, NodePath)>> + 'a>>;
    /// Returns the count of rows in the store. To be used for tests only
    fn count(&self) -> StoreResult<usize>;
}

/// Write API for a hierarchy store. All write functions are deliberately
/// `mut` since path rows are not append-only and thus need to be guarded.
pub trait HierarchyStore: HierarchyStoreReader {
    fn insert(&mut self, id: NodeId, path: NodePath) -> StoreResult<()>;
    fn delete(&mut self, id: NodeId) -> StoreResult<()>;
    /// Replaces the leading `old_prefix` with `new_prefix` on every stored
    /// path sharing it, as one atomic unit, and returns the number of rows
    /// rewritten. Callers pass complete node paths as prefixes, so the
    /// match is segment-boundary-aligned by construction.
    fn bulk_rewrite_prefix(&mut self, old_prefix: &NodePath, new_prefix: &NodePath) -> StoreResult<usize>;
}

fn spliced(path: &NodePath, old_prefix_len: usize, new_prefix: &NodePath) -> NodePath {
    NodePath::from_bytes(&[new_prefix.as_bytes(), &path.as_bytes()[old_prefix_len..]].concat())
}

/// RocksDB-backed hierarchy store. Bucket `PathById` maps id -> path for
/// point lookups; bucket `IdByPath` maps path -> id, so a prefix range scan
/// over it enumerates a subtree in pre-order.
#[derive(Clone)]
pub struct DbHierarchyStore {
    db: Arc<DB>,
    path_by_id: CachedDbAccess<IdKey, NodePath>,
    id_by_path: CachedDbAccess<NodePath, NodeId>,
    /// Scope serializing re-parent rewrites: a bulk rewrite must never
    /// interleave with another rewrite touching an overlapping prefix, while
    /// single-row writes may proceed concurrently with each other.
    rewrite_scope: Arc<RwLock<()>>,
}

impl DbHierarchyStore {
    pub fn new(db: Arc<DB>, cache_size: u64) -> Self {
        Self {
            path_by_id: CachedDbAccess::new(Arc::clone(&db), cache_size, StorePrefixes::PathById.into()),
            id_by_path: CachedDbAccess::new(Arc::clone(&db), cache_size, StorePrefixes::IdByPath.into()),
            db,
            rewrite_scope: Arc::new(RwLock::new(())),
        }
    }

    /// Stages the rewrite of every row under `old_prefix` into `writer`,
    /// without publishing anything to the caches. Returns the row count.
    fn stage_rewrite(&self, mut writer: impl DbWriter, old_prefix: &NodePath, new_prefix: &NodePath) -> StoreResult<usize> {
        let rows: Vec<(NodePath, NodeId)> = self
            .id_by_path
            .prefix_iterator(old_prefix.as_bytes())
            .map(|item| item.map(|(key, id)| (NodePath::from_bytes(&key), id)))
            .collect::<StoreResult<Vec<_>>>()?;
        for (old_path, id) in &rows {
            let new_path = spliced(old_path, old_prefix.len(), new_prefix);
            self.id_by_path.delete_uncached(&mut writer, old_path.clone())?;
            self.id_by_path.write_uncached(&mut writer, new_path.clone(), *id)?;
            self.path_by_id.write_uncached(&mut writer, IdKey::from(*id), new_path)?;
        }
        Ok(rows.len())
    }
}

impl HierarchyStoreReader for DbHierarchyStore {
    fn get_path(&self, id: NodeId) -> StoreResult<NodePath> {
        self.path_by_id.read(IdKey::from(id))
    }

    fn has(&self, id: NodeId) -> StoreResult<bool> {
        self.path_by_id.has(IdKey::from(id))
    }

    fn descendants<'a>(&'a self, prefix: &NodePath) -> StoreResult<Box<dyn Iterator<Item = StoreResult<(NodeId, NodePath)>> + 'a>> {
        Ok(Box::new(
            self.id_by_path
                .prefix_iterator(prefix.as_bytes())
                .map(|item| item.map(|(key, id)| (id, NodePath::from_bytes(&key)))),
        ))
    }

    fn count(&self) -> StoreResult<usize> {
        Ok(self.path_by_id.iterator().count())
    }
}

impl HierarchyStore for DbHierarchyStore {
    fn insert(&mut self, id: NodeId, path: NodePath) -> StoreResult<()> {
        let _scope = self.rewrite_scope.read();
        if self.path_by_id.has(IdKey::from(id))? {
            return Err(StoreError::KeyAlreadyExists(id.to_string()));
        }
        let mut batch = WriteBatch::default();
        let mut writer = BatchDbWriter::new(&mut batch);
        self.path_by_id.write_uncached(&mut writer, IdKey::from(id), path.clone())?;
        self.id_by_path.write_uncached(&mut writer, path.clone(), id)?;
        self.db.write(batch)?;
        self.path_by_id.cache_insert(IdKey::from(id), path.clone());
        self.id_by_path.cache_insert(path, id);
        Ok(())
    }

    fn delete(&mut self, id: NodeId) -> StoreResult<()> {
        let _scope = self.rewrite_scope.read();
        let path = self.path_by_id.read(IdKey::from(id))?;
        let mut batch = WriteBatch::default();
        let mut writer = BatchDbWriter::new(&mut batch);
        self.path_by_id.delete_uncached(&mut writer, IdKey::from(id))?;
        self.id_by_path.delete_uncached(&mut writer, path.clone())?;
        self.db.write(batch)?;
        self.path_by_id.cache_remove(&IdKey::from(id));
        self.id_by_path.cache_remove(&path);
        Ok(())
    }

    fn bulk_rewrite_prefix(&mut self, old_prefix: &NodePath, new_prefix: &NodePath) -> StoreResult<usize> {
        let _scope = self.rewrite_scope.write();
        let mut batch = WriteBatch::default();
        let rows = self.stage_rewrite(BatchDbWriter::new(&mut batch), old_prefix, new_prefix)?;
        self.db.write(batch)?;
        // Rewritten rows must not be served from stale cache entries;
        // repopulation happens lazily on read.
        self.path_by_id.clear_cache();
        self.id_by_path.clear_cache();
        debug!("rewrote {rows} paths from prefix {old_prefix} to {new_prefix}");
        Ok(rows)
    }
}

/// An in-memory hierarchy store, mainly for tests.
#[derive(Default)]
pub struct MemoryHierarchyStore {
    path_by_id: HashMap<NodeId, NodePath>,
    id_by_path: BTreeMap<NodePath, NodeId>,
}

impl MemoryHierarchyStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn subtree_rows(&self, prefix: &NodePath) -> Vec<(NodePath, NodeId)> {
        self.id_by_path
            .range(prefix.clone()..)
            .take_while(|(path, _)| path.as_bytes().starts_with(prefix.as_bytes()))
            .map(|(path, id)| (path.clone(), *id))
            .collect()
    }
}

impl HierarchyStoreReader for MemoryHierarchyStore {
    fn get_path(&self, id: NodeId) -> StoreResult<NodePath> {
        self.path_by_id
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::KeyNotFound(DbKey::new(StorePrefixes::PathById.as_ref(), IdKey::from(id))))
    }

    fn has(&self, id: NodeId) -> StoreResult<bool> {
        Ok(self.path_by_id.contains_key(&id))
    }

    fn descendants<'a>(&'a self, prefix: &NodePath) -> StoreResult<Box<dyn Iterator<Item = StoreResult<(NodeId, NodePath)>> + 'a>> {
        Ok(Box::new(self.subtree_rows(prefix).into_iter().map(|(path, id)| Ok((id, path)))))
    }

    fn count(&self) -> StoreResult<usize> {
        Ok(self.path_by_id.len())
    }
}

impl HierarchyStore for MemoryHierarchyStore {
    fn insert(&mut self, id: NodeId, path: NodePath) -> StoreResult<()> {
        if self.path_by_id.contains_key(&id) {
            return Err(StoreError::KeyAlreadyExists(id.to_string()));
        }
        self.id_by_path.insert(path.clone(), id);
        self.path_by_id.insert(id, path);
        Ok(())
    }

    fn delete(&mut self, id: NodeId) -> StoreResult<()> {
        let path = self.get_path(id)?;
        self.id_by_path.remove(&path);
        self.path_by_id.remove(&id);
        Ok(())
    }

    fn bulk_rewrite_prefix(&mut self, old_prefix: &NodePath, new_prefix: &NodePath) -> StoreResult<usize> {
        // Collect first, then apply: the maps are never observed half-rewritten.
        let rows = self.subtree_rows(old_prefix);
        for (old_path, id) in &rows {
            let new_path = spliced(old_path, old_prefix.len(), new_prefix);
            self.id_by_path.remove(old_path);
            self.id_by_path.insert(new_path.clone(), *id);
            self.path_by_id.insert(*id, new_path);
        }
        Ok(rows.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_temp_db;
    use crate::errors::StoreResultExtensions;
    use crate::writer::FailingDbWriter;
    use itertools::Itertools;
    use treepath_encoding::{Alphabet, Collation, PathCodec, SegmentCoding};

    fn codec() -> PathCodec {
        PathCodec::new(Alphabet::with_base(36, Collation::Binary).unwrap(), SegmentCoding::FixedWidth { width: 4 }).unwrap()
    }

    /// 1 ── 2 ── 4
    ///  │    └── 5
    ///  └── 3          (plus root 9 outside the moved subtree)
    fn populate(store: &mut dyn HierarchyStore) -> PathCodec {
        let codec = codec();
        let edges: [(u64, Option<u64>); 6] = [(1, None), (2, Some(1)), (3, Some(1)), (4, Some(2)), (5, Some(2)), (9, None)];
        for (id, parent) in edges {
            let parent_path = match parent {
                Some(parent_id) => store.get_path(NodeId::new(parent_id)).unwrap(),
                None => NodePath::empty(),
            };
            let path = codec.build(&parent_path, NodeId::new(id)).unwrap();
            store.insert(NodeId::new(id), path).unwrap();
        }
        codec
    }

    fn stores() -> Vec<(Box<dyn HierarchyStore>, Option<crate::db::TempDbLifetime>)> {
        let (lifetime, db) = create_temp_db();
        vec![
            (Box::new(MemoryHierarchyStore::new()), None),
            (Box::new(DbHierarchyStore::new(db, 4)), Some(lifetime)),
        ]
    }

    #[test]
    fn insert_and_lookup() {
        for (mut store, _lifetime) in stores() {
            let codec = populate(store.as_mut());
            let expected = codec.build(&codec.segment(NodeId::new(1)).unwrap(), NodeId::new(2)).unwrap();
            assert_eq!(store.get_path(NodeId::new(2)).unwrap(), expected);
            assert!(store.has(NodeId::new(5)).unwrap());
            assert!(!store.has(NodeId::new(77)).unwrap());
            assert_eq!(store.count().unwrap(), 6);
        }
    }

    #[test]
    fn duplicate_insert_is_rejected() {
        for (mut store, _lifetime) in stores() {
            populate(store.as_mut());
            let err = store.insert(NodeId::new(3), NodePath::from_bytes(b"0003")).unwrap_err();
            assert!(matches!(err, StoreError::KeyAlreadyExists(_)));
        }
    }

    #[test]
    fn descendants_come_back_in_pre_order() {
        for (mut store, _lifetime) in stores() {
            let _codec = populate(store.as_mut());
            let subtree_root = store.get_path(NodeId::new(2)).unwrap();
            let ids: Vec<u64> = store
                .descendants(&subtree_root)
                .unwrap()
                .map_ok(|(id, _)| id.value())
                .collect::<StoreResult<Vec<_>>>()
                .unwrap();
            assert_eq!(ids, vec![2, 4, 5]);

            let all: Vec<u64> =
                store.descendants(&NodePath::empty()).unwrap().map_ok(|(id, _)| id.value()).collect::<StoreResult<Vec<_>>>().unwrap();
            assert_eq!(all, vec![1, 2, 4, 5, 3, 9]);
        }
    }

    #[test]
    fn bulk_rewrite_moves_the_subtree_and_nothing_else() {
        for (mut store, _lifetime) in stores() {
            let codec = populate(store.as_mut());
            let before_3 = store.get_path(NodeId::new(3)).unwrap();
            let before_9 = store.get_path(NodeId::new(9)).unwrap();

            // move subtree rooted at 2 under 9
            let old_prefix = store.get_path(NodeId::new(2)).unwrap();
            let new_prefix = codec.build(&store.get_path(NodeId::new(9)).unwrap(), NodeId::new(2)).unwrap();
            let rows = store.bulk_rewrite_prefix(&old_prefix, &new_prefix).unwrap();
            assert_eq!(rows, 3);

            for id in [2u64, 4, 5] {
                let path = store.get_path(NodeId::new(id)).unwrap();
                assert!(path.as_bytes().starts_with(new_prefix.as_bytes()), "node {id} was not rewritten");
            }
            assert_eq!(codec.decode(&store.get_path(NodeId::new(4)).unwrap()).unwrap(), vec![
                NodeId::new(9),
                NodeId::new(2),
                NodeId::new(4)
            ]);
            // rows outside the subtree are untouched
            assert_eq!(store.get_path(NodeId::new(3)).unwrap(), before_3);
            assert_eq!(store.get_path(NodeId::new(9)).unwrap(), before_9);
            assert_eq!(store.count().unwrap(), 6);
        }
    }

    #[test]
    fn rewrite_of_an_absent_prefix_touches_nothing() {
        for (mut store, _lifetime) in stores() {
            let codec = populate(store.as_mut());
            let absent = codec.segment(NodeId::new(777)).unwrap();
            let target = codec.segment(NodeId::new(778)).unwrap();
            assert_eq!(store.bulk_rewrite_prefix(&absent, &target).unwrap(), 0);
            assert_eq!(store.count().unwrap(), 6);
        }
    }

    #[test]
    fn failed_rewrite_leaves_the_tree_untouched() {
        let (_lifetime, db) = create_temp_db();
        let mut store = DbHierarchyStore::new(db, 4);
        let codec = populate(&mut store);

        let snapshot: Vec<(u64, NodePath)> =
            [1u64, 2, 3, 4, 5, 9].iter().map(|&id| (id, store.get_path(NodeId::new(id)).unwrap())).collect();

        let old_prefix = store.get_path(NodeId::new(2)).unwrap();
        let new_prefix = codec.build(&store.get_path(NodeId::new(9)).unwrap(), NodeId::new(2)).unwrap();

        // fail mid-way through staging: the batch is never committed
        let mut batch = WriteBatch::default();
        let result = store.stage_rewrite(FailingDbWriter::new(&mut batch, 4), &old_prefix, &new_prefix);
        assert!(matches!(result, Err(StoreError::DataInconsistency(_))));
        drop(batch);

        for (id, path) in snapshot {
            assert_eq!(store.get_path(NodeId::new(id)).unwrap(), path, "node {id} changed after an aborted rewrite");
        }
    }

    #[test]
    fn delete_removes_both_directions() {
        for (mut store, _lifetime) in stores() {
            populate(store.as_mut());
            let path = store.get_path(NodeId::new(3)).unwrap();
            store.delete(NodeId::new(3)).unwrap();
            assert!(!store.has(NodeId::new(3)).unwrap());
            assert_eq!(store.get_path(NodeId::new(3)).optional().unwrap(), None);
            let remaining: Vec<u64> =
                store.descendants(&path).unwrap().map_ok(|(id, _)| id.value()).collect::<StoreResult<Vec<_>>>().unwrap();
            assert!(remaining.is_empty());
            assert_eq!(store.count().unwrap(), 5);
        }
    }
}
