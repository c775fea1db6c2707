//! Tree operations stitching the pure codec to a hierarchy store.

use crate::errors::{StoreError, StoreResult};
use crate::hierarchy::{HierarchyStore, HierarchyStoreReader};
use log::trace;
use treepath_encoding::{NodeId, NodePath, PathCodec};

/// Computes and persists the path of a new node. `parent: None` creates a
/// root; otherwise the parent must already be stored.
pub fn create_node(store: &mut dyn HierarchyStore, codec: &PathCodec, id: NodeId, parent: Option<NodeId>) -> StoreResult<NodePath> {
    let parent_path = match parent {
        Some(parent_id) => store.get_path(parent_id)?,
        None => NodePath::empty(),
    };
    let path = codec.build(&parent_path, id)?;
    store.insert(id, path.clone())?;
    trace!("created node {id} at {path}");
    Ok(path)
}

/// Re-parents the subtree rooted at `id` under `new_parent` (`None` makes
/// it a root), rewriting every path in the subtree as one atomic unit.
/// Returns the number of rows rewritten, `id`'s own row included.
pub fn move_subtree(store: &mut dyn HierarchyStore, codec: &PathCodec, id: NodeId, new_parent: Option<NodeId>) -> StoreResult<usize> {
    let old_prefix = store.get_path(id)?;
    let new_parent_path = match new_parent {
        Some(parent_id) => store.get_path(parent_id)?,
        None => NodePath::empty(),
    };
    if new_parent_path == old_prefix || codec.is_descendant_of(&new_parent_path, &old_prefix)? {
        return Err(StoreError::DataInconsistency(format!("cannot move node {id} under its own subtree")));
    }
    let new_prefix = codec.build(&new_parent_path, id)?;
    if new_prefix == old_prefix {
        return Ok(0);
    }
    let occupied = store.descendants(&new_prefix)?.next().is_some();
    if occupied {
        return Err(StoreError::DataInconsistency(format!("target path {new_prefix} is already occupied")));
    }
    trace!("moving subtree of node {id}: {old_prefix} -> {new_prefix}");
    store.bulk_rewrite_prefix(&old_prefix, &new_prefix)
}

/// Direct children of `id`: stored descendants exactly one level deeper.
pub fn children(store: &dyn HierarchyStoreReader, codec: &PathCodec, id: NodeId) -> StoreResult<Vec<(NodeId, NodePath)>> {
    let path = store.get_path(id)?;
    let child_depth = codec.depth(&path)? + 1;
    let mut out = Vec::new();
    for item in store.descendants(&path)? {
        let (child_id, child_path) = item?;
        if codec.depth(&child_path)? == child_depth {
            out.push((child_id, child_path));
        }
    }
    Ok(out)
}

/// The root-to-node id chain of a stored node, the node itself included.
pub fn ancestor_ids(store: &dyn HierarchyStoreReader, codec: &PathCodec, id: NodeId) -> StoreResult<Vec<NodeId>> {
    Ok(codec.decode(&store.get_path(id)?)?)
}
