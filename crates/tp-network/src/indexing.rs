//! Stable indexing between external reach ids and contiguous indices.

use std::collections::HashMap;

use tp_core::{ReachId, ReachIdx};

use crate::error::{NetworkError, NetworkResult};

/// Index map providing O(1) bidirectional lookup between `ReachId` and
/// `ReachIdx`. Used by the router and the result assembly to map input
/// tables onto contiguous per-reach vectors.
#[derive(Debug, Clone, Default)]
pub struct IndexMap {
    /// Contiguous list of reach ids (index -> ReachId).
    reach_ids: Vec<ReachId>,

    /// Reverse lookup: ReachId -> index.
    id_to_idx: HashMap<ReachId, ReachIdx>,
}

impl IndexMap {
    pub(crate) fn from_ids(reach_ids: Vec<ReachId>) -> Self {
        let id_to_idx = reach_ids
            .iter()
            .enumerate()
            .map(|(i, &id)| (id, ReachIdx::from_index(i as u32)))
            .collect();
        Self {
            reach_ids,
            id_to_idx,
        }
    }

    /// Number of reaches in the index.
    pub fn len(&self) -> usize {
        self.reach_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reach_ids.is_empty()
    }

    pub fn contains(&self, id: ReachId) -> bool {
        self.id_to_idx.contains_key(&id)
    }

    /// Get the contiguous index for a reach id.
    pub fn reach_idx(&self, id: ReachId) -> NetworkResult<ReachIdx> {
        self.id_to_idx
            .get(&id)
            .copied()
            .ok_or(NetworkError::ReachNotFound { reach: id })
    }

    /// Get the reach id for a contiguous index.
    pub fn reach_id(&self, idx: ReachIdx) -> Option<ReachId> {
        self.reach_ids.get(idx.as_usize()).copied()
    }

    /// All reach ids in index order.
    pub fn reach_ids(&self) -> &[ReachId] {
        &self.reach_ids
    }
}
