//! Core network data structures.

use tp_core::{HydSeq, HydroNodeId, ReachId, ReachIdx};

use crate::error::NetworkResult;
use crate::indexing::IndexMap;

/// A stream segment in the routing network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reach {
    pub idx: ReachIdx,
    pub id: ReachId,
    pub hydseq: HydSeq,
    pub from_node: HydroNodeId,
    pub to_node: HydroNodeId,
}

/// Validated upstream-to-downstream processing order.
///
/// Only the builder can produce one, after checking that every upstream
/// neighbour precedes its downstream target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessingOrder(Vec<ReachIdx>);

impl ProcessingOrder {
    pub(crate) fn new(order: Vec<ReachIdx>) -> Self {
        Self(order)
    }

    pub fn as_slice(&self) -> &[ReachIdx] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = ReachIdx> + '_ {
        self.0.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// The network: a validated, immutable collection of reaches.
///
/// Stores:
/// - All reaches in a vector (indexed by `ReachIdx`).
/// - Compact adjacency for upstream and downstream neighbours.
/// - The validated processing order.
#[derive(Debug, Clone)]
pub struct ReachNetwork {
    pub(crate) reaches: Vec<Reach>,

    /// Reach i's upstream neighbours are upstream[upstream_offsets[i]..upstream_offsets[i+1]].
    pub(crate) upstream_offsets: Vec<usize>,
    pub(crate) upstream: Vec<ReachIdx>,

    pub(crate) downstream_offsets: Vec<usize>,
    pub(crate) downstream: Vec<ReachIdx>,

    pub(crate) order: ProcessingOrder,
    pub(crate) index: IndexMap,
}

impl ReachNetwork {
    /// Return all reaches in index order.
    pub fn reaches(&self) -> &[Reach] {
        &self.reaches
    }

    pub fn len(&self) -> usize {
        self.reaches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reaches.is_empty()
    }

    /// Get a reach by index (returns None if out of bounds).
    pub fn reach(&self, idx: ReachIdx) -> Option<&Reach> {
        self.reaches.get(idx.as_usize())
    }

    /// Direct upstream neighbours of a reach.
    pub fn upstream(&self, idx: ReachIdx) -> &[ReachIdx] {
        slice_of(&self.upstream_offsets, &self.upstream, idx)
    }

    /// Direct downstream neighbours of a reach (empty for outlets).
    pub fn downstream(&self, idx: ReachIdx) -> &[ReachIdx] {
        slice_of(&self.downstream_offsets, &self.downstream, idx)
    }

    /// Reaches in validated upstream-to-downstream order.
    pub fn order(&self) -> &ProcessingOrder {
        &self.order
    }

    pub fn index(&self) -> &IndexMap {
        &self.index
    }

    /// Look up a reach index by external id.
    pub fn idx_of(&self, id: ReachId) -> NetworkResult<ReachIdx> {
        self.index.reach_idx(id)
    }

    pub fn contains(&self, id: ReachId) -> bool {
        self.index.contains(id)
    }

    /// Reaches with no downstream neighbour (network outlets, e.g. the lake).
    pub fn outlets(&self) -> Vec<ReachIdx> {
        self.reaches
            .iter()
            .map(|r| r.idx)
            .filter(|&idx| self.downstream(idx).is_empty())
            .collect()
    }

    /// Reaches with no upstream neighbour.
    pub fn headwaters(&self) -> Vec<ReachIdx> {
        self.reaches
            .iter()
            .map(|r| r.idx)
            .filter(|&idx| self.upstream(idx).is_empty())
            .collect()
    }
}

fn slice_of<'a>(offsets: &[usize], flat: &'a [ReachIdx], idx: ReachIdx) -> &'a [ReachIdx] {
    let i = idx.as_usize();
    if i + 1 >= offsets.len() {
        return &[];
    }
    &flat[offsets[i]..offsets[i + 1]]
}
