//! Network builder: derives adjacency from a raw edge list.

use std::collections::HashMap;

use tp_core::{HydSeq, HydroNodeId, ReachId, ReachIdx};

use crate::error::NetworkResult;
use crate::graph::{ProcessingOrder, Reach, ReachNetwork};
use crate::indexing::IndexMap;
use crate::validate;

/// One row of the network edge table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReachEdge {
    pub reach: ReachId,
    pub hydseq: HydSeq,
    pub from_node: HydroNodeId,
    pub to_node: HydroNodeId,
}

/// Builder for a reach network.
///
/// Reach `u` is upstream of reach `r` when `u.to_node == r.from_node`.
/// Call `build()` to validate the edge list against the sequence numbers
/// and freeze it into an immutable `ReachNetwork`.
#[derive(Debug, Default)]
pub struct NetworkBuilder {
    reaches: Vec<Reach>,
}

impl NetworkBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build directly from edge rows.
    pub fn from_edges<I>(edges: I) -> Self
    where
        I: IntoIterator<Item = ReachEdge>,
    {
        let mut builder = Self::new();
        for edge in edges {
            builder.add_edge(edge);
        }
        builder
    }

    /// Add a reach and return its provisional index.
    pub fn add_reach(
        &mut self,
        id: impl Into<ReachId>,
        hydseq: HydSeq,
        from_node: HydroNodeId,
        to_node: HydroNodeId,
    ) -> ReachIdx {
        self.add_edge(ReachEdge {
            reach: id.into(),
            hydseq,
            from_node,
            to_node,
        })
    }

    pub fn add_edge(&mut self, edge: ReachEdge) -> ReachIdx {
        let idx = ReachIdx::from_index(self.reaches.len() as u32);
        self.reaches.push(Reach {
            idx,
            id: edge.reach,
            hydseq: edge.hydseq,
            from_node: edge.from_node,
            to_node: edge.to_node,
        });
        idx
    }

    pub fn len(&self) -> usize {
        self.reaches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reaches.is_empty()
    }

    /// Validate and freeze the network.
    ///
    /// Fails with `DuplicateReach`, `Cycle` or `SequenceViolation` when the
    /// edge list cannot yield a trustworthy processing order.
    pub fn build(self) -> NetworkResult<ReachNetwork> {
        let reaches = self.reaches;
        validate::validate_unique(&reaches)?;

        let upstream_links = Self::derive_upstream(&reaches);
        validate::validate_acyclic(&reaches, &upstream_links)?;
        validate::validate_sequence(&reaches, &upstream_links)?;

        let (upstream_offsets, upstream) = Self::build_adjacency(&upstream_links);
        let mut downstream_links = vec![Vec::new(); reaches.len()];
        for (r, ups) in upstream_links.iter().enumerate() {
            for u in ups {
                downstream_links[u.as_usize()].push(ReachIdx::from_index(r as u32));
            }
        }
        let (downstream_offsets, downstream) = Self::build_adjacency(&downstream_links);

        validate::validate_adjacency(&reaches, &upstream_links, &upstream_offsets, &upstream)?;

        let mut order: Vec<ReachIdx> = reaches.iter().map(|r| r.idx).collect();
        order.sort_by_key(|&idx| {
            let r = &reaches[idx.as_usize()];
            (r.hydseq, r.id)
        });

        let index = IndexMap::from_ids(reaches.iter().map(|r| r.id).collect());

        Ok(ReachNetwork {
            reaches,
            upstream_offsets,
            upstream,
            downstream_offsets,
            downstream,
            order: ProcessingOrder::new(order),
            index,
        })
    }

    /// For each reach, the reaches whose outlet node is its inlet node.
    fn derive_upstream(reaches: &[Reach]) -> Vec<Vec<ReachIdx>> {
        let mut by_to_node: HashMap<HydroNodeId, Vec<ReachIdx>> = HashMap::new();
        for reach in reaches {
            by_to_node.entry(reach.to_node).or_default().push(reach.idx);
        }

        reaches
            .iter()
            .map(|reach| {
                let mut ups = by_to_node.get(&reach.from_node).cloned().unwrap_or_default();
                ups.sort();
                ups
            })
            .collect()
    }

    /// Flatten per-reach neighbour lists into offsets plus a flat list.
    fn build_adjacency(links: &[Vec<ReachIdx>]) -> (Vec<usize>, Vec<ReachIdx>) {
        let mut offsets = Vec::with_capacity(links.len() + 1);
        let mut flat = Vec::new();
        offsets.push(0);
        for neighbours in links {
            flat.extend_from_slice(neighbours);
            offsets.push(flat.len());
        }
        (offsets, flat)
    }
}
