//! Network validation logic.

use std::collections::HashSet;

use petgraph::algo::toposort;
use petgraph::graph::DiGraph;
use tp_core::ReachIdx;

use crate::error::{NetworkError, NetworkResult};
use crate::graph::Reach;

/// Each reach id may appear once in the edge list.
pub(crate) fn validate_unique(reaches: &[Reach]) -> NetworkResult<()> {
    let mut seen = HashSet::with_capacity(reaches.len());
    for reach in reaches {
        if !seen.insert(reach.id) {
            return Err(NetworkError::DuplicateReach { reach: reach.id });
        }
    }
    Ok(())
}

/// The derived links must form a DAG.
pub(crate) fn validate_acyclic(reaches: &[Reach], upstream: &[Vec<ReachIdx>]) -> NetworkResult<()> {
    let mut graph: DiGraph<ReachIdx, ()> = DiGraph::with_capacity(reaches.len(), reaches.len());
    let nodes: Vec<_> = reaches.iter().map(|r| graph.add_node(r.idx)).collect();
    for (r, ups) in upstream.iter().enumerate() {
        for u in ups {
            graph.add_edge(nodes[u.as_usize()], nodes[r], ());
        }
    }

    toposort(&graph, None).map(|_| ()).map_err(|cycle| {
        let idx = graph[cycle.node_id()];
        NetworkError::Cycle {
            reach: reaches[idx.as_usize()].id,
        }
    })
}

/// Every upstream neighbour must have a strictly smaller sequence number.
pub(crate) fn validate_sequence(reaches: &[Reach], upstream: &[Vec<ReachIdx>]) -> NetworkResult<()> {
    for (r, ups) in upstream.iter().enumerate() {
        let down = &reaches[r];
        for u in ups {
            let up = &reaches[u.as_usize()];
            if up.hydseq >= down.hydseq {
                return Err(NetworkError::SequenceViolation {
                    upstream: up.id,
                    upstream_hydseq: up.hydseq,
                    downstream: down.id,
                    downstream_hydseq: down.hydseq,
                });
            }
        }
    }
    Ok(())
}

/// The flattened adjacency must reproduce the derived links exactly.
pub(crate) fn validate_adjacency(
    reaches: &[Reach],
    links: &[Vec<ReachIdx>],
    offsets: &[usize],
    flat: &[ReachIdx],
) -> NetworkResult<()> {
    if offsets.len() != reaches.len() + 1 {
        return Err(NetworkError::InconsistentAdjacency {
            reach: reaches.first().map(|r| r.id).unwrap_or_default(),
        });
    }
    for (i, reach) in reaches.iter().enumerate() {
        let (start, end) = (offsets[i], offsets[i + 1]);
        if start > end || end > flat.len() || flat[start..end] != links[i][..] {
            return Err(NetworkError::InconsistentAdjacency { reach: reach.id });
        }
    }
    Ok(())
}
