use smallvec::SmallVec;

use crate::chain::link::{ChainLink, LinkSource};
use crate::chain::transform_chain::TransformChain;
use crate::foundation::error::{TfError, TfResult};
use crate::foundation::ids::{EdgeId, FrameId};
use crate::graph::frame_graph::{EdgeKind, FrameGraph};

/// Default bound on chain length.
pub const DEFAULT_MAX_SEARCH_DEPTH: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct NodeIdx(u32);

#[derive(Debug)]
struct SearchNode {
    frame: FrameId,
    parent: Option<NodeIdx>,
    via: Option<(EdgeId, bool)>,
    // Undirected edges on the path from the root, this node's edge included.
    visited: SmallVec<[EdgeId; 8]>,
}

/// Breadth-first shortest-chain search over a [`FrameGraph`].
///
/// Among several chains of the same minimal length, the first one discovered wins. Discovery
/// order follows edge declaration order, so results are stable for a fixed sequence of
/// declarations but depend on that sequence.
#[derive(Clone, Copy, Debug)]
pub struct ChainResolver {
    max_depth: usize,
}

impl Default for ChainResolver {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_SEARCH_DEPTH)
    }
}

impl ChainResolver {
    /// Resolver that gives up on chains longer than `max_depth` links.
    pub fn new(max_depth: usize) -> Self {
        Self { max_depth }
    }

    /// Configured depth bound.
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Shortest chain from `from` to `to`.
    ///
    /// Fails with [`TfError::ChainNotFound`] when every simple path was explored, and with
    /// [`TfError::MaxDepthExceeded`] when the configured depth stopped the search first.
    #[tracing::instrument(level = "debug", skip(self, graph))]
    pub fn resolve<P: Clone>(
        &self,
        graph: &FrameGraph<P>,
        from: &str,
        to: &str,
    ) -> TfResult<TransformChain<P>> {
        let from_id = graph.frame_id(from)?;
        let to_id = graph.frame_id(to)?;
        if from_id == to_id {
            return Ok(TransformChain::identity(from));
        }

        // A simple path never has more links than there are edges to walk.
        let edge_count = graph.traversable_edge_count();
        let bound = self.max_depth.min(edge_count);

        let mut arena = vec![SearchNode {
            frame: from_id,
            parent: None,
            via: None,
            visited: SmallVec::new(),
        }];
        let mut frontier = vec![NodeIdx(0)];

        for depth in 1..=bound {
            let mut next = Vec::new();
            for &node in &frontier {
                let frame = arena[node.0 as usize].frame;
                for (edge_id, inverted) in graph.incident(frame) {
                    let edge = graph.edge(edge_id);
                    if !edge.is_traversable() || arena[node.0 as usize].visited.contains(&edge_id)
                    {
                        continue;
                    }

                    let child_frame = if inverted { edge.from } else { edge.to };
                    let mut visited = arena[node.0 as usize].visited.clone();
                    visited.push(edge_id);
                    let child = NodeIdx(u32::try_from(arena.len()).unwrap_or(u32::MAX));
                    arena.push(SearchNode {
                        frame: child_frame,
                        parent: Some(node),
                        via: Some((edge_id, inverted)),
                        visited,
                    });

                    if child_frame == to_id {
                        let chain = materialize(graph, &arena, child, from, to)?;
                        tracing::debug!(
                            links = depth,
                            expanded = arena.len(),
                            chain = %chain,
                            "found transform chain"
                        );
                        return Ok(chain);
                    }
                    next.push(child);
                }
            }

            if next.is_empty() {
                return Err(TfError::chain_not_found(from, to));
            }
            frontier = next;
        }

        if self.max_depth < edge_count {
            Err(TfError::MaxDepthExceeded {
                from: from.to_owned(),
                to: to.to_owned(),
                depth: self.max_depth,
            })
        } else {
            Err(TfError::chain_not_found(from, to))
        }
    }
}

fn materialize<P: Clone>(
    graph: &FrameGraph<P>,
    arena: &[SearchNode],
    goal: NodeIdx,
    from: &str,
    to: &str,
) -> TfResult<TransformChain<P>> {
    let mut links = Vec::new();
    let mut cur = Some(goal);
    while let Some(idx) = cur {
        let node = &arena[idx.0 as usize];
        if let Some((edge_id, inverted)) = node.via {
            links.push(link_for(graph, edge_id, inverted)?);
        }
        cur = node.parent;
    }
    links.reverse();
    Ok(TransformChain::from_search(
        from.to_owned(),
        to.to_owned(),
        links,
    ))
}

fn link_for<P: Clone>(
    graph: &FrameGraph<P>,
    edge_id: EdgeId,
    inverted: bool,
) -> TfResult<ChainLink<P>> {
    let edge = graph.edge(edge_id);
    let source = match edge.kind() {
        EdgeKind::Static(v) => LinkSource::Static(v.clone()),
        EdgeKind::Dynamic {
            producer,
            stream: Some(stream),
        } => LinkSource::Dynamic {
            producer: producer.clone(),
            stream: *stream,
        },
        EdgeKind::Dynamic { stream: None, .. } => {
            return Err(TfError::broken_chain(format!(
                "dormant edge {} -> {} in search tree",
                graph.frame_name(edge.from),
                graph.frame_name(edge.to)
            )));
        }
    };
    Ok(ChainLink {
        from: graph.frame_name(edge.from).to_owned(),
        to: graph.frame_name(edge.to).to_owned(),
        inverted,
        source,
    })
}

#[cfg(test)]
#[path = "../../tests/unit/resolve/search.rs"]
mod tests;
