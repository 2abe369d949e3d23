use std::collections::{HashMap, HashSet};

use smallvec::SmallVec;

use crate::foundation::core::validate_frame_name;
use crate::foundation::error::{TfError, TfResult};
use crate::foundation::ids::{EdgeId, FrameId, StreamHandle};
use crate::graph::frames::FrameTable;

/// Payload of a declared edge.
#[derive(Clone, Debug)]
pub enum EdgeKind<P> {
    /// Constant transform.
    Static(P),
    /// Time-varying transform fed by samples.
    ///
    /// `stream` stays `None` until the first sample arrives; until then the edge is dormant
    /// and chain search does not traverse it.
    Dynamic {
        /// Producer that publishes samples for this edge.
        producer: String,
        /// Sample stream, allocated on first sample.
        stream: Option<StreamHandle>,
    },
}

/// One declared edge. Its inverse is never stored; it is a view produced at query time.
#[derive(Clone, Debug)]
pub struct TransformEdge<P> {
    pub(crate) from: FrameId,
    pub(crate) to: FrameId,
    pub(crate) kind: EdgeKind<P>,
}

impl<P> TransformEdge<P> {
    /// Payload of the edge.
    pub fn kind(&self) -> &EdgeKind<P> {
        &self.kind
    }

    /// Static edges and dynamic edges that already received a sample.
    pub fn is_traversable(&self) -> bool {
        match &self.kind {
            EdgeKind::Static(_) => true,
            EdgeKind::Dynamic { stream, .. } => stream.is_some(),
        }
    }
}

/// Rejects unknown sample producers.
pub trait ProducerValidator {
    /// Fails with [`TfError::InvalidProducer`] when `producer` may not publish transforms.
    fn check(&self, producer: &str) -> TfResult<()>;
}

/// Validator that accepts every producer.
#[derive(Clone, Copy, Debug, Default)]
pub struct AcceptAnyProducer;

impl ProducerValidator for AcceptAnyProducer {
    fn check(&self, _producer: &str) -> TfResult<()> {
        Ok(())
    }
}

/// Validator that accepts only the listed producers.
#[derive(Clone, Debug, Default)]
pub struct ProducerAllowList {
    allowed: HashSet<String>,
}

impl ProducerAllowList {
    /// Build from an iterator of producer ids.
    pub fn new<I, S>(producers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allowed: producers.into_iter().map(Into::into).collect(),
        }
    }
}

impl ProducerValidator for ProducerAllowList {
    fn check(&self, producer: &str) -> TfResult<()> {
        if self.allowed.contains(producer) {
            Ok(())
        } else {
            Err(TfError::invalid_producer(producer))
        }
    }
}

/// Borrowed view of an edge as seen from one of its endpoints.
pub struct EdgeRef<'g, P> {
    graph: &'g FrameGraph<P>,
    id: EdgeId,
    inverted: bool,
}

impl<P> Clone for EdgeRef<'_, P> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<P> Copy for EdgeRef<'_, P> {}

impl<'g, P> EdgeRef<'g, P> {
    /// Underlying declared edge.
    pub fn edge(&self) -> &'g TransformEdge<P> {
        self.graph.edge(self.id)
    }

    /// Whether walking this edge from the queried frame uses it against its declaration.
    pub fn inverted(&self) -> bool {
        self.inverted
    }

    /// Frame the traversal starts from.
    pub fn source(&self) -> &'g str {
        let e = self.edge();
        self.graph
            .frames
            .name(if self.inverted { e.to } else { e.from })
    }

    /// Frame the traversal arrives at.
    pub fn target(&self) -> &'g str {
        let e = self.edge();
        self.graph
            .frames
            .name(if self.inverted { e.from } else { e.to })
    }
}

/// Declared frames and the directed edges between them.
///
/// At most one edge exists per unordered frame pair; the other direction is its inverse.
#[derive(Clone, Debug)]
pub struct FrameGraph<P> {
    frames: FrameTable,
    edges: Vec<TransformEdge<P>>,
    // Per-frame incident edges, in declaration order.
    incident: Vec<SmallVec<[EdgeId; 4]>>,
    pairs: HashMap<(FrameId, FrameId), EdgeId>,
    traversable: usize,
}

impl<P> Default for FrameGraph<P> {
    fn default() -> Self {
        Self {
            frames: FrameTable::new(),
            edges: Vec::new(),
            incident: Vec::new(),
            pairs: HashMap::new(),
            traversable: 0,
        }
    }
}

fn pair_key(a: FrameId, b: FrameId) -> (FrameId, FrameId) {
    if a <= b { (a, b) } else { (b, a) }
}

impl<P> FrameGraph<P> {
    /// Empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a frame. Declaring the same name twice is a no-op.
    pub fn declare_frame(&mut self, name: &str) -> TfResult<()> {
        validate_frame_name(name)?;
        let (_, added) = self.frames.intern(name);
        if added {
            self.incident.push(SmallVec::new());
        }
        Ok(())
    }

    /// Whether `name` was declared.
    pub fn has_frame(&self, name: &str) -> bool {
        self.frames.id(name).is_some()
    }

    /// Declared frame names in declaration order.
    pub fn frames(&self) -> impl Iterator<Item = &str> {
        self.frames.names()
    }

    /// Number of declared frames.
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Number of declared edges, dormant ones included.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Number of edges chain search may walk.
    pub fn traversable_edge_count(&self) -> usize {
        self.traversable
    }

    /// Declare a constant transform `from -> to`.
    pub fn declare_static(&mut self, from: &str, to: &str, value: P) -> TfResult<()> {
        let (a, b) = self.check_new_pair(from, to)?;
        self.push_edge(TransformEdge {
            from: a,
            to: b,
            kind: EdgeKind::Static(value),
        });
        Ok(())
    }

    /// Declare a sample-fed transform `from -> to` published by `producer`.
    ///
    /// The edge stays dormant until its first sample attaches a stream.
    pub fn declare_dynamic(
        &mut self,
        from: &str,
        to: &str,
        producer: &str,
        validator: &dyn ProducerValidator,
    ) -> TfResult<()> {
        let (a, b) = self.check_new_pair(from, to)?;
        validator.check(producer)?;
        self.push_edge(TransformEdge {
            from: a,
            to: b,
            kind: EdgeKind::Dynamic {
                producer: producer.to_owned(),
                stream: None,
            },
        });
        Ok(())
    }

    /// Every declared edge incident to `frame`, paired with whether walking it from `frame`
    /// inverts it.
    pub fn edges_touching(&self, frame: &str) -> TfResult<impl Iterator<Item = EdgeRef<'_, P>>> {
        let id = self.frame_id(frame)?;
        Ok(self.incident(id).map(move |(id, inverted)| EdgeRef {
            graph: self,
            id,
            inverted,
        }))
    }

    /// Drop every frame and edge.
    pub fn clear(&mut self) {
        self.frames.clear();
        self.edges.clear();
        self.incident.clear();
        self.pairs.clear();
        self.traversable = 0;
    }

    pub(crate) fn frame_id(&self, name: &str) -> TfResult<FrameId> {
        validate_frame_name(name)?;
        self.frames
            .id(name)
            .ok_or_else(|| TfError::unknown_frame(name))
    }

    pub(crate) fn frame_name(&self, id: FrameId) -> &str {
        self.frames.name(id)
    }

    pub(crate) fn edge(&self, id: EdgeId) -> &TransformEdge<P> {
        &self.edges[id.index()]
    }

    pub(crate) fn incident(&self, frame: FrameId) -> impl Iterator<Item = (EdgeId, bool)> + '_ {
        self.incident[frame.index()]
            .iter()
            .map(move |&e| (e, self.edges[e.index()].to == frame))
    }

    /// Edge covering `{from, to}` and whether `from -> to` runs against its declaration.
    pub(crate) fn edge_between(&self, from: FrameId, to: FrameId) -> Option<(EdgeId, bool)> {
        let id = *self.pairs.get(&pair_key(from, to))?;
        Some((id, self.edges[id.index()].from != from))
    }

    /// Attach a sample stream to a dormant dynamic edge. Returns `false` when the edge is
    /// static or already live.
    pub(crate) fn activate_stream(&mut self, id: EdgeId, handle: StreamHandle) -> bool {
        let EdgeKind::Dynamic { stream, .. } = &mut self.edges[id.index()].kind else {
            return false;
        };
        if stream.is_some() {
            return false;
        }
        *stream = Some(handle);
        self.traversable += 1;
        true
    }

    fn check_new_pair(&self, from: &str, to: &str) -> TfResult<(FrameId, FrameId)> {
        let a = self.frame_id(from)?;
        let b = self.frame_id(to)?;
        if a == b {
            return Err(TfError::SelfTransform(from.to_owned()));
        }
        if self.pairs.contains_key(&pair_key(a, b)) {
            return Err(TfError::duplicate(from, to));
        }
        Ok((a, b))
    }

    fn push_edge(&mut self, edge: TransformEdge<P>) {
        let id = EdgeId(u32::try_from(self.edges.len()).unwrap_or(u32::MAX));
        self.pairs.insert(pair_key(edge.from, edge.to), id);
        self.incident[edge.from.index()].push(id);
        self.incident[edge.to.index()].push(id);
        if edge.is_traversable() {
            self.traversable += 1;
        }
        self.edges.push(edge);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/graph/frame_graph.rs"]
mod tests;
