use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::Context;

use crate::chain::transform_chain::TransformChain;
use crate::foundation::core::{Affine, FramePair, Timestamp, validate_frame_name};
use crate::foundation::error::{TfError, TfResult, Unavailable};
use crate::foundation::ids::{EdgeId, StreamHandle};
use crate::graph::frame_graph::{AcceptAnyProducer, EdgeKind, FrameGraph, ProducerValidator};
use crate::resolve::search::{ChainResolver, DEFAULT_MAX_SEARCH_DEPTH};
use crate::samples::buffered::BufferedSampleStore;
use crate::samples::store::{SampleBufferOpts, SampleStore};
use crate::transform::{Lerp, Pose};

/// Producer id recorded for edges discovered through [`Transformer::push_sample`].
pub const ANONYMOUS_PRODUCER: &str = "anonymous";

/// Options controlling a [`Transformer`].
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct TransformerOpts {
    /// Longest chain (in links) the resolver will search for.
    pub max_search_depth: usize,
    /// Declare unknown frames on first sample instead of failing with `UnknownFrame`.
    pub implicit_frames: bool,
    /// Interpolate between bracketing samples in [`Transformer::lookup`].
    pub interpolate: bool,
    /// Buffering limits for the default sample store.
    pub samples: SampleBufferOpts,
}

impl Default for TransformerOpts {
    fn default() -> Self {
        Self {
            max_search_depth: DEFAULT_MAX_SEARCH_DEPTH,
            implicit_frames: false,
            interpolate: false,
            samples: SampleBufferOpts::default(),
        }
    }
}

impl TransformerOpts {
    /// Parse options from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> TfResult<Self> {
        Ok(serde_json::from_str(json).context("parse transformer options JSON")?)
    }

    /// Read options from a JSON stream.
    pub fn from_json_reader(reader: impl std::io::Read) -> TfResult<Self> {
        Ok(serde_json::from_reader(reader).context("read transformer options JSON")?)
    }
}

/// A composed transform for one consumer at one time.
#[derive(Clone, Debug, PartialEq)]
pub struct Transformation<P> {
    /// Consumer source frame.
    pub from: String,
    /// Consumer target frame.
    pub to: String,
    /// Query time.
    pub time: Timestamp,
    /// Composed chain value.
    pub transform: P,
}

/// What re-resolution did for one consumer.
#[derive(Debug)]
pub enum ConsumerUpdate {
    /// Consumer had no chain and now has one.
    Resolved,
    /// Consumer's chain was replaced by a freshly resolved one.
    Updated,
    /// Resolution failed; the previous chain is still cached.
    Retained(TfError),
    /// Resolution failed and the consumer still has no chain.
    Unresolved(TfError),
}

/// Outcome of re-resolving every registered consumer after the graph grew.
#[derive(Debug)]
pub struct ResolveReport {
    /// Edge whose appearance triggered the pass, in declared direction.
    pub trigger: FramePair,
    /// Per-consumer result, in consumer key order.
    pub updates: Vec<(FramePair, ConsumerUpdate)>,
}

impl ResolveReport {
    /// Consumers that went from no chain to a chain.
    pub fn newly_resolved(&self) -> impl Iterator<Item = &FramePair> {
        self.updates
            .iter()
            .filter(|(_, u)| matches!(u, ConsumerUpdate::Resolved))
            .map(|(k, _)| k)
    }

    /// Result for one consumer.
    pub fn update_for(&self, from: &str, to: &str) -> Option<&ConsumerUpdate> {
        self.updates
            .iter()
            .find(|(k, _)| k.from == from && k.to == to)
            .map(|(_, u)| u)
    }
}

/// Result of [`Transformer::push_sample`].
#[derive(Debug)]
pub enum PushOutcome {
    /// Sample appended to an existing stream.
    Buffered,
    /// First sample for the pair: a stream was allocated and consumers re-resolved.
    NewStream(ResolveReport),
}

/// Owns the frame graph, the sample store and the per-consumer chain cache.
///
/// Single writer: sample ingestion and declarations take `&mut self`. Chains are handed out
/// as `Arc` snapshots and stay usable after the cache entry for their pair is replaced.
pub struct Transformer<P = Affine, S = BufferedSampleStore<P>> {
    opts: TransformerOpts,
    graph: FrameGraph<P>,
    resolver: ChainResolver,
    samples: S,
    validator: Box<dyn ProducerValidator>,
    consumers: BTreeMap<FramePair, Option<Arc<TransformChain<P>>>>,
}

impl<P> Transformer<P, BufferedSampleStore<P>>
where
    P: Pose + Lerp,
{
    /// Transformer backed by a [`BufferedSampleStore`] configured from `opts.samples`.
    pub fn new(opts: TransformerOpts) -> Self {
        let samples = BufferedSampleStore::new(opts.samples.clone());
        Self::with_store(opts, samples)
    }
}

impl<P, S> Transformer<P, S>
where
    P: Pose,
    S: SampleStore<P>,
{
    /// Transformer backed by a caller-provided sample store.
    pub fn with_store(opts: TransformerOpts, samples: S) -> Self {
        Self {
            resolver: ChainResolver::new(opts.max_search_depth),
            opts,
            graph: FrameGraph::new(),
            samples,
            validator: Box::new(AcceptAnyProducer),
            consumers: BTreeMap::new(),
        }
    }

    /// Replace the producer validator (accept-all by default).
    pub fn with_validator(mut self, validator: impl ProducerValidator + 'static) -> Self {
        self.validator = Box::new(validator);
        self
    }

    /// Options this transformer was built with.
    pub fn opts(&self) -> &TransformerOpts {
        &self.opts
    }

    /// Declared frames and edges.
    pub fn graph(&self) -> &FrameGraph<P> {
        &self.graph
    }

    /// Backing sample store.
    pub fn samples(&self) -> &S {
        &self.samples
    }

    /// Declare a frame. Declaring it again is a no-op.
    pub fn declare_frame(&mut self, name: &str) -> TfResult<()> {
        self.graph.declare_frame(name)
    }

    /// Declare a constant edge. Registered consumers are re-resolved since the edge is
    /// immediately traversable.
    pub fn declare_static(&mut self, from: &str, to: &str, value: P) -> TfResult<ResolveReport> {
        self.graph.declare_static(from, to, value)?;
        Ok(self.reresolve_all(FramePair::new(from, to)))
    }

    /// Declare a sample-fed edge ahead of its first sample. It joins chains once that sample
    /// arrives.
    pub fn declare_dynamic(&mut self, from: &str, to: &str, producer: &str) -> TfResult<()> {
        self.graph
            .declare_dynamic(from, to, producer, self.validator.as_ref())
    }

    /// Resolve and cache the chain for consumer `(from, to)`.
    ///
    /// When no chain exists yet the consumer stays registered and is retried every time a
    /// new edge becomes traversable.
    #[tracing::instrument(skip(self))]
    pub fn resolve(&mut self, from: &str, to: &str) -> TfResult<Arc<TransformChain<P>>> {
        match self.resolver.resolve(&self.graph, from, to) {
            Ok(chain) => {
                let chain = Arc::new(chain);
                self.consumers
                    .insert(FramePair::new(from, to), Some(Arc::clone(&chain)));
                Ok(chain)
            }
            Err(err) => {
                if err.is_unresolved() {
                    self.consumers.entry(FramePair::new(from, to)).or_insert(None);
                }
                Err(err)
            }
        }
    }

    /// Register consumer `(from, to)` without treating a missing chain as an error.
    pub fn register_consumer(
        &mut self,
        from: &str,
        to: &str,
    ) -> TfResult<Option<Arc<TransformChain<P>>>> {
        match self.resolve(from, to) {
            Ok(chain) => Ok(Some(chain)),
            Err(err) if err.is_unresolved() => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Install a hand-built chain for its `(from, to)` consumer, replacing any cached one.
    pub fn set_chain(&mut self, chain: TransformChain<P>) -> TfResult<Arc<TransformChain<P>>> {
        self.graph.frame_id(chain.from())?;
        self.graph.frame_id(chain.to())?;
        let key = FramePair::new(chain.from(), chain.to());
        let chain = Arc::new(chain);
        self.consumers.insert(key, Some(Arc::clone(&chain)));
        Ok(chain)
    }

    /// Cached chain for consumer `(from, to)`.
    pub fn chain_for(&self, from: &str, to: &str) -> Option<Arc<TransformChain<P>>> {
        self.consumers
            .get(&FramePair::new(from, to))
            .and_then(Clone::clone)
    }

    /// Registered consumers, resolved or not.
    pub fn consumers(&self) -> impl Iterator<Item = &FramePair> {
        self.consumers.keys()
    }

    /// Evaluate `chain` against this transformer's samples.
    pub fn evaluate(
        &self,
        chain: &TransformChain<P>,
        time: Timestamp,
        interpolate: bool,
    ) -> Result<P, Unavailable> {
        chain.evaluate_at(&self.samples, time, interpolate)
    }

    /// Transform for consumer `(from, to)` at `time`, resolving the consumer on first use.
    ///
    /// The outer result carries structural errors; the inner one reports missing samples.
    pub fn lookup(
        &mut self,
        from: &str,
        to: &str,
        time: Timestamp,
    ) -> TfResult<Result<Transformation<P>, Unavailable>> {
        let chain = match self.chain_for(from, to) {
            Some(chain) => chain,
            None => self.resolve(from, to)?,
        };
        Ok(self
            .evaluate(&chain, time, self.opts.interpolate)
            .map(|transform| Transformation {
                from: from.to_owned(),
                to: to.to_owned(),
                time,
                transform,
            })
            .inspect_err(|missing| tracing::trace!(%missing, "transform unavailable")))
    }

    /// Feed one sample for `from -> to` from an unnamed producer.
    pub fn push_sample(
        &mut self,
        from: &str,
        to: &str,
        time: Timestamp,
        value: P,
    ) -> TfResult<PushOutcome> {
        self.push_sample_from(ANONYMOUS_PRODUCER, from, to, time, value)
    }

    /// Feed one sample for `from -> to`.
    ///
    /// The first sample for a pair allocates its stream and re-resolves every consumer. A
    /// sample for the reverse of a declared dynamic edge is stored inverted.
    #[tracing::instrument(level = "trace", skip(self, value))]
    pub fn push_sample_from(
        &mut self,
        producer: &str,
        from: &str,
        to: &str,
        time: Timestamp,
        value: P,
    ) -> TfResult<PushOutcome> {
        let (outcome, live) = match self.live_stream(from, to)? {
            Some(live) => (PushOutcome::Buffered, live),
            None => {
                let report = self.on_dynamic_sample_first_seen(from, to, producer)?;
                let live = self.live_stream(from, to)?.ok_or_else(|| {
                    TfError::from(anyhow::anyhow!("stream for {from} -> {to} not activated"))
                })?;
                (PushOutcome::NewStream(report), live)
            }
        };

        let (handle, inverted) = live;
        let value = if inverted { value.inverse() } else { value };
        self.samples.push(handle, time, value)?;
        Ok(outcome)
    }

    /// Activate the stream for a pair seen for the first time and re-resolve every consumer.
    ///
    /// Declares the dynamic edge when it was not declared ahead of time. Normally driven by
    /// [`Transformer::push_sample`].
    #[tracing::instrument(skip(self))]
    pub fn on_dynamic_sample_first_seen(
        &mut self,
        from: &str,
        to: &str,
        producer: &str,
    ) -> TfResult<ResolveReport> {
        if self.opts.implicit_frames {
            self.declare_implicit_frames(from, to, producer)?;
        }

        let edge = match self.find_edge(from, to)? {
            Some(edge) => edge,
            None => {
                self.graph
                    .declare_dynamic(from, to, producer, self.validator.as_ref())?;
                self.find_edge(from, to)?.ok_or_else(|| {
                    TfError::from(anyhow::anyhow!("edge {from} -> {to} missing after declare"))
                })?
            }
        };

        let e = self.graph.edge(edge);
        match e.kind() {
            EdgeKind::Static(_) => return Err(static_sample(from, to)),
            EdgeKind::Dynamic {
                stream: Some(_), ..
            } => return Err(TfError::duplicate(from, to)),
            EdgeKind::Dynamic { stream: None, .. } => {}
        }

        let key = FramePair::new(self.graph.frame_name(e.from), self.graph.frame_name(e.to));
        let handle = self.samples.register(key.clone());
        self.graph.activate_stream(edge, handle);
        tracing::info!(edge = %key, stream = handle.0, producer, "registered transform stream");

        Ok(self.reresolve_all(key))
    }

    /// Drop every frame, edge, consumer and buffered sample. Options and validator stay.
    pub fn clear(&mut self) {
        self.graph.clear();
        self.samples.clear();
        self.consumers.clear();
    }

    fn find_edge(&self, from: &str, to: &str) -> TfResult<Option<EdgeId>> {
        let a = self.graph.frame_id(from)?;
        let b = self.graph.frame_id(to)?;
        if a == b {
            return Err(TfError::SelfTransform(from.to_owned()));
        }
        Ok(self.graph.edge_between(a, b).map(|(edge, _)| edge))
    }

    // Stream and inversion flag for a pair whose dynamic edge is already live.
    fn live_stream(&self, from: &str, to: &str) -> TfResult<Option<(StreamHandle, bool)>> {
        if self.opts.implicit_frames && !(self.graph.has_frame(from) && self.graph.has_frame(to)) {
            validate_frame_name(from)?;
            validate_frame_name(to)?;
            return Ok(None);
        }
        let a = self.graph.frame_id(from)?;
        let b = self.graph.frame_id(to)?;
        let Some((edge, inverted)) = self.graph.edge_between(a, b) else {
            return Ok(None);
        };
        match self.graph.edge(edge).kind() {
            EdgeKind::Static(_) => Err(static_sample(from, to)),
            EdgeKind::Dynamic { stream, .. } => Ok(stream.map(|h| (h, inverted))),
        }
    }

    // A missing frame means no edge exists yet, so the new edge must pass every declaration
    // check before its frames are added.
    fn declare_implicit_frames(&mut self, from: &str, to: &str, producer: &str) -> TfResult<()> {
        if self.graph.has_frame(from) && self.graph.has_frame(to) {
            return Ok(());
        }
        validate_frame_name(from)?;
        validate_frame_name(to)?;
        if from == to {
            return Err(TfError::SelfTransform(from.to_owned()));
        }
        self.validator.check(producer)?;
        self.graph.declare_frame(from)?;
        self.graph.declare_frame(to)
    }

    fn reresolve_all(&mut self, trigger: FramePair) -> ResolveReport {
        let mut updates = Vec::with_capacity(self.consumers.len());
        for (key, slot) in self.consumers.iter_mut() {
            let had_chain = slot.is_some();
            let update = match self.resolver.resolve(&self.graph, &key.from, &key.to) {
                Ok(chain) => {
                    *slot = Some(Arc::new(chain));
                    if had_chain {
                        ConsumerUpdate::Updated
                    } else {
                        ConsumerUpdate::Resolved
                    }
                }
                Err(err) if had_chain => {
                    tracing::warn!(consumer = %key, error = %err, "re-resolution failed, keeping previous chain");
                    ConsumerUpdate::Retained(err)
                }
                Err(err) => ConsumerUpdate::Unresolved(err),
            };
            updates.push((key.clone(), update));
        }
        tracing::debug!(
            trigger = %trigger,
            consumers = updates.len(),
            resolved = updates
                .iter()
                .filter(|(_, u)| matches!(u, ConsumerUpdate::Resolved))
                .count(),
            "re-resolved consumers"
        );
        ResolveReport { trigger, updates }
    }
}

fn static_sample(from: &str, to: &str) -> TfError {
    TfError::StaticSample {
        from: from.to_owned(),
        to: to.to_owned(),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/transformer.rs"]
mod tests;
