use crate::chain::link::ChainLink;
use crate::foundation::core::{Timestamp, validate_frame_name};
use crate::foundation::error::{TfError, TfResult, Unavailable};
use crate::samples::store::SampleStore;
use crate::transform::Pose;

/// Ordered links leading from one frame to another.
///
/// Immutable once built. The manager hands chains out behind an `Arc`, so a chain a caller
/// already holds stays valid when the manager later caches a different one for the same
/// pair.
#[derive(Clone, Debug, PartialEq)]
pub struct TransformChain<P> {
    from: String,
    to: String,
    links: Vec<ChainLink<P>>,
}

impl<P> TransformChain<P> {
    /// Zero-link chain from a frame to itself.
    pub fn identity(frame: impl Into<String>) -> Self {
        let frame = frame.into();
        Self {
            from: frame.clone(),
            to: frame,
            links: Vec::new(),
        }
    }

    /// Build from hand-picked links, checking that they connect `from` to `to` and never use
    /// the same edge twice.
    pub fn from_links(
        from: impl Into<String>,
        to: impl Into<String>,
        links: Vec<ChainLink<P>>,
    ) -> TfResult<Self> {
        let from = from.into();
        let to = to.into();
        validate_frame_name(&from)?;
        validate_frame_name(&to)?;

        let mut at = from.as_str();
        for (i, link) in links.iter().enumerate() {
            if link.source_frame() != at {
                return Err(TfError::broken_chain(format!(
                    "link {i} starts at {} but the previous step ends at {at}",
                    link.source_frame()
                )));
            }
            if links[..i].iter().any(|prev| prev.same_edge(link)) {
                return Err(TfError::broken_chain(format!(
                    "edge {} <-> {} used twice",
                    link.from, link.to
                )));
            }
            at = link.target_frame();
        }
        if at != to {
            return Err(TfError::broken_chain(format!(
                "chain ends at {at}, expected {to}"
            )));
        }

        Ok(Self { from, to, links })
    }

    // Caller guarantees connectivity (chain search output).
    pub(crate) fn from_search(from: String, to: String, links: Vec<ChainLink<P>>) -> Self {
        Self { from, to, links }
    }

    /// Source frame.
    pub fn from(&self) -> &str {
        &self.from
    }

    /// Target frame.
    pub fn to(&self) -> &str {
        &self.to
    }

    /// Links in application order.
    pub fn links(&self) -> &[ChainLink<P>] {
        &self.links
    }

    /// Number of links.
    pub fn len(&self) -> usize {
        self.links.len()
    }

    /// Zero links: `from == to`.
    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Links that need no sample, and links that do.
    pub fn partition(&self) -> (Vec<&ChainLink<P>>, Vec<&ChainLink<P>>) {
        self.links.iter().partition(|l| !l.is_dynamic())
    }

    /// Whether the chain evaluates without live data.
    pub fn is_static(&self) -> bool {
        self.links.iter().all(|l| !l.is_dynamic())
    }

    /// Chain from `to` back to `from` over the same edges.
    pub fn reversed(&self) -> Self
    where
        P: Clone,
    {
        Self {
            from: self.to.clone(),
            to: self.from.clone(),
            links: self.links.iter().rev().map(ChainLink::flipped).collect(),
        }
    }

    /// Frames visited, `from` first and `to` last.
    pub fn frames(&self) -> Vec<&str> {
        let mut out = Vec::with_capacity(self.links.len() + 1);
        out.push(self.from.as_str());
        out.extend(self.links.iter().map(ChainLink::target_frame));
        out
    }
}

impl<P: Pose> TransformChain<P> {
    /// Compose every link's value at `time`.
    ///
    /// All-or-nothing: one dynamic link without a usable sample makes the whole evaluation
    /// [`Unavailable`].
    pub fn evaluate_at<S>(
        &self,
        store: &S,
        time: Timestamp,
        interpolate: bool,
    ) -> Result<P, Unavailable>
    where
        S: SampleStore<P> + ?Sized,
    {
        let mut acc = P::identity();
        for link in &self.links {
            let value = link.value_at(store, time, interpolate)?;
            acc = acc.then(&value);
        }
        Ok(acc)
    }
}

impl<P> std::fmt::Display for TransformChain<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.from)?;
        for link in &self.links {
            let arrow = if link.inverted { " <~ " } else { " -> " };
            write!(f, "{arrow}{}", link.target_frame())?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/chain/transform_chain.rs"]
mod tests;
