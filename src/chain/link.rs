use crate::foundation::core::Timestamp;
use crate::foundation::error::Unavailable;
use crate::foundation::ids::StreamHandle;
use crate::samples::store::SampleStore;
use crate::transform::Pose;

/// Where a link gets its value from.
#[derive(Clone, Debug, PartialEq)]
pub enum LinkSource<P> {
    /// Constant value copied from the static edge.
    Static(P),
    /// Sample stream of a live dynamic edge.
    Dynamic {
        /// Producer of the edge.
        producer: String,
        /// Stream holding the edge's samples.
        stream: StreamHandle,
    },
}

/// One step of a chain: a declared edge, possibly walked against its declaration.
#[derive(Clone, Debug, PartialEq)]
pub struct ChainLink<P> {
    /// Declared source frame of the edge.
    pub from: String,
    /// Declared target frame of the edge.
    pub to: String,
    /// Walked `to -> from` rather than as declared.
    pub inverted: bool,
    /// Value provider.
    pub source: LinkSource<P>,
}

impl<P> ChainLink<P> {
    /// Frame this step leaves from.
    pub fn source_frame(&self) -> &str {
        if self.inverted { &self.to } else { &self.from }
    }

    /// Frame this step arrives at.
    pub fn target_frame(&self) -> &str {
        if self.inverted { &self.from } else { &self.to }
    }

    /// Whether evaluating this link needs a sample.
    pub fn is_dynamic(&self) -> bool {
        matches!(self.source, LinkSource::Dynamic { .. })
    }

    /// Same edge walked the other way.
    pub fn flipped(&self) -> Self
    where
        P: Clone,
    {
        Self {
            inverted: !self.inverted,
            ..self.clone()
        }
    }

    pub(crate) fn same_edge(&self, other: &Self) -> bool {
        (self.from == other.from && self.to == other.to)
            || (self.from == other.to && self.to == other.from)
    }
}

impl<P: Pose> ChainLink<P> {
    /// Instantaneous value of the step at `time`, inverted when walked backwards.
    pub fn value_at<S>(
        &self,
        store: &S,
        time: Timestamp,
        interpolate: bool,
    ) -> Result<P, Unavailable>
    where
        S: SampleStore<P> + ?Sized,
    {
        let value = match &self.source {
            LinkSource::Static(v) => v.clone(),
            LinkSource::Dynamic { stream, .. } => store
                .query(*stream, time, interpolate)
                .ok_or_else(|| Unavailable {
                    from: self.from.clone(),
                    to: self.to.clone(),
                    time_us: time.0,
                })?,
        };
        Ok(if self.inverted {
            value.inverse()
        } else {
            value
        })
    }
}
