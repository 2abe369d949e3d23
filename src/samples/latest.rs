use crate::foundation::core::{FramePair, Timestamp};
use crate::foundation::error::TfResult;
use crate::foundation::ids::StreamHandle;
use crate::samples::store::{HandleSpace, SampleStore, unknown_stream};

/// Keeps only the newest sample per stream and serves it for any query time.
///
/// For setups that do not align transform samples to data timestamps. Interpolation
/// requests are ignored.
#[derive(Clone, Debug, Default)]
pub struct LatestSampleStore<P> {
    handles: HandleSpace,
    streams: Vec<(FramePair, Option<(Timestamp, P)>)>,
}

impl<P> LatestSampleStore<P> {
    /// Empty store.
    pub fn new() -> Self {
        Self {
            handles: HandleSpace::default(),
            streams: Vec::new(),
        }
    }

    fn slot(&self, handle: StreamHandle) -> Option<&Option<(Timestamp, P)>> {
        let (_, slot) = self.streams.get(self.handles.slot(handle)?)?;
        Some(slot)
    }
}

impl<P: Clone> SampleStore<P> for LatestSampleStore<P> {
    fn register(&mut self, key: FramePair) -> StreamHandle {
        let handle = self.handles.handle(self.streams.len());
        self.streams.push((key, None));
        handle
    }

    fn push(&mut self, handle: StreamHandle, time: Timestamp, value: P) -> TfResult<()> {
        let (_, slot) = self
            .handles
            .slot(handle)
            .and_then(|slot| self.streams.get_mut(slot))
            .ok_or_else(|| unknown_stream(handle))?;
        // Older samples arriving late never replace a newer one.
        if slot.as_ref().is_none_or(|(t, _)| *t <= time) {
            *slot = Some((time, value));
        }
        Ok(())
    }

    fn query(&self, handle: StreamHandle, _time: Timestamp, _interpolate: bool) -> Option<P> {
        self.slot(handle)?.as_ref().map(|(_, v)| v.clone())
    }

    fn buffered(&self, handle: StreamHandle) -> usize {
        self.slot(handle)
            .map_or(0, |slot| usize::from(slot.is_some()))
    }

    fn clear(&mut self) {
        self.handles.retire(self.streams.len());
        self.streams.clear();
    }
}

#[cfg(test)]
#[path = "../../tests/unit/samples/latest.rs"]
mod tests;
