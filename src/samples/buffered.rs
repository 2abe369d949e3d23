use std::collections::VecDeque;

use crate::foundation::core::{FramePair, Timestamp};
use crate::foundation::error::TfResult;
use crate::foundation::ids::StreamHandle;
use crate::samples::store::{HandleSpace, SampleBufferOpts, SampleStore, unknown_stream};
use crate::transform::Lerp;

#[derive(Clone, Debug)]
struct SampleStream<P> {
    key: FramePair,
    samples: VecDeque<(Timestamp, P)>, // sorted by time
}

/// Bounded, time-sorted sample buffers.
///
/// A query returns the newest sample at or before the query time. With interpolation enabled
/// and a later sample buffered, the bracketing pair is blended instead. Queries before the
/// first buffered sample are unavailable; nothing is extrapolated.
#[derive(Clone, Debug)]
pub struct BufferedSampleStore<P> {
    opts: SampleBufferOpts,
    handles: HandleSpace,
    streams: Vec<SampleStream<P>>,
}

impl<P> Default for BufferedSampleStore<P> {
    fn default() -> Self {
        Self::new(SampleBufferOpts::default())
    }
}

impl<P> BufferedSampleStore<P> {
    /// Empty store with the given buffering limits.
    pub fn new(opts: SampleBufferOpts) -> Self {
        Self {
            opts,
            handles: HandleSpace::default(),
            streams: Vec::new(),
        }
    }

    /// Buffering limits applied to every stream.
    pub fn opts(&self) -> &SampleBufferOpts {
        &self.opts
    }

    /// Edge a stream was registered for.
    pub fn key(&self, handle: StreamHandle) -> Option<&FramePair> {
        self.stream(handle).map(|s| &s.key)
    }

    /// Time of the newest buffered sample.
    pub fn latest_time(&self, handle: StreamHandle) -> Option<Timestamp> {
        self.stream(handle)?.samples.back().map(|(t, _)| *t)
    }

    fn stream(&self, handle: StreamHandle) -> Option<&SampleStream<P>> {
        self.streams.get(self.handles.slot(handle)?)
    }
}

impl<P> SampleStore<P> for BufferedSampleStore<P>
where
    P: Clone + Lerp,
{
    fn register(&mut self, key: FramePair) -> StreamHandle {
        let handle = self.handles.handle(self.streams.len());
        self.streams.push(SampleStream {
            key,
            samples: VecDeque::new(),
        });
        handle
    }

    fn push(&mut self, handle: StreamHandle, time: Timestamp, value: P) -> TfResult<()> {
        let stream = self
            .handles
            .slot(handle)
            .and_then(|slot| self.streams.get_mut(slot))
            .ok_or_else(|| unknown_stream(handle))?;
        let samples = &mut stream.samples;

        match samples.back().map(|(t, _)| *t) {
            Some(last) if last >= time => {
                let idx = samples.partition_point(|(t, _)| *t < time);
                if samples[idx].0 == time {
                    samples[idx].1 = value;
                } else {
                    samples.insert(idx, (time, value));
                }
            }
            _ => samples.push_back((time, value)),
        }

        if self.opts.capacity > 0 {
            while samples.len() > self.opts.capacity {
                samples.pop_front();
            }
        }
        Ok(())
    }

    fn query(&self, handle: StreamHandle, time: Timestamp, interpolate: bool) -> Option<P> {
        let samples = &self.stream(handle)?.samples;

        let idx = samples.partition_point(|(t, _)| *t <= time);
        if idx == 0 {
            return None;
        }

        let (a_time, a_value) = &samples[idx - 1];
        if let Some(max_age) = self.opts.max_age_us
            && time.micros_since(*a_time) > max_age
        {
            return None;
        }

        if !interpolate || *a_time == time || idx >= samples.len() {
            return Some(a_value.clone());
        }

        let (b_time, b_value) = &samples[idx];
        // Far-apart timestamps would overflow an i64 difference.
        let span = (b_time.0 as f64) - (a_time.0 as f64);
        let t = ((time.0 as f64) - (a_time.0 as f64)) / span;
        Some(P::lerp(a_value, b_value, t))
    }

    fn buffered(&self, handle: StreamHandle) -> usize {
        self.stream(handle).map_or(0, |s| s.samples.len())
    }

    fn clear(&mut self) {
        self.handles.retire(self.streams.len());
        self.streams.clear();
    }
}

#[cfg(test)]
#[path = "../../tests/unit/samples/buffered.rs"]
mod tests;
