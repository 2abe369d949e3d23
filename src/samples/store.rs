use crate::foundation::core::{FramePair, Timestamp};
use crate::foundation::error::TfResult;
use crate::foundation::ids::StreamHandle;

/// Buffering limits for sample streams.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct SampleBufferOpts {
    /// Samples kept per stream; the oldest is evicted first. `0` keeps everything.
    pub capacity: usize,
    /// Samples older than this (relative to the query time) count as missing.
    pub max_age_us: Option<u64>,
}

impl Default for SampleBufferOpts {
    fn default() -> Self {
        Self {
            capacity: 64,
            max_age_us: None,
        }
    }
}

/// Time-indexed storage for dynamic transform samples, one stream per dynamic edge.
pub trait SampleStore<P> {
    /// Allocate a stream for the edge `key.from -> key.to`.
    fn register(&mut self, key: FramePair) -> StreamHandle;

    /// Append a sample. Fails only for handles this store never issued.
    fn push(&mut self, handle: StreamHandle, time: Timestamp, value: P) -> TfResult<()>;

    /// Sample for `time`, or `None` when nothing usable is buffered.
    ///
    /// Never returns a default value in place of a missing sample.
    fn query(&self, handle: StreamHandle, time: Timestamp, interpolate: bool) -> Option<P>;

    /// Number of samples currently buffered for `handle`.
    fn buffered(&self, handle: StreamHandle) -> usize;

    /// Drop every stream and sample. Previously issued handles become invalid.
    fn clear(&mut self);
}

pub(crate) fn unknown_stream(handle: StreamHandle) -> crate::TfError {
    anyhow::anyhow!("unknown sample stream {}", handle.0).into()
}

/// Maps issued handles to stream slots.
///
/// Numbering continues across `clear`, so a handle held by an old chain never aliases a stream
/// registered afterwards.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct HandleSpace {
    base: u32,
}

impl HandleSpace {
    pub(crate) fn handle(self, slot: usize) -> StreamHandle {
        StreamHandle(
            self.base
                .saturating_add(u32::try_from(slot).unwrap_or(u32::MAX)),
        )
    }

    pub(crate) fn slot(self, handle: StreamHandle) -> Option<usize> {
        handle.0.checked_sub(self.base).map(|i| i as usize)
    }

    /// Retire every handle below `issued` slots.
    pub(crate) fn retire(&mut self, issued: usize) {
        self.base = self.handle(issued).0;
    }
}
