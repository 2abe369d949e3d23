#![forbid(unsafe_code)]
#![deny(missing_docs)]
//! Coordinate-frame transform graph for robotics pipelines.
//!
//! Frames are named nodes; static and sample-fed dynamic transforms are edges between them.
//! A consumer asking for `from -> to` gets the shortest [`TransformChain`] over the declared
//! edges, each walked forward or inverted, and evaluates it against buffered samples at a
//! point in time. The [`Transformer`] owns the graph and the sample store, and re-resolves
//! every registered consumer when a new edge becomes usable.
//!
//! ```
//! use tfgraph::{Affine, Timestamp, Transformer, TransformerOpts, Vec2};
//!
//! let mut tf: Transformer = Transformer::new(TransformerOpts::default());
//! for frame in ["world", "odom", "imu"] {
//!     tf.declare_frame(frame)?;
//! }
//! tf.declare_static("world", "odom", Affine::IDENTITY)?;
//! tf.declare_dynamic("odom", "imu", "imu_node")?;
//!
//! tf.push_sample_from("imu_node", "odom", "imu", Timestamp(0), Affine::translate(Vec2::new(1.0, 0.0)))?;
//! let got = tf.lookup("world", "imu", Timestamp(0))?.expect("sample buffered");
//! assert_eq!(got.transform, Affine::translate(Vec2::new(1.0, 0.0)));
//! # Ok::<(), tfgraph::TfError>(())
//! ```

mod chain;
mod foundation;
mod graph;
mod resolve;
mod samples;
mod session;
pub mod transform;

pub use chain::link::{ChainLink, LinkSource};
pub use chain::transform_chain::TransformChain;
pub use foundation::core::{Affine, FramePair, Point, Timestamp, Vec2, validate_frame_name};
pub use foundation::error::{TfError, TfResult, Unavailable};
pub use foundation::ids::StreamHandle;
pub use graph::frame_graph::{
    AcceptAnyProducer, EdgeKind, EdgeRef, FrameGraph, ProducerAllowList, ProducerValidator,
    TransformEdge,
};
pub use resolve::search::{ChainResolver, DEFAULT_MAX_SEARCH_DEPTH};
pub use samples::buffered::BufferedSampleStore;
pub use samples::latest::LatestSampleStore;
pub use samples::store::{SampleBufferOpts, SampleStore};
pub use session::transformer::{
    ANONYMOUS_PRODUCER, ConsumerUpdate, PushOutcome, ResolveReport, Transformation, Transformer,
    TransformerOpts,
};
pub use transform::rigid::Pose2D;
pub use transform::{Lerp, Pose};
