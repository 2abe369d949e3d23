/// Convenience result type used across tfgraph.
pub type TfResult<T> = Result<T, TfError>;

/// Structural errors raised while declaring frames and edges or resolving chains.
///
/// These abort the triggering call. Missing samples at evaluation time are reported through
/// [`Unavailable`] instead and never show up here.
#[derive(thiserror::Error, Debug)]
pub enum TfError {
    /// Frame name is empty or contains characters other than ASCII alphanumerics and `_`.
    #[error("invalid frame name: {0:?}")]
    InvalidFrameName(String),

    /// Frame was never declared.
    #[error("unknown frame: {0}")]
    UnknownFrame(String),

    /// An edge already covers this frame pair (in either direction).
    #[error("duplicate transform between {from} and {to}")]
    DuplicateTransform {
        /// Source frame of the rejected declaration.
        from: String,
        /// Target frame of the rejected declaration.
        to: String,
    },

    /// Edge endpoints are the same frame.
    #[error("transform from {0} to itself")]
    SelfTransform(String),

    /// Producer identity rejected by the configured validator.
    #[error("invalid producer: {0}")]
    InvalidProducer(String),

    /// Search frontier ran dry before reaching the target.
    #[error("no transform chain from {from} to {to}")]
    ChainNotFound {
        /// Chain source frame.
        from: String,
        /// Chain target frame.
        to: String,
    },

    /// Search depth bound reached with frontier left to expand.
    #[error("no transform chain from {from} to {to} within depth {depth}")]
    MaxDepthExceeded {
        /// Chain source frame.
        from: String,
        /// Chain target frame.
        to: String,
        /// Depth bound that was hit.
        depth: usize,
    },

    /// A hand-built chain whose links do not connect or reuse an edge.
    #[error("broken transform chain: {0}")]
    BrokenChain(String),

    /// Sample pushed for a pair that is covered by a static edge.
    #[error("sample for static transform between {from} and {to}")]
    StaticSample {
        /// Sample source frame.
        from: String,
        /// Sample target frame.
        to: String,
    },

    /// Wrapped lower-level error.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl TfError {
    /// Build a [`TfError::InvalidFrameName`] value.
    pub fn invalid_frame_name(name: impl Into<String>) -> Self {
        Self::InvalidFrameName(name.into())
    }

    /// Build a [`TfError::UnknownFrame`] value.
    pub fn unknown_frame(name: impl Into<String>) -> Self {
        Self::UnknownFrame(name.into())
    }

    /// Build a [`TfError::DuplicateTransform`] value.
    pub fn duplicate(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self::DuplicateTransform {
            from: from.into(),
            to: to.into(),
        }
    }

    /// Build a [`TfError::InvalidProducer`] value.
    pub fn invalid_producer(producer: impl Into<String>) -> Self {
        Self::InvalidProducer(producer.into())
    }

    /// Build a [`TfError::ChainNotFound`] value.
    pub fn chain_not_found(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self::ChainNotFound {
            from: from.into(),
            to: to.into(),
        }
    }

    /// Build a [`TfError::BrokenChain`] value.
    pub fn broken_chain(msg: impl Into<String>) -> Self {
        Self::BrokenChain(msg.into())
    }

    /// Whether this error means "no path yet" rather than bad input.
    ///
    /// Consumers failing this way stay registered and are retried when new dynamic edges
    /// appear.
    pub fn is_unresolved(&self) -> bool {
        matches!(
            self,
            Self::ChainNotFound { .. } | Self::MaxDepthExceeded { .. }
        )
    }
}

/// Chain evaluation failed because a dynamic link had no usable sample at the query time.
///
/// Expected and transient: callers retry on a later tick.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("no sample for transform {from} -> {to} at {time_us}us")]
pub struct Unavailable {
    /// Declared source frame of the link that had no sample.
    pub from: String,
    /// Declared target frame of the link that had no sample.
    pub to: String,
    /// Query time in microseconds.
    pub time_us: i64,
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
