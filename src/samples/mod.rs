pub(crate) mod buffered;
pub(crate) mod latest;
pub(crate) mod store;
